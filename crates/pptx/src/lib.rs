//! PPTX (Office Open XML) deck loader for pitch deck analysis.
//!
//! Parses .pptx files, which are ZIP archives containing XML documents, into
//! per-slide text.

#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;
pub mod loader;

pub use loader::{is_zip, PptxLoader};
