//! CLI tool for generating an investment thesis from a pitch deck.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thesis_analysis::client::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use thesis_analysis::{CompletionClient, ModelConfig, Pipeline, PipelineContext};
use thesis_core::{JsonRenderer, MarkdownRenderer, RenderedReport, ReportRenderer, ValidationMode};

/// Generate an investment thesis from a .pptx pitch deck.
#[derive(Parser, Debug)]
#[command(name = "thesis-gen")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input pitch deck (.pptx, 5-20 slides, at most 50 MB)
    input: PathBuf,

    /// Startup name for the report title (default: input file name)
    #[arg(short = 'n', long)]
    startup_name: Option<String>,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the report to stdout instead of writing a file
    #[arg(short, long)]
    print: bool,

    /// Write the report as JSON instead of Markdown
    #[arg(long)]
    json: bool,

    /// Reject analyses that do not match the expected schema
    #[arg(long)]
    strict: bool,

    /// API key for the completions endpoint
    #[arg(long, env = "TOGETHER_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Completions endpoint URL
    #[arg(long, env = "THESIS_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Model name
    #[arg(long, env = "THESIS_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "THESIS_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    // A missing .env is fine; the key can come from the environment or flags.
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(args.verbose)))
        .init();

    let config = ModelConfig::new(&args.api_key)
        .with_endpoint(&args.endpoint)
        .with_model(&args.model)
        .with_timeout(Duration::from_secs(args.timeout_secs));
    log::debug!("Using model {} at {}", args.model, args.endpoint);
    let client = CompletionClient::new(config).context("Failed to set up the model client")?;

    let mode = if args.strict {
        ValidationMode::Strict
    } else {
        ValidationMode::Permissive
    };

    if args.verbose {
        eprintln!("Processing: {}", args.input.display());
    }

    let ctx = Pipeline::new(&client)
        .with_validation_mode(mode)
        .run_path(&args.input)
        .with_context(|| format!("Failed to analyze {}", args.input.display()))?;

    if args.verbose {
        print_summary(&ctx);
    }

    let startup_name = args
        .startup_name
        .clone()
        .unwrap_or_else(|| ctx.source_name.clone());

    log::debug!(
        "Rendering {} report for '{}'",
        if args.json { "JSON" } else { "Markdown" },
        startup_name
    );
    let report = render(&ctx, &startup_name, args.json)?;

    if args.print {
        std::io::stdout()
            .write_all(&report.bytes)
            .context("Failed to write report to stdout")?;
    } else {
        let output_path = get_output_path(&args.input, args.output.as_ref(), &report.filename)?;
        write_output(&output_path, &report.bytes)?;
        eprintln!("Report written to: {}", output_path.display());
    }

    Ok(())
}

/// Default `RUST_LOG` filter: pipeline stage logs under `--verbose`,
/// warnings only otherwise.
fn log_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

fn render(ctx: &PipelineContext, startup_name: &str, json: bool) -> Result<RenderedReport> {
    let report = if json {
        JsonRenderer.render(&ctx.analysis, Some(startup_name))
    } else {
        MarkdownRenderer::new().render(&ctx.analysis, Some(startup_name))
    };
    report.context("Failed to render report")
}

/// Per-stage diagnostics for `--verbose`.
fn print_summary(ctx: &PipelineContext) {
    eprintln!("  Found {} slides", ctx.slide_count);
    for slide in ctx.deck.slides() {
        eprintln!("  Slide {:>2}: {}", slide.index, slide.label);
    }

    let degraded = ctx.degraded_slides();
    if !degraded.is_empty() {
        log::warn!("{} slides could not be classified", degraded.len());
        eprintln!("  Unclassified slides: {:?}", degraded);
    }

    let covered: Vec<_> = ctx.covered.iter().map(|c| c.name()).collect();
    eprintln!("  Covered sections: {}", covered.join(", "));

    for issue in &ctx.schema_issues {
        eprintln!("  Schema issue: {}", issue);
    }
}

/// Determine the output path for a report.
fn get_output_path(input_path: &Path, output_dir: Option<&PathBuf>, filename: &str) -> Result<PathBuf> {
    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(filename)
        }
        None => match input_path.parent() {
            Some(parent) => parent.join(filename),
            None => PathBuf::from(filename),
        },
    };

    Ok(output_path)
}

/// Write output to a file.
fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content)
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
