//! Wine quality classifier CLI
//!
//! Builds the pipeline from a CSV once at startup, then answers schema,
//! predict, lookup and evaluate requests (one-shot or from stdin).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wine_quality::{FittedPipeline, Label, PipelineConfig, PipelineError};

#[derive(Parser, Debug)]
#[command(name = "wine-quality")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Classify wine samples as good or bad quality", long_about = None)]
struct Cli {
    /// Input CSV dataset (header row, feature columns and a quality column)
    #[arg(short, long, global = true, default_value = "WineQT.csv")]
    dataset: PathBuf,

    /// Optional TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the split seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List features in input order with their dataset ranges
    Schema,
    /// Classify one sample from comma-separated values in schema order
    Predict {
        /// e.g. "7.4,0.7,0,1.9,0.076,11,34,0.9978,3.51,0.56,9.4" (blank = missing)
        #[arg(allow_hyphen_values = true)]
        values: String,
    },
    /// Show the stored measurements of a sample
    Lookup {
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },
    /// Report held-out accuracy and confusion matrix
    Evaluate,
    /// Read commands from stdin until `quit`
    Interactive,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.split.seed = seed;
    }

    info!("Wine quality classifier v{}", wine_quality::VERSION);
    let pipeline = FittedPipeline::from_csv(&cli.dataset, &config)
        .with_context(|| format!("Failed to build pipeline from {}", cli.dataset.display()))?;

    let mut out = std::io::stdout().lock();
    match cli.command {
        Command::Schema => write_schema(&mut out, &pipeline)?,
        Command::Evaluate => write_evaluation(&mut out, &pipeline)?,
        Command::Interactive => run_interactive(&pipeline, std::io::stdin().lock(), &mut out)?,
        Command::Predict { values } => match predict_line(&pipeline, &values) {
            Ok(label) => writeln!(out, "{}", describe(label))?,
            Err(err) => return request_failed(err),
        },
        Command::Lookup { id } => match pipeline.lookup(id) {
            Ok(raw) => writeln!(out, "{}", render_raw(raw))?,
            Err(err) => return request_failed(err),
        },
    }

    Ok(ExitCode::SUCCESS)
}

/// Bad requests exit with code 2; anything else is a defect and propagates
fn request_failed(err: PipelineError) -> Result<ExitCode> {
    if !err.is_recoverable() {
        return Err(err.into());
    }
    eprintln!("{}", user_message(&err));
    Ok(ExitCode::from(2))
}

/// Initialize logging; `RUST_LOG` wins over `--verbose`
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn predict_line(pipeline: &FittedPipeline, line: &str) -> wine_quality::Result<Label> {
    let cells: Vec<&str> = line.split(',').collect();
    pipeline.predict_text(&cells)
}

fn describe(label: Label) -> String {
    match label {
        Label::Good => "Good quality (1)".to_string(),
        Label::Bad => "Bad quality (0)".to_string(),
    }
}

fn user_message(err: &PipelineError) -> String {
    match err {
        PipelineError::InvalidInput(msg) => format!("Input error: {}", msg),
        PipelineError::NotFound(id) => format!("Not found: no wine with id {}", id),
        other => format!("Error: {}", other),
    }
}

/// Comma-joined values, blanks for missing, ready to paste back into `predict`
fn render_raw(raw: &[Option<f64>]) -> String {
    raw.iter()
        .map(|v| v.map(|x| x.to_string()).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(",")
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn write_schema<W: Write>(out: &mut W, pipeline: &FittedPipeline) -> std::io::Result<()> {
    for name in pipeline.schema().names() {
        let hint = pipeline
            .feature_range(name)
            .map(|r| r.hint())
            .unwrap_or_else(|| "(Range: n/a)".to_string());
        writeln!(out, "{:<24} {}", title_case(name), hint)?;
    }
    Ok(())
}

fn write_evaluation<W: Write>(out: &mut W, pipeline: &FittedPipeline) -> std::io::Result<()> {
    let report = pipeline.evaluation();
    writeln!(out, "Held-out records: {}", report.total())?;
    writeln!(out, "Accuracy:         {:.4}", report.accuracy())?;
    writeln!(out, "                  predicted good  predicted bad")?;
    writeln!(
        out,
        "actual good       {:>14}  {:>13}",
        report.true_positive, report.false_negative
    )?;
    writeln!(
        out,
        "actual bad        {:>14}  {:>13}",
        report.false_positive, report.true_negative
    )?;
    writeln!(out, "Model fingerprint: {}", pipeline.fingerprint())
}

/// Serve commands line by line; per-request errors are printed, never fatal
fn run_interactive<R: BufRead, W: Write>(
    pipeline: &FittedPipeline,
    input: R,
    out: &mut W,
) -> std::io::Result<()> {
    writeln!(out, "Commands: schema | predict <v1,v2,...> | lookup <id> | evaluate | quit")?;

    for line in input.lines() {
        let line = line?;
        let (command, arg) = match line.trim().split_once(char::is_whitespace) {
            Some((c, a)) => (c, a.trim()),
            None => (line.trim(), ""),
        };

        match command {
            "" => continue,
            "quit" | "exit" => break,
            "schema" => write_schema(out, pipeline)?,
            "evaluate" => write_evaluation(out, pipeline)?,
            "predict" => match predict_line(pipeline, arg) {
                Ok(label) => writeln!(out, "{}", describe(label))?,
                Err(err) => writeln!(out, "{}", user_message(&err))?,
            },
            "lookup" => match arg.parse::<i64>() {
                Ok(id) => match pipeline.lookup(id) {
                    Ok(raw) => writeln!(out, "{}", render_raw(raw))?,
                    Err(err) => writeln!(out, "{}", user_message(&err))?,
                },
                Err(_) => writeln!(out, "Input error: please enter a valid wine id (integer)")?,
            },
            other => writeln!(out, "Unknown command '{}'", other)?,
        }
    }

    Ok(())
}
