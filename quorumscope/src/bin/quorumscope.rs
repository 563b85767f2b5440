//! Command-line entry point: analyse a component pipeline and print the
//! report.
//!
//! ```text
//! quorumscope                              # built-in telecom sample
//! quorumscope --input pipeline.json        # components, backups, config
//! quorumscope --tradeoff 1 --tradeoff 4    # tabulate elasticity tradeoffs
//! quorumscope --json                       # machine-readable results
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use quorumscope::{sample, AnalysisConfig, AnalysisInput, AnalysisReport, Pipeline};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "quorumscope")]
#[command(about = "Latency dominance, quorum agreement and contention analysis", long_about = None)]
struct Args {
    /// JSON input with `components`, optional `backups` and optional `config`
    /// (uses the built-in telecom sample if not provided)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Override the quorum size
    #[arg(long)]
    quorum_size: Option<usize>,

    /// Override the fraction of the quorum that is reachable
    #[arg(long)]
    quorum_available: Option<f64>,

    /// Contention level to tabulate in the elasticity stage (repeatable)
    #[arg(long = "tradeoff")]
    tradeoffs: Vec<f64>,

    /// Run the failover drill with the built-in gateway backups
    /// (ignored when the input already lists backups)
    #[arg(long)]
    failover_drill: bool,

    /// Print results as JSON instead of the text report. An infinite
    /// latency/throughput ratio (zero downstream throughput) is written as
    /// `null`.
    #[arg(long)]
    json: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "analysis failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = match &args.input {
        Some(path) => AnalysisInput::from_path(path)?,
        None => AnalysisInput {
            components: sample::telecom_chain(),
            backups: Vec::new(),
            config: AnalysisConfig::default(),
        },
    };

    if let Some(quorum_size) = args.quorum_size {
        input.config.quorum_size = quorum_size;
    }
    if let Some(quorum_available) = args.quorum_available {
        input.config.quorum_available = quorum_available;
    }
    if args.failover_drill && input.backups.is_empty() {
        input.backups = sample::gateway_backups();
    }

    tracing::info!(
        components = input.components.len(),
        backups = input.backups.len(),
        quorum_size = input.config.quorum_size,
        "starting analysis"
    );

    let results = Pipeline::from_input(input)?
        .with_tradeoff_points(args.tradeoffs)
        .run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", AnalysisReport::new(&results));
    }

    if results.validate_assumption_chain().is_err() {
        return Err("assumption chain broken".into());
    }
    Ok(())
}
