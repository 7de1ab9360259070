//! riskstream CLI
//!
//! Analyzes case documents, evaluates the engine over labeled datasets,
//! applies fitted calibrators and measures robustness to perturbed inputs.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod config;

use cli::{CalibrateAction, Cli, Commands};
use config::EngineConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    riskstream_telemetry::describe_metrics();

    let mut config = EngineConfig::load(&cli.config)?;

    match cli.command {
        Commands::Analyze {
            case,
            vertical,
            mode,
            weights,
        } => {
            config.apply_mode(mode);
            commands::analyze(config, &case, vertical, weights.as_deref()).await
        }
        Commands::Evaluate(args) => commands::evaluate(config, &args).await,
        Commands::Calibrate {
            action: CalibrateAction::Apply { calibrator, scores },
        } => commands::calibrate_apply(&calibrator, &scores),
        Commands::Robustness {
            pairs,
            threshold,
            output,
        } => commands::robustness(config, &pairs, threshold, output.as_deref()).await,
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let directive = log_directive(verbose, std::env::var("RUST_LOG").ok());
    let filter = EnvFilter::try_new(&directive)
        .unwrap_or_else(|_| EnvFilter::new(log_directive(verbose, None)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// `RUST_LOG` wins when set; otherwise `--verbose` picks debug over info
fn log_directive(verbose: bool, rust_log: Option<String>) -> String {
    match rust_log.filter(|v| !v.trim().is_empty()) {
        Some(directive) => directive,
        None if verbose => "riskstream=debug".to_string(),
        None => "riskstream=info".to_string(),
    }
}
