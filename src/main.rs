use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use expanse::EngineConfig;

const DEFAULT_LOG_DIRECTIVE: &str = "expanse=info";

/// Expanse - real-time field visualization over an expanding disk.
#[derive(Parser, Debug)]
#[command(name = "expanse", version, about)]
struct Args {
    /// JSON config file.
    #[arg(long)]
    config: Option<String>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Config is read before logging so its level can seed the filter.
    let loaded = match &args.config {
        Some(path) => EngineConfig::load(path).map(Some),
        None => Ok(None),
    };

    let configured = match &loaded {
        Ok(Some(config)) => config.log_level.clone(),
        _ => None,
    };
    let directive = args
        .log_level
        .or(configured)
        .unwrap_or_else(|| DEFAULT_LOG_DIRECTIVE.to_string());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directive))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("expanse v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok(Some(config)) => {
            if let Some(path) = &args.config {
                tracing::info!("using config {path}");
            }
            config
        }
        Ok(None) => EngineConfig::default(),
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match expanse::run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
