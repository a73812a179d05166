//! flaky-status: a status endpoint that randomly stalls.
//!
//! This is the application entry point. It parses the command line, loads
//! configuration, initializes tracing, builds the router and runs the HTTP
//! server until a shutdown signal arrives.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flaky_status::config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER, HOST_ENV, PORT_ENV};
use flaky_status::http::start_server;
use flaky_status::{create_router, AppState, StartupError};

/// Status endpoint that stalls a random share of requests
#[derive(Parser, Debug)]
#[command(name = "flaky-status", version, about)]
struct Args {
    /// Path to a TOML configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<String>,

    /// Listen address, overrides http.host
    #[arg(long, env = HOST_ENV)]
    host: Option<String>,

    /// Listen port, overrides http.port
    #[arg(short, long, env = PORT_ENV)]
    port: Option<u16>,

    /// Log level filter (e.g., "flaky_status=debug")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!(error = %e, "Startup failed");
        eprintln!("flaky-status: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), StartupError> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    // Priority: CLI/env > config file > default
    if let Some(host) = args.host {
        config.http.host = host;
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }
    config.validate()?;

    init_tracing(args.log_level, config.logging.format)?;

    tracing::info!(
        config = args.config.as_deref().unwrap_or("<defaults>"),
        probability = config.fault.probability,
        delay_secs = config.fault.delay_seconds,
        seeded = config.fault.seed.is_some(),
        "Loaded configuration"
    );

    let state = AppState::new(&config);
    let app = create_router(state);

    start_server(app, &config.http).await?;
    Ok(())
}

/// Initialize tracing with filter priority: CLI > env > default.
fn init_tracing(
    log_level: Option<String>,
    format: LogFormat,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let log_filter = log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    }
}
