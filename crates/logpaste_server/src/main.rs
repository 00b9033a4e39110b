//! Headless API server entrypoint.

use logpaste_core::DEFAULT_PORT;
use logpaste_server::{config::Config, db::Database, serve_router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CliFlags {
    help: bool,
    prune: bool,
}

fn parse_cli_flags(args: &[String]) -> anyhow::Result<CliFlags> {
    let mut flags = CliFlags::default();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => flags.help = true,
            "--prune" => flags.prune = true,
            value if value.starts_with('-') => {
                anyhow::bail!(
                    "Unknown option: '{}'. Use --help to see supported options.",
                    value
                );
            }
            value => {
                anyhow::bail!(
                    "Unexpected positional argument: '{}'. Use --help to see supported options.",
                    value
                );
            }
        }
    }
    Ok(flags)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logpaste=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cli_flags = parse_cli_flags(&args)?;

    if cli_flags.help {
        print_help();
        return Ok(());
    }

    let config = Config::from_env();
    let database = Database::open(&config)?;

    if cli_flags.prune {
        let report = database.pruner.sweep()?;
        println!("Removed {} expired paste(s)", report.removed);
        return Ok(());
    }

    let sweeper = database.pruner.clone().spawn_sweep(config.sweep_interval());
    let state = AppState::new(config.clone(), database);

    let allow_public = logpaste_server::config::env_flag_enabled("ALLOW_PUBLIC_ACCESS");
    if allow_public {
        tracing::warn!("Public access enabled - server will accept requests from any origin");
    }

    let bind_addr = logpaste_server::resolve_bind_address(&config, allow_public);
    if !bind_addr.ip().is_loopback() {
        tracing::warn!(
            "Binding to non-localhost address: {} - ensure proper security measures are in place",
            bind_addr
        );
    }

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let actual_addr = listener.local_addr().unwrap_or(bind_addr);
    tracing::info!(
        "LogPaste running at http://{} ({:?} storage, sweep every {}s)",
        actual_addr,
        config.storage,
        config.sweep_interval_secs
    );

    let serve_result = serve_router(listener, state, allow_public, shutdown_signal()).await;
    sweeper.abort();
    serve_result?;

    Ok(())
}

fn print_help() {
    println!("LogPaste Server\n");
    println!("Usage: logpaste [OPTIONS]\n");
    println!("Options:");
    println!("  --prune           Delete expired pastes once and exit");
    println!("  --help            Show this help message");
    println!("\nEnvironment variables:");
    println!("  DB_PATH           Data directory (default: ~/.cache/logpaste/db)");
    println!("  STORAGE_DRIVER    redb (default) or memory");
    println!("  PORT              Server port (default: {})", DEFAULT_PORT);
    println!("  MAX_CONTENT_BYTES Maximum paste size in bytes (default: 256KB)");
    println!("  RATE_LIMIT_WINDOW_MS  Rate-limit window length (default: 60000)");
    println!("  RATE_LIMIT_MAX    Paste creations per window and client (default: 120)");
    println!("  SWEEP_INTERVAL_SECS   Seconds between expiry sweeps (default: 300)");
    println!("  ALLOW_PUBLIC_ACCESS  Allow CORS from any origin");
    println!(
        "  BIND              Override bind address (e.g. 0.0.0.0:{})",
        DEFAULT_PORT
    );
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
