//! IRC relay server - main binary

use clap::Parser;
use relayircd_core::config::{parse_password, parse_port};
use relayircd_core::{CancellationToken, Config, EventLoop};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// A single-threaded IRC relay server
#[derive(Parser)]
#[command(name = "relayircd")]
#[command(about = "A single-threaded IRC relay server")]
#[command(version)]
struct Cli {
    /// Port to listen on (0-65445)
    port: String,

    /// Connection password clients must send with PASS
    password: String,

    /// Configuration file path
    #[arg(short, long, default_value = "relayircd.toml")]
    config: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let port = parse_port(&cli.port)?;
    let password = parse_password(&cli.password)?;

    init_logging(&cli.log_level);

    let config = if cli.config.exists() {
        info!("Loading configuration from {:?}", cli.config);
        Config::from_file(&cli.config)?
    } else {
        info!("Configuration file not found, using defaults");
        Config::default()
    };
    config.validate()?;

    if let Some(path) = cli.write_config {
        config.to_file(&path)?;
        info!("Configuration written to {:?}", path);
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let module_names = config.modules.enabled.clone();
    let mut event_loop = EventLoop::bind(config, port, password, shutdown).await?;
    for name in &module_names {
        let module = relayircd_modules::create_module(name)?;
        event_loop.server_mut().load_module(module)?;
    }

    info!("Starting IRC relay on port {}", port);
    if let Err(e) = event_loop.run().await {
        error!("Event loop failed: {}", e);
        return Err(e.into());
    }

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str) {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();
}

/// Cancel `shutdown` on Ctrl-C, and on SIGQUIT where available
fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        warn!("Interrupt received, shutting down");
        shutdown.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut quit = match signal(SignalKind::quit()) {
        Ok(quit) => quit,
        Err(e) => {
            warn!("Cannot listen for SIGQUIT: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = quit.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
