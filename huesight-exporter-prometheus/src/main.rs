//! Prometheus exporter for Philips Hue bridges.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info};

use huesight_bridge_client::HueBridgeClient;
use huesight_common::{LoggingConfig, init_tracing};
use huesight_exporter_prometheus::generate::{self, GenerateOptions};
use huesight_exporter_prometheus::{Exporter, ExporterConfig, HttpServer};

/// Prometheus exporter for Philips Hue bridges.
#[derive(Parser, Debug)]
#[command(name = "huesight-exporter-prometheus")]
#[command(about = "Export Philips Hue lights, groups and sensors as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long, global = true, default_value = "huesight.json5")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve metrics (default).
    Run {
        /// HTTP listen address (overrides config).
        #[arg(long)]
        listen: Option<String>,
    },
    /// Pair with a bridge and write a configuration file.
    Generate {
        /// Where to write the configuration (defaults to --config).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Bridge address; discovered when omitted.
        #[arg(long)]
        address: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Some(Command::Generate { output, address }) => {
            let output = output.unwrap_or_else(|| args.config.clone());
            run_generate(output, address, args.log_level).await
        }
        Some(Command::Run { listen }) => run(&args.config, listen, args.log_level).await,
        None => run(&args.config, None, args.log_level).await,
    }
}

async fn run(
    config_path: &Path,
    listen: Option<String>,
    log_level: Option<String>,
) -> anyhow::Result<()> {
    let mut config = ExporterConfig::load_from_file(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Override from CLI
    if let Some(listen) = listen {
        config.prometheus.listen = listen;
    }
    if let Some(level) = log_level {
        config.logging.level = level;
    }
    config.validate()?;

    init_tracing(&config.logging)?;

    info!("Starting HueSight Prometheus Exporter");

    let client = HueBridgeClient::new(
        &config.bridge.address,
        config.bridge.api_key.clone(),
        config.bridge.timeout(),
    )?;
    client
        .login()
        .await
        .with_context(|| format!("Failed to log in to bridge at {}", client.base_url()))?;
    info!(bridge = %client.base_url(), "Connected to bridge");

    let exporter = Arc::new(Exporter::new(Arc::new(client), &config));

    let listen_addr = config
        .prometheus
        .listen
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_server = HttpServer::new(
        exporter.clone(),
        listen_addr,
        config.prometheus.path.clone(),
    );
    let http_task = tokio::spawn(async move {
        if let Err(e) = http_server.run(shutdown_rx).await {
            error!("HTTP server error: {}", e);
        }
    });

    wait_for_signal().await;

    // Signal shutdown
    shutdown_tx.send(true)?;

    let _ = tokio::time::timeout(Duration::from_secs(5), http_task).await;

    let stats = exporter.stats();
    info!(
        scrapes = stats.scrapes,
        last_duration_ms = stats.last_duration_ms,
        series_count = stats.last_series,
        "Final statistics"
    );

    info!("Exporter stopped");
    Ok(())
}

async fn run_generate(
    output: PathBuf,
    address: Option<String>,
    log_level: Option<String>,
) -> anyhow::Result<()> {
    let mut logging = LoggingConfig::default();
    if let Some(level) = log_level {
        logging.level = level;
    }
    init_tracing(&logging)?;

    let options = GenerateOptions {
        address,
        ..Default::default()
    };

    let config = generate::generate(&options, |attempt| async move {
        prompt_link_button(attempt).await
    })
    .await?;

    config
        .save_to_file(&output)
        .with_context(|| format!("Failed to write config to {}", output.display()))?;

    info!(path = %output.display(), bridge = %config.bridge.address, "Configuration written");
    Ok(())
}

/// Ask the user to press the link button; `false` when stdin is closed.
async fn prompt_link_button(attempt: u32) -> bool {
    let read = tokio::task::spawn_blocking(move || {
        let mut stdout = std::io::stdout();
        if attempt > 1 {
            writeln!(stdout, "The link button was not pressed.").ok();
        }
        write!(
            stdout,
            "Press the link button on the bridge, then press Enter to continue: "
        )
        .ok();
        stdout.flush().ok();

        let mut line = String::new();
        std::io::stdin().read_line(&mut line)
    })
    .await;

    matches!(read, Ok(Ok(n)) if n > 0)
}

async fn wait_for_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = async {
            #[cfg(unix)]
            {
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(e) => {
                        error!("Failed to install SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}
