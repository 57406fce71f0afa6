#![deny(unsafe_code)]

//! Waypost CLI — local rendezvous over Unix domain sockets.
//!
//! The binary is the server-loop layer above `waypost-core`: the core
//! creates endpoints and delivers single-shot payloads; the accept
//! loops in `announce` and `discovery` live here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use waypost_core::{ConnectionConsumer, Endpoint, EndpointManager, RendezvousChannel};

/// Waypost — a minimal Unix-socket rendezvous primitive.
#[derive(Parser)]
#[command(name = "waypost", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "waypost.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an ephemeral endpoint, advertise it, and print incoming
    /// payloads until Ctrl-C.
    Announce,

    /// Deliver a single message to a named endpoint.
    Send {
        /// Target endpoint socket path.
        #[arg(short, long)]
        target: PathBuf,

        /// Message bytes; read from stdin when omitted.
        message: Option<String>,
    },

    /// Run the discovery service on the well-known socket path and log
    /// each advertised endpoint name.
    Discovery,

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up tracing subscriber with verbosity level
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    match cli.command {
        Commands::Announce => cmd_announce(&cli.config).await?,
        Commands::Send { target, message } => cmd_send(&target, message).await?,
        Commands::Discovery => cmd_discovery(&cli.config).await?,
        Commands::Config { show } => cmd_config(&cli.config, show).await?,
    }

    Ok(())
}

/// Prints each received payload to stdout.
struct PrintingConsumer;

impl ConnectionConsumer for PrintingConsumer {
    fn consume(
        &self,
        mut stream: tokio::net::UnixStream,
    ) -> waypost_core::BoxFuture<'_, std::io::Result<()>> {
        Box::pin(async move {
            let mut payload = Vec::new();
            stream.read_to_end(&mut payload).await?;
            println!("{}", String::from_utf8_lossy(&payload));
            Ok(())
        })
    }
}

async fn cmd_announce(config_path: &Path) -> Result<()> {
    let config = load_config(config_path).await?;
    let manager = EndpointManager::from_config(&config);

    let endpoint = manager
        .create()
        .context("endpoint creation failed")?;
    println!("listening on {}", endpoint.path().display());

    let discovery_path = PathBuf::from(&config.ipc.discovery_path);
    waypost_core::advertise(&discovery_path, &endpoint)
        .await
        .context("advertising endpoint name failed")?;

    run_accept_loop(&endpoint, &PrintingConsumer).await
}

async fn cmd_send(target: &Path, message: Option<String>) -> Result<()> {
    let payload = match message {
        Some(text) => text.into_bytes(),
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .context("reading message from stdin failed")?;
            buf
        }
    };

    RendezvousChannel::new(target)
        .send(&payload)
        .await
        .context("message send failed")?;
    info!(target = %target.display(), bytes = payload.len(), "message sent");
    Ok(())
}

async fn cmd_discovery(config_path: &Path) -> Result<()> {
    let config = load_config(config_path).await?;
    let manager = EndpointManager::from_config(&config);

    let endpoint = manager
        .create_named(&config.ipc.discovery_path)
        .context("binding discovery socket failed")?;
    println!("discovery service on {}", endpoint.path().display());

    loop {
        tokio::select! {
            accepted = endpoint.accept() => {
                let mut stream = accepted.context("accepting discovery connection failed")?;
                match waypost_core::read_advertisement(&mut stream).await {
                    Ok(advertised) => println!("advertised: {}", advertised.display()),
                    Err(err) => tracing::warn!(error = %err, "malformed advertisement"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, stopping discovery service");
                return Ok(());
            }
        }
    }
}

/// Minimal accept loop — the layer the core's consumer boundary exists
/// for. Connections are consumed one at a time; fan-out would belong
/// to a bigger server, not this binary.
async fn run_accept_loop(endpoint: &Endpoint, consumer: &dyn ConnectionConsumer) -> Result<()> {
    loop {
        tokio::select! {
            accepted = endpoint.accept() => {
                let stream = accepted.context("accepting connection failed")?;
                consumer
                    .consume(stream)
                    .await
                    .context("consuming connection failed")?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, tearing down endpoint");
                return Ok(());
            }
        }
    }
}

async fn cmd_config(config_path: &Path, show: bool) -> Result<()> {
    let config = load_config(config_path).await?;
    if show {
        let toml_str =
            toml::to_string_pretty(&config).map_err(|e| anyhow::anyhow!("TOML error: {e}"))?;
        println!("{toml_str}");
    } else {
        println!("Configuration at '{}' is valid.", config_path.display());
    }
    Ok(())
}

async fn load_config(path: &Path) -> Result<waypost_config::AppConfig> {
    if path.exists() {
        waypost_config::AppConfig::load(path)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(waypost_config::AppConfig::default())
    }
}
