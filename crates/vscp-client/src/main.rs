//! VSCP Level-2 client: demo entry point.
//!
//! Runs one session against the in-process loopback driver: connects,
//! applies the configured receive filter, sends a burst of events, drains
//! whatever the filter let through, and logs the session statistics.
//!
//! # Usage
//!
//! ```text
//! vscp-client [OPTIONS]
//!
//! Options:
//!   --config <PATH>        TOML configuration file [default: vscp-client.toml]
//!   --interface <STRING>   Override the session interface string
//!   --debug                Set the debug flag (verbose per-event logging)
//!   --count <N>            Events to send [default: 5]
//!   --class <N>            VSCP class of the sent events [default: 10]
//!   --type <N>             VSCP type of the sent events [default: 6]
//!   --write-config         Write the effective configuration and exit
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable          | Description                         |
//! |-------------------|-------------------------------------|
//! | `VSCP_CONFIG`     | Path of the TOML configuration file |
//! | `VSCP_INTERFACE`  | Interface string                    |
//! | `RUST_LOG`        | `tracing` filter, overrides the file |

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use vscp_client::infrastructure::driver::LoopbackDriver;
use vscp_client::infrastructure::storage::config::{load_config, save_config};
use vscp_client::{Session, SessionNotification};
use vscp_core::protocol::flags;
use vscp_core::{Event, Guid, VscpError};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// VSCP Level-2 client demo running over the loopback driver.
#[derive(Debug, Parser)]
#[command(name = "vscp-client", about = "VSCP Level-2 client session demo", version)]
struct Cli {
    /// TOML configuration file.  A missing file means defaults.
    #[arg(long, default_value = "vscp-client.toml", env = "VSCP_CONFIG")]
    config: PathBuf,

    /// Interface string handed to the driver.
    #[arg(long, env = "VSCP_INTERFACE")]
    interface: Option<String>,

    /// Set the debug flag in the session flags.
    #[arg(long)]
    debug: bool,

    /// Number of events to send.
    #[arg(long, default_value_t = 5)]
    count: u16,

    /// VSCP class of the sent events.
    #[arg(long = "class", default_value_t = 10)]
    vscp_class: u16,

    /// VSCP type of the sent events.
    #[arg(long = "type", default_value_t = 6)]
    vscp_type: u16,

    /// Write the effective configuration to `--config` and exit.
    #[arg(long)]
    write_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = load_config(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(interface) = cli.interface.clone() {
        cfg.session.interface = interface;
    }
    if cfg.session.interface.is_empty() {
        cfg.session.interface = "loopback".to_string();
    }
    if cli.debug {
        cfg.session.flags |= flags::ENABLE_DEBUG;
    }

    // RUST_LOG wins; otherwise the debug flag, then the file's level.
    let default_directive = if cfg.session.debug_enabled() {
        "debug".to_string()
    } else {
        cfg.log_level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .init();

    if cli.write_config {
        save_config(&cli.config, &cfg)
            .with_context(|| format!("writing {}", cli.config.display()))?;
        info!(path = %cli.config.display(), "configuration written");
        return Ok(());
    }

    info!(interface = %cfg.session.interface, "VSCP client starting");

    let driver = Arc::new(LoopbackDriver::new(cfg.session.interface.clone()));
    let session = Arc::new(
        Session::new(cfg.session.clone(), driver).context("creating session")?,
    );

    // ── Notification logger ───────────────────────────────────────────────────
    let mut notifications = session.subscribe();
    let logger = tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(SessionNotification::Error(message)) => warn!("session error: {message}"),
                Ok(SessionNotification::EventSent(e)) => {
                    debug!(vscp_class = e.vscp_class, vscp_type = e.vscp_type, "notified: sent")
                }
                Ok(SessionNotification::EventReceived(e)) => {
                    debug!(vscp_class = e.vscp_class, vscp_type = e.vscp_type, "notified: received")
                }
                Ok(other) => info!("notified: {other:?}"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "notification logger lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    session.connect().await.context("connecting")?;
    let version = session.version().await.context("querying driver version")?;
    let interfaces = session.interfaces().await.context("listing interfaces")?;
    info!(%version, ?interfaces, capabilities = session.capabilities(), "driver ready");

    if let Some(filter) = cfg.filter {
        session.set_filter(filter).context("applying filter")?;
        info!(?filter, "receive filter applied");
    }

    // ── Send a burst ──────────────────────────────────────────────────────────
    let origin = Guid::new_random();
    info!(guid = %origin, count = cli.count, "sending events");
    for i in 0..cli.count {
        let event = Event::new(cli.vscp_class, cli.vscp_type)
            .with_guid(origin.as_bytes())
            .with_payload(i.to_be_bytes().to_vec());
        session.send(&event, None).await.context("sending event")?;
    }

    // ── Drain the echo ────────────────────────────────────────────────────────
    loop {
        tokio::select! {
            result = session.receive(Some(Duration::from_millis(200))) => match result {
                Ok(event) => {
                    info!(
                        vscp_class = event.vscp_class,
                        vscp_type = event.vscp_type,
                        priority = event.priority(),
                        payload = ?event.payload(),
                        "received"
                    );
                    if let Ok(json) = event.to_json() {
                        debug!("record: {json}");
                    }
                }
                Err(VscpError::Timeout) => break,
                Err(e) => return Err(e).context("receiving"),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    let stats = session.statistics();
    info!(
        sent = stats.sent,
        received = stats.received,
        errors = stats.errors,
        "session statistics"
    );
    if let Ok(json) = serde_json::to_string(&stats) {
        debug!("statistics: {json}");
    }

    session.disconnect().await.context("disconnecting")?;
    drop(session);
    logger.abort();
    info!("VSCP client stopped");
    Ok(())
}
