//! Receive GPS fixes from one sender and show a live latency dashboard.

use anyhow::Context;
use clap::Parser;
use gpsrx::render::{ConsoleSink, TracingSink};
use gpsrx::{CloseReason, Receiver, ReceiverConfig, RenderSink, logging};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(version, about = "Single-connection GPS telemetry receiver")]
struct Args {
    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    address: Option<IpAddr>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Samples in the rolling average
    #[arg(short, long)]
    window: Option<usize>,

    /// Default log level when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    /// Log each fix instead of drawing the dashboard
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<(ReceiverConfig, bool)> {
        let mut config = match &self.config {
            Some(path) => ReceiverConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ReceiverConfig::default(),
        };

        if let Some(address) = self.address {
            config.listen_address = address;
        }
        if let Some(port) = self.port {
            config.listen_port = port;
        }
        if let Some(window) = self.window {
            config.window_size = window;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        config.validate()?;

        Ok((config, self.quiet))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let (config, quiet) = Args::parse().into_config()?;
    logging::init(&config.logging)?;

    let mut sink: Box<dyn RenderSink> =
        if quiet { Box::new(TracingSink) } else { Box::new(ConsoleSink::stdout()) };
    let summary = Receiver::run(&config, sink.as_mut()).await?;

    match &summary.close_reason {
        CloseReason::EndOfStream => info!("Sender disconnected"),
        CloseReason::TransportError(e) => {
            warn!("Session ended by transport error: {}", e);
            for suggestion in e.recovery_suggestions() {
                warn!("  - {}", suggestion);
            }
        }
    }
    info!(
        frames = summary.metrics.frames_received,
        bytes = summary.metrics.bytes_received,
        min_delay_ms = ?summary.metrics.min_delay_ms,
        max_delay_ms = ?summary.metrics.max_delay_ms,
        "Receiver stopped"
    );

    Ok(())
}
