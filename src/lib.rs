//! Single-connection GPS telemetry receiver.
//!
//! `gpsrx` accepts one TCP client, cuts its byte stream into fixed 24-byte
//! records, decodes each record into a position fix with an embedded send
//! timestamp, and tracks the send-to-receipt latency of every fix.
//!
//! # Pipeline
//!
//! ```text
//! transport bytes -> StreamReassembler -> codec::decode -> LatencyTracker -> RenderSink
//! ```
//!
//! - [`reassembler::StreamReassembler`] buffers partial records across reads
//! - [`codec`] decodes the big-endian wire format
//! - [`latency::LatencyTracker`] keeps a rolling average and session min/max
//! - [`session::ReceiverSession`] drives all of the above for one connection
//! - [`render::RenderSink`] receives one event per fix, in decode order
//!
//! # Example
//!
//! ```rust,no_run
//! use gpsrx::{Receiver, ReceiverConfig, render::TracingSink};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> gpsrx::Result<()> {
//!     let config = ReceiverConfig::default();
//!     let summary = Receiver::run(&config, &mut TracingSink).await?;
//!     println!("received {} fixes", summary.metrics.frames_received);
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
pub mod types;

// Decode pipeline
pub mod codec;
pub mod latency;
pub mod reassembler;

// Session and I/O
pub mod connection;
pub mod driver;
pub mod render;
pub mod session;
pub mod transport;

// Ambient
pub mod config;
pub mod logging;
pub mod nmea;

#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;

pub use config::{LoggingConfig, ReceiverConfig};
pub use connection::{Listener, ReceiverHandle};
pub use error::*;
pub use render::{RenderEvent, RenderSink};
pub use session::{CloseReason, ReceiverSession, SessionState, SessionSummary};
pub use types::*;

use tracing::info;

use driver::Driver;

/// Entry point for running a receiver from configuration.
pub struct Receiver;

impl Receiver {
    /// Bind, accept one client, and process its stream until it closes.
    ///
    /// Fixes are rendered to `sink` as they are decoded. A transport error
    /// ends the session and is reported in the summary's close reason, not as
    /// an `Err`. Only binding and accepting can fail.
    pub async fn run<S>(config: &ReceiverConfig, sink: &mut S) -> Result<SessionSummary>
    where
        S: RenderSink + ?Sized,
    {
        let session = ReceiverSession::from_config(config)?;
        let listener = Listener::bind(config.listen_addr())?;
        info!("Receiver started, waiting for a connection on {}", listener.local_addr());

        let transport = listener.accept_one().await?;
        Ok(session.run(transport, sink).await)
    }

    /// Bind, accept one client, and process its stream on a background task.
    pub async fn spawn(config: &ReceiverConfig) -> Result<ReceiverHandle> {
        let session = ReceiverSession::from_config(config)?;
        let listener = Listener::bind(config.listen_addr())?;
        info!("Receiver started, waiting for a connection on {}", listener.local_addr());

        let transport = listener.accept_one().await?;
        let peer = transport::Transport::peer_addr(&transport);
        let channels = Driver::spawn(session, transport);
        Ok(ReceiverHandle::from_channels(channels, peer))
    }
}
