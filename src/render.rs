//! Render sinks consuming per-frame updates
//!
//! The session hands every decoded fix to a [`RenderSink`] synchronously and
//! in decode order. A sink that blocks stalls the read loop, since there is no
//! backpressure between the two.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt::{self, Write as _};
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::session::{CloseReason, SessionSummary};
use crate::types::{DelayStats, Fix, SessionMetrics};

/// Everything a display needs after one frame was decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderEvent {
    /// The fix just decoded
    pub fix: Fix,
    /// The fix decoded before it, if any
    pub previous_fix: Option<Fix>,
    /// Latency statistics including this fix
    pub stats: DelayStats,
    /// Session counters at the time this fix was processed
    pub metrics: SessionMetrics,
    /// Connected sender
    pub peer: SocketAddr,
    /// Wall-clock receipt time used for the delay
    pub received_at: SystemTime,
}

/// Consumer of render events.
pub trait RenderSink {
    /// Called once per decoded frame, in decode order.
    fn render(&mut self, event: &RenderEvent);

    /// Called once when the session ends.
    fn closed(&mut self, _summary: &SessionSummary) {}
}

impl<F> RenderSink for F
where
    F: FnMut(&RenderEvent),
{
    fn render(&mut self, event: &RenderEvent) {
        self(event)
    }
}

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[1;1H";
const RULE: &str = "        -------------------------------------";

/// Format the dashboard text for one event, without the clear-screen prefix.
pub fn format_dashboard(event: &RenderEvent) -> String {
    let mut out = String::new();
    // writing to a String cannot fail
    let _ = write_dashboard(&mut out, event);
    out
}

fn write_dashboard(out: &mut String, event: &RenderEvent) -> fmt::Result {
    let metrics = &event.metrics;
    let stats = &event.stats;
    let received: DateTime<Local> = event.received_at.into();

    writeln!(out, "\n        GPS DATA RECEIVER")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "        | Connected To: {}", event.peer)?;
    writeln!(out, "        | Frames Received: {}", metrics.frames_received)?;
    writeln!(out, "        | Bytes Received: {}", metrics.bytes_received)?;
    writeln!(out, "        | Buffer: {} bytes", metrics.buffered_bytes)?;
    writeln!(out, "        | Queued Messages: {}", metrics.queued_frames())?;
    writeln!(out, "        | Partial Message: {} bytes", metrics.partial_bytes())?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "        | Last Timestamp: {}", received.format("%H:%M:%S"))?;
    writeln!(out, "        | Current Delay: {:.2}ms", stats.delay_ms)?;
    writeln!(
        out,
        "        | Avg Delay (Last {}): {}",
        stats.window_len,
        Millis(stats.rolling_average_ms)
    )?;
    writeln!(
        out,
        "        | Min / Max Delay: {} / {}",
        Millis(stats.min_ms),
        Millis(stats.max_ms)
    )?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "        | Latitude: {:.6}", event.fix.latitude)?;
    writeln!(out, "        | Longitude: {:.6}", event.fix.longitude)?;
    writeln!(out, "        | Altitude: {:.6}m", event.fix.altitude)?;
    match &event.previous_fix {
        Some(prev) => {
            writeln!(out, "        | Previous: {:.6}, {:.6}", prev.latitude, prev.longitude)?
        }
        None => writeln!(out, "        | Previous: ~, ~")?,
    }
    writeln!(out, "{RULE}")
}

/// Optional delay shown as `12.50ms`, or `~` when unknown.
struct Millis(Option<f64>);

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ms) => write!(f, "{ms:.2}ms"),
            None => f.write_str("~"),
        }
    }
}

/// Full-screen ANSI dashboard redrawn on every frame.
#[derive(Debug)]
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_frame(&mut self, text: &str) {
        let result = self
            .out
            .write_all(CLEAR_SCREEN.as_bytes())
            .and_then(|_| self.out.write_all(text.as_bytes()))
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            warn!("Failed to draw dashboard: {}", e);
        }
    }
}

impl<W: Write> RenderSink for ConsoleSink<W> {
    fn render(&mut self, event: &RenderEvent) {
        let text = format_dashboard(event);
        self.write_frame(&text);
    }

    fn closed(&mut self, summary: &SessionSummary) {
        let line = match &summary.close_reason {
            CloseReason::EndOfStream => "\n        Connection closed by sender\n".to_string(),
            CloseReason::TransportError(e) => format!("\n        Connection lost: {e}\n"),
        };
        if let Err(e) = self.out.write_all(line.as_bytes()).and_then(|_| self.out.flush()) {
            warn!("Failed to write session summary: {}", e);
        }
    }
}

/// Logs each event through `tracing` instead of drawing a dashboard.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl RenderSink for TracingSink {
    fn render(&mut self, event: &RenderEvent) {
        info!(
            frame = event.stats.ordinal,
            peer = %event.peer,
            latitude = event.fix.latitude,
            longitude = event.fix.longitude,
            altitude = event.fix.altitude,
            delay_ms = event.stats.delay_ms,
            avg_ms = ?event.stats.rolling_average_ms,
            min_ms = ?event.stats.min_ms,
            max_ms = ?event.stats.max_ms,
            buffered = event.metrics.buffered_bytes,
            "Fix received"
        );
    }

    fn closed(&mut self, summary: &SessionSummary) {
        info!(
            frames = summary.metrics.frames_received,
            bytes = summary.metrics.bytes_received,
            reason = %summary.close_reason,
            "Session ended"
        );
    }
}

/// Publishes the latest event on a watch channel.
///
/// Observers that fall behind only ever see the newest event.
#[derive(Debug)]
pub struct WatchSink {
    tx: watch::Sender<Option<Arc<RenderEvent>>>,
}

impl WatchSink {
    pub fn new(tx: watch::Sender<Option<Arc<RenderEvent>>>) -> Self {
        Self { tx }
    }
}

impl RenderSink for WatchSink {
    fn render(&mut self, event: &RenderEvent) {
        // send_replace keeps publishing even while nobody is subscribed
        self.tx.send_replace(Some(Arc::new(event.clone())));
    }
}
