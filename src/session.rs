//! Receiver session: one connection from accept to close
//!
//! A session moves through three states:
//!
//! ```text
//! WaitingForConnection --connected--> Streaming --(0-byte read | error)--> Closed
//!                                        |  ^
//!                                        +--+ read of >= 1 byte
//! ```
//!
//! Every chunk is processed to completion (reassembled, decoded, tracked and
//! rendered) before the next read is issued, so render sinks observe fixes in
//! exactly the order they were decoded. `Closed` is terminal. There is no
//! reconnect.

use std::fmt;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use tracing::{debug, error, info, trace, warn};

use crate::codec;
use crate::config::ReceiverConfig;
use crate::latency::{Clock, LatencyTracker, SystemClock};
use crate::reassembler::StreamReassembler;
use crate::render::{RenderEvent, RenderSink};
use crate::transport::Transport;
use crate::types::{DelayStats, Fix, SessionMetrics};
use crate::{ReceiverError, Result};

/// Default size of the transport read buffer.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    WaitingForConnection,
    Streaming,
    Closed,
}

/// Why a session ended.
#[derive(Debug)]
pub enum CloseReason {
    /// The peer closed the stream
    EndOfStream,
    /// A read failed
    TransportError(ReceiverError),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::EndOfStream => f.write_str("end of stream"),
            CloseReason::TransportError(e) => write!(f, "transport error: {e}"),
        }
    }
}

/// Final state of a closed session.
#[derive(Debug)]
pub struct SessionSummary {
    pub peer: Option<SocketAddr>,
    pub close_reason: CloseReason,
    pub metrics: SessionMetrics,
    /// Stats of the last decoded fix
    pub last_stats: Option<DelayStats>,
    /// Last decoded fix
    pub last_fix: Option<Fix>,
}

/// Session-scoped pipeline state: reassembly buffer, latency tracker and counters.
#[derive(Debug)]
pub struct ReceiverSession<C: Clock = SystemClock> {
    state: SessionState,
    peer: Option<SocketAddr>,
    reassembler: StreamReassembler,
    tracker: LatencyTracker,
    frames_received: u64,
    bytes_received: u64,
    last_fix: Option<Fix>,
    last_stats: Option<DelayStats>,
    read_buffer_size: usize,
    clock: C,
}

impl ReceiverSession<SystemClock> {
    /// Create a session that timestamps receipt with the system clock.
    pub fn new(window_size: NonZeroUsize) -> Self {
        Self::with_clock(window_size, SystemClock)
    }

    /// Create a session from validated configuration.
    pub fn from_config(config: &ReceiverConfig) -> Result<Self> {
        config.validate()?;
        let window = config.window()?;
        Ok(Self::new(window).with_read_buffer_size(config.read_buffer_size))
    }
}

impl<C: Clock> ReceiverSession<C> {
    /// Create a session with an explicit receipt clock.
    pub fn with_clock(window_size: NonZeroUsize, clock: C) -> Self {
        Self {
            state: SessionState::WaitingForConnection,
            peer: None,
            reassembler: StreamReassembler::with_capacity(DEFAULT_READ_BUFFER_SIZE),
            tracker: LatencyTracker::new(window_size),
            frames_received: 0,
            bytes_received: 0,
            last_fix: None,
            last_stats: None,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            clock,
        }
    }

    /// Set the transport read buffer size (minimum 1).
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Transition `WaitingForConnection -> Streaming`.
    pub fn on_connected(&mut self, peer: SocketAddr) {
        if self.state != SessionState::WaitingForConnection {
            warn!(state = ?self.state, %peer, "Ignoring connection outside WaitingForConnection");
            return;
        }
        info!(%peer, "Client connected, streaming");
        self.peer = Some(peer);
        self.state = SessionState::Streaming;
    }

    /// Feed one transport chunk through the pipeline.
    ///
    /// Every frame the chunk completes is decoded, tracked and rendered before
    /// this returns. Returns the number of frames decoded. Chunks delivered
    /// outside `Streaming` are dropped.
    pub fn ingest<S>(&mut self, chunk: &[u8], sink: &mut S) -> usize
    where
        S: RenderSink + ?Sized,
    {
        let peer = match (self.state, self.peer) {
            (SessionState::Streaming, Some(peer)) => peer,
            (state, _) => {
                warn!(?state, bytes = chunk.len(), "Dropping bytes received outside Streaming");
                return 0;
            }
        };

        self.bytes_received += chunk.len() as u64;
        self.reassembler.push(chunk);

        let mut decoded = 0;
        while let Some(frame) = self.reassembler.next_frame() {
            let fix = codec::decode(&frame);
            let received_at = self.clock.now();
            let stats = self.tracker.update(&fix, received_at);
            self.frames_received += 1;
            decoded += 1;

            trace!(
                frame = stats.ordinal,
                latitude = fix.latitude,
                longitude = fix.longitude,
                altitude = fix.altitude,
                delay_ms = stats.delay_ms,
                "Decoded frame"
            );

            let event = RenderEvent {
                fix,
                previous_fix: self.last_fix,
                stats,
                metrics: self.metrics(),
                peer,
                received_at,
            };
            sink.render(&event);

            self.last_fix = Some(fix);
            self.last_stats = Some(stats);
        }

        if self.reassembler.partial_len() > 0 {
            debug!(partial = self.reassembler.partial_len(), "Holding partial frame");
        }

        decoded
    }

    /// Snapshot of the session counters.
    pub fn metrics(&self) -> SessionMetrics {
        SessionMetrics {
            frames_received: self.frames_received,
            bytes_received: self.bytes_received,
            min_delay_ms: self.tracker.min(),
            max_delay_ms: self.tracker.max(),
            buffered_bytes: self.reassembler.buffered_len(),
        }
    }

    /// Transition to `Closed` and summarize the session.
    pub fn close(&mut self, reason: CloseReason) -> SessionSummary {
        self.state = SessionState::Closed;
        if self.reassembler.buffered_len() > 0 {
            debug!(
                discarded = self.reassembler.buffered_len(),
                "Discarding incomplete frame at close"
            );
        }
        info!(
            frames = self.frames_received,
            bytes = self.bytes_received,
            reason = %reason,
            "Session closed"
        );

        SessionSummary {
            peer: self.peer,
            close_reason: reason,
            metrics: self.metrics(),
            last_stats: self.last_stats,
            last_fix: self.last_fix,
        }
    }

    /// Drive the session over `transport` until the peer closes or a read fails.
    ///
    /// Transport errors end the session and are reported in the summary; they
    /// are never retried.
    pub async fn run<T, S>(mut self, mut transport: T, sink: &mut S) -> SessionSummary
    where
        T: Transport,
        S: RenderSink + ?Sized,
    {
        self.on_connected(transport.peer_addr());
        let mut buf = vec![0u8; self.read_buffer_size];

        let reason = loop {
            match transport.read_chunk(&mut buf).await {
                Ok(0) => {
                    info!("Peer closed the connection");
                    break CloseReason::EndOfStream;
                }
                Ok(read) => {
                    self.ingest(&buf[..read], sink);
                }
                Err(e) => {
                    error!("Read failed, ending session: {}", e);
                    break CloseReason::TransportError(e);
                }
            }
        };

        let summary = self.close(reason);
        sink.closed(&summary);
        summary
    }
}
