//! Test utilities: scripted transports, recording sinks and frame builders
//!
//! Shared by unit tests and the benchmarks (behind the `benchmark` feature).

#![cfg(any(test, feature = "benchmark"))]

use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::codec;
use crate::latency::Clock;
use crate::render::{RenderEvent, RenderSink};
use crate::session::SessionSummary;
use crate::transport::Transport;
use crate::types::Fix;
use crate::{ReceiverError, Result};

/// Peer address reported by [`ScriptedTransport`].
pub const TEST_PEER: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 50)), 50123);

/// A fix near Mountain View with the given send time.
pub fn fix_with_timestamp(sent_at: f64) -> Fix {
    Fix { latitude: 37.422, longitude: -122.084, altitude: 30.0, sent_at }
}

/// Encode fixes back to back, as a sender would write them.
pub fn frames_to_bytes(fixes: &[Fix]) -> Vec<u8> {
    fixes.iter().flat_map(|fix| codec::encode(fix).into_bytes()).collect()
}

/// A clock stuck at `secs` seconds after the Unix epoch.
pub fn fixed_clock(secs: f64) -> impl Clock + Clone + 'static {
    let at = UNIX_EPOCH + Duration::from_secs_f64(secs);
    move || -> SystemTime { at }
}

#[derive(Debug)]
enum Ending {
    EndOfStream,
    Fail(std::io::ErrorKind),
    Pending,
}

/// Transport that replays a fixed list of chunks.
///
/// Chunks larger than the caller's buffer are split across reads.
#[derive(Debug)]
pub struct ScriptedTransport {
    chunks: VecDeque<Vec<u8>>,
    ending: Ending,
}

impl ScriptedTransport {
    /// Deliver `chunks`, then report end-of-stream.
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self { chunks: chunks.into(), ending: Ending::EndOfStream }
    }

    /// Deliver `chunks`, then fail with `kind`.
    pub fn failing_after(chunks: Vec<Vec<u8>>, kind: std::io::ErrorKind) -> Self {
        Self { chunks: chunks.into(), ending: Ending::Fail(kind) }
    }

    /// Deliver `chunks`, then block forever.
    pub fn pending_after(chunks: Vec<Vec<u8>>) -> Self {
        Self { chunks: chunks.into(), ending: Ending::Pending }
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        if let Some(mut chunk) = self.chunks.pop_front() {
            if chunk.len() > buf.len() {
                let rest = chunk.split_off(buf.len());
                self.chunks.push_front(rest);
            }
            buf[..chunk.len()].copy_from_slice(&chunk);
            return Ok(chunk.len());
        }

        match self.ending {
            Ending::EndOfStream => Ok(0),
            Ending::Fail(kind) => Err(ReceiverError::transport_failed(
                "reading scripted chunk",
                std::io::Error::from(kind),
            )),
            Ending::Pending => std::future::pending().await,
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        TEST_PEER
    }
}

/// Sink that keeps every event it is given.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<RenderEvent>,
    /// Number of `closed` calls
    pub closed: usize,
}

impl RenderSink for RecordingSink {
    fn render(&mut self, event: &RenderEvent) {
        self.events.push(event.clone());
    }

    fn closed(&mut self, _summary: &SessionSummary) {
        self.closed += 1;
    }
}
