//! Latency statistics and session metrics

use serde::{Deserialize, Serialize};

use super::FRAME_SIZE;

/// One latency measurement in the rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelaySample {
    /// Receipt time minus send time, in milliseconds. Negative under clock skew.
    pub value_ms: f64,
    /// Sequence number, starting at 1 for the first fix of the session
    pub ordinal: u64,
}

/// Statistics reported for each decoded fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayStats {
    /// Sequence number of the sample these stats were computed for
    pub ordinal: u64,
    /// Samples in the rolling window, this one included unless its delay is not finite
    pub window_len: usize,
    /// Delay of this fix in milliseconds
    pub delay_ms: f64,
    /// Mean of the samples currently in the rolling window, `None` while it is empty
    pub rolling_average_ms: Option<f64>,
    /// Smallest finite delay seen this session
    pub min_ms: Option<f64>,
    /// Largest finite delay seen this session
    pub max_ms: Option<f64>,
}

/// Session-wide counters, snapshotted for each render event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Decoded frames so far
    pub frames_received: u64,
    /// Bytes read from the transport so far
    pub bytes_received: u64,
    /// Smallest delay so far, `None` before the first fix
    pub min_delay_ms: Option<f64>,
    /// Largest delay so far, `None` before the first fix
    pub max_delay_ms: Option<f64>,
    /// Bytes held in the reassembly buffer when the snapshot was taken
    pub buffered_bytes: usize,
}

impl SessionMetrics {
    /// Whole frames still waiting in the buffer behind the current one.
    pub fn queued_frames(&self) -> usize {
        self.buffered_bytes / FRAME_SIZE
    }

    /// Bytes of an incomplete trailing frame.
    pub fn partial_bytes(&self) -> usize {
        self.buffered_bytes % FRAME_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_occupancy_splits_into_frames_and_partial() {
        let metrics = SessionMetrics { buffered_bytes: 2 * FRAME_SIZE + 5, ..Default::default() };
        assert_eq!(metrics.queued_frames(), 2);
        assert_eq!(metrics.partial_bytes(), 5);

        let empty = SessionMetrics::default();
        assert_eq!(empty.queued_frames(), 0);
        assert_eq!(empty.partial_bytes(), 0);
        assert_eq!(empty.min_delay_ms, None);
    }
}
