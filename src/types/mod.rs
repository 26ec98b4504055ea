//! Core types for the receiver pipeline.
//!
//! ## Architecture
//!
//! Data moves through these types in one direction:
//! - [`RawFrame`] is one complete 24-byte record cut from the byte stream
//! - [`Fix`] is the decoded position and its embedded send timestamp
//! - [`DelaySample`] is one latency measurement stored in the rolling window
//! - [`DelayStats`] is what the latency tracker reports for each fix
//! - [`SessionMetrics`] is the session-wide snapshot handed to render sinks
//!
//! ## Usage Example
//!
//! ```rust
//! use gpsrx::types::{Fix, RawFrame, FRAME_SIZE};
//!
//! let fix = Fix { latitude: 37.422, longitude: -122.084, altitude: 30.0, sent_at: 1.0e9 };
//! let frame = gpsrx::codec::encode(&fix);
//! assert_eq!(frame.as_bytes().len(), FRAME_SIZE);
//!
//! let bytes: &[u8] = frame.as_ref();
//! let copy = RawFrame::try_from(bytes).unwrap();
//! assert_eq!(gpsrx::codec::decode(&copy), fix);
//! ```

mod fix;
mod stats;

pub use fix::{FRAME_SIZE, Fix, RawFrame};
pub use stats::{DelaySample, DelayStats, SessionMetrics};
