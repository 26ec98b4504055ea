//! Wire record and decoded position types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of one wire record: three 4-byte floats and one 8-byte timestamp.
pub const FRAME_SIZE: usize = 24;

/// One complete, undecoded wire record.
///
/// A `RawFrame` can only be built from exactly [`FRAME_SIZE`] bytes, so the
/// decoder never sees a torn record.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawFrame([u8; FRAME_SIZE]);

impl RawFrame {
    /// Wrap a complete record.
    pub const fn new(bytes: [u8; FRAME_SIZE]) -> Self {
        Self(bytes)
    }

    /// Borrow the record bytes.
    pub fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.0
    }

    /// Consume the frame and return its bytes.
    pub fn into_bytes(self) -> [u8; FRAME_SIZE] {
        self.0
    }
}

impl AsRef<[u8]> for RawFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for RawFrame {
    type Error = crate::ReceiverError;

    fn try_from(bytes: &[u8]) -> crate::Result<Self> {
        let array: [u8; FRAME_SIZE] = bytes.try_into().map_err(|_| {
            crate::ReceiverError::FrameLength { expected: FRAME_SIZE, found: bytes.len() }
        })?;
        Ok(Self(array))
    }
}

impl fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawFrame(")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// A decoded GPS fix with the sender's wall-clock timestamp.
///
/// Field values are reported exactly as decoded. Nothing checks that the
/// latitude is within ±90 or that the timestamp is plausible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Latitude in decimal degrees
    pub latitude: f32,
    /// Longitude in decimal degrees
    pub longitude: f32,
    /// Altitude in meters
    pub altitude: f32,
    /// Send time in seconds since the Unix epoch, with fractional precision
    pub sent_at: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_from_accepts_exactly_one_frame() {
        let bytes = [7u8; FRAME_SIZE];
        let frame = RawFrame::try_from(&bytes[..]).expect("24 bytes is a frame");
        assert_eq!(frame.as_bytes(), &bytes);
        assert_eq!(frame.into_bytes(), bytes);
    }

    #[test]
    fn try_from_rejects_other_lengths() {
        for len in [0, 1, 23, 25, 48] {
            let bytes = vec![0u8; len];
            match RawFrame::try_from(bytes.as_slice()) {
                Err(crate::ReceiverError::FrameLength { expected, found }) => {
                    assert_eq!(expected, FRAME_SIZE);
                    assert_eq!(found, len);
                }
                other => panic!("Expected FrameLength error for {len} bytes, got {other:?}"),
            }
        }
    }

    #[test]
    fn debug_prints_hex() {
        let mut bytes = [0u8; FRAME_SIZE];
        bytes[0] = 0xab;
        let text = format!("{:?}", RawFrame::new(bytes));
        assert!(text.starts_with("RawFrame(ab00"));
        assert_eq!(text.len(), "RawFrame()".len() + FRAME_SIZE * 2);
    }
}
