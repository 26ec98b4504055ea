//! Wire format for GPS fix records
//!
//! Each record is exactly [`FRAME_SIZE`] bytes, big-endian, with no delimiter,
//! length prefix or checksum:
//!
//! | Offset | Size | Field                                  |
//! |--------|------|----------------------------------------|
//! | 0      | 4    | latitude, IEEE-754 `f32`               |
//! | 4      | 4    | longitude, IEEE-754 `f32`              |
//! | 8      | 4    | altitude, IEEE-754 `f32`               |
//! | 12     | 8    | send time, IEEE-754 `f64` epoch seconds |
//! | 20     | 4    | unused, sent as zero                   |
//!
//! Floats travel as their bit patterns in network byte order. Decoding never
//! fails and never validates ranges, so a corrupted or misaligned record
//! decodes to whatever values its bytes spell.

use crate::types::{FRAME_SIZE, Fix, RawFrame};

const LATITUDE_OFFSET: usize = 0;
const LONGITUDE_OFFSET: usize = 4;
const ALTITUDE_OFFSET: usize = 8;
const TIMESTAMP_OFFSET: usize = 12;

/// Decode one record into a [`Fix`].
pub fn decode(frame: &RawFrame) -> Fix {
    let bytes = frame.as_bytes();
    Fix {
        latitude: read_f32_be(bytes, LATITUDE_OFFSET),
        longitude: read_f32_be(bytes, LONGITUDE_OFFSET),
        altitude: read_f32_be(bytes, ALTITUDE_OFFSET),
        sent_at: read_f64_be(bytes, TIMESTAMP_OFFSET),
    }
}

/// Encode a [`Fix`] as one record. Trailing unused bytes are zero.
pub fn encode(fix: &Fix) -> RawFrame {
    let mut bytes = [0u8; FRAME_SIZE];
    bytes[LATITUDE_OFFSET..LATITUDE_OFFSET + 4].copy_from_slice(&fix.latitude.to_be_bytes());
    bytes[LONGITUDE_OFFSET..LONGITUDE_OFFSET + 4].copy_from_slice(&fix.longitude.to_be_bytes());
    bytes[ALTITUDE_OFFSET..ALTITUDE_OFFSET + 4].copy_from_slice(&fix.altitude.to_be_bytes());
    bytes[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + 8].copy_from_slice(&fix.sent_at.to_be_bytes());
    RawFrame::new(bytes)
}

fn read_f32_be(bytes: &[u8; FRAME_SIZE], offset: usize) -> f32 {
    let mut field = [0u8; 4];
    field.copy_from_slice(&bytes[offset..offset + 4]);
    f32::from_be_bytes(field)
}

fn read_f64_be(bytes: &[u8; FRAME_SIZE], offset: usize) -> f64 {
    let mut field = [0u8; 8];
    field.copy_from_slice(&bytes[offset..offset + 8]);
    f64::from_be_bytes(field)
}
