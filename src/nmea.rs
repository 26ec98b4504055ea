//! NMEA 0183 position sentences
//!
//! Turns `$GPGGA` and `$GPRMC` sentences from a serial GPS module into decimal
//! degree positions for the sender side. Coordinates arrive as `DDMM.MMMM`
//! (latitude) and `DDDMM.MMMM` (longitude) with a hemisphere letter.
//! Altitude is not taken from the sentence; callers supply it.

use crate::types::Fix;
use crate::{ReceiverError, Result};

/// Position parsed from one sentence, rounded to six decimal places.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl Position {
    /// Stamp the position with a send time, producing a wire-ready fix.
    pub fn into_fix(self, sent_at: f64) -> Fix {
        Fix {
            latitude: self.latitude as f32,
            longitude: self.longitude as f32,
            altitude: self.altitude as f32,
            sent_at,
        }
    }
}

/// Parse a `$GPGGA` or `$GPRMC` sentence.
pub fn parse_sentence(sentence: &str, default_altitude: f64) -> Result<Position> {
    let sentence = sentence.trim();
    let fields: Vec<&str> = sentence.split(',').collect();

    // index of the latitude field; longitude follows two fields later
    let lat_index = if sentence.starts_with("$GPGGA") {
        2
    } else if sentence.starts_with("$GPRMC") {
        3
    } else {
        let kind = fields.first().copied().unwrap_or_default();
        return Err(ReceiverError::parse_error(
            "NMEA sentence",
            format!("unsupported type '{kind}'"),
        ));
    };

    let field = |index: usize| -> Result<&str> {
        fields.get(index).copied().ok_or_else(|| {
            ReceiverError::parse_error("NMEA sentence", format!("missing field {index}"))
        })
    };

    let latitude = parse_degrees(field(lat_index)?, 2)?;
    let latitude = signed(latitude, field(lat_index + 1)?, ('N', 'S'))?;
    let longitude = parse_degrees(field(lat_index + 2)?, 3)?;
    let longitude = signed(longitude, field(lat_index + 3)?, ('E', 'W'))?;

    Ok(Position {
        latitude: round6(latitude),
        longitude: round6(longitude),
        altitude: default_altitude,
    })
}

fn parse_degrees(value: &str, degree_digits: usize) -> Result<f64> {
    let invalid =
        || ReceiverError::parse_error("NMEA coordinate", format!("invalid value '{value}'"));

    let degrees = value.get(..degree_digits).ok_or_else(invalid)?;
    let minutes = value.get(degree_digits..).ok_or_else(invalid)?;
    let degrees: f64 = degrees.parse().map_err(|_| invalid())?;
    let minutes: f64 = minutes.parse().map_err(|_| invalid())?;
    Ok(degrees + minutes / 60.0)
}

fn signed(value: f64, hemisphere: &str, (positive, negative): (char, char)) -> Result<f64> {
    match hemisphere.chars().next() {
        Some(c) if c == positive => Ok(value),
        Some(c) if c == negative => Ok(-value),
        _ => Err(ReceiverError::parse_error(
            "NMEA hemisphere",
            format!("unexpected indicator '{hemisphere}'"),
        )),
    }
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}
