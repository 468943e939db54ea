//! APRS degrees and decimal minutes, as used in uncompressed position
//! reports (`DDMM.mmN`, `DDDMM.mmW`).

use crate::error::{Ax25Error, Result};

/// Format a latitude in decimal degrees as `DDMM.mm` plus `N` or `S`.
///
/// ```
/// assert_eq!(aprskiss_ax25::format_latitude(37.7418096).unwrap(), "3744.51N");
/// ```
pub fn format_latitude(degrees: f64) -> Result<String> {
    format_coordinate(degrees, 90.0, 2, 'N', 'S')
}

/// Format a longitude in decimal degrees as `DDDMM.mm` plus `E` or `W`.
///
/// ```
/// assert_eq!(aprskiss_ax25::format_longitude(-122.38833).unwrap(), "12223.30W");
/// ```
pub fn format_longitude(degrees: f64) -> Result<String> {
    format_coordinate(degrees, 180.0, 3, 'E', 'W')
}

fn format_coordinate(
    value: f64,
    max: f64,
    width: usize,
    positive: char,
    negative: char,
) -> Result<String> {
    if !value.is_finite() || value.abs() > max {
        return Err(Ax25Error::CoordinateOutOfRange { value, max });
    }

    // Round once, in hundredths of a minute, so 59.999' carries into the degree.
    let hundredths = (value.abs() * 6000.0).round() as u64;
    let whole_degrees = hundredths / 6000;
    let minutes = hundredths % 6000;
    let hemisphere = if value < 0.0 { negative } else { positive };

    Ok(format!(
        "{whole_degrees:0width$}{:02}.{:02}{hemisphere}",
        minutes / 100,
        minutes % 100
    ))
}
