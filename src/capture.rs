//! Capture timestamps: FF file names, Julian dates, and sidereal time.
//!
//! FF files encode the UTC start of the block in their name:
//!
//! ```text
//! FF_XX0001_20240812_213015_123_0012288.fits   (station, date, time, ms, frame)
//! FF499_20170626_020520_353_0005120.bin        (legacy layout)
//! ```
//!
//! The exposure is represented by the middle of the block.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};

use crate::config::CaptureConfig;
use crate::error::{OverlayError, Result};

/// Julian date of the Unix epoch.
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;
/// Julian date of J2000.0.
pub const J2000_JD: f64 = 2_451_545.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Julian date (UTC) of one exposure.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct CaptureMoment(f64);

impl CaptureMoment {
    /// Wrap a Julian date; it must be finite and positive.
    pub fn new(jd: f64) -> Result<Self> {
        if !jd.is_finite() || jd <= 0.0 {
            return Err(OverlayError::InvalidParameter(format!(
                "capture Julian date must be finite and positive, got {}",
                jd
            )));
        }
        Ok(Self(jd))
    }

    pub fn from_datetime(dt: &DateTime<Utc>) -> Self {
        Self(datetime_to_jd(dt))
    }

    /// Middle of the FF block named by `ff_name`.
    pub fn from_ff_name(ff_name: &str, config: &CaptureConfig) -> Result<Self> {
        config.validate()?;
        let mid = ff_middle_time(ff_name, config.fps, config.frames_per_block)?;
        Ok(Self::from_datetime(&mid))
    }

    pub fn jd(&self) -> f64 {
        self.0
    }
}

/// Convert a UTC timestamp to a Julian date.
pub fn datetime_to_jd(dt: &DateTime<Utc>) -> f64 {
    dt.timestamp_micros() as f64 / 1e6 / SECONDS_PER_DAY + UNIX_EPOCH_JD
}

/// Start time encoded in an FF file name.
pub fn ff_name_datetime(ff_name: &str) -> Result<DateTime<Utc>> {
    let invalid = || {
        OverlayError::InvalidParameter(format!(
            "'{}' is not an FF file name with a YYYYMMDD_hhmmss timestamp",
            ff_name
        ))
    };

    let stem = Path::new(ff_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(invalid)?;
    let parts: Vec<&str> = stem.split('_').collect();
    let is_digits = |s: &str, n: usize| s.len() == n && s.bytes().all(|b| b.is_ascii_digit());

    let i = parts
        .windows(2)
        .position(|w| is_digits(w[0], 8) && is_digits(w[1], 6))
        .ok_or_else(invalid)?;

    let date = NaiveDate::parse_from_str(parts[i], "%Y%m%d").map_err(|_| invalid())?;
    let time = NaiveTime::parse_from_str(parts[i + 1], "%H%M%S").map_err(|_| invalid())?;
    let millis: i64 = match parts.get(i + 2) {
        Some(ms) if is_digits(*ms, 3) => ms.parse().map_err(|_| invalid())?,
        _ => 0,
    };

    Ok(date.and_time(time).and_utc() + TimeDelta::milliseconds(millis))
}

/// Middle time of an FF block: start plus half the block duration.
pub fn ff_middle_time(ff_name: &str, fps: f64, frames_per_block: u32) -> Result<DateTime<Utc>> {
    let start = ff_name_datetime(ff_name)?;
    let half_block_s = frames_per_block as f64 / 2.0 / fps;
    Ok(start + TimeDelta::microseconds((half_block_s * 1e6).round() as i64))
}

/// Greenwich mean sidereal time in degrees, `[0, 360)`.
///
/// Meeus, *Astronomical Algorithms*, eq. 12.4.
pub fn gmst_deg(jd: f64) -> f64 {
    let d = jd - J2000_JD;
    let t = d / 36525.0;
    let theta = 280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;
    theta.rem_euclid(360.0)
}
