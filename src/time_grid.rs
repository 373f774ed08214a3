//! # Prediction Time Grid
//!
//! The native library takes times as fractional days since the modified Julian
//! day epoch, 1858-11-17T00:00:00. A prediction always samples an evenly spaced
//! grid: `ntime` samples, `delta_time` seconds apart, starting at `start_time`.
//!
//! Sample `i` is computed as
//! ```text
//! (delta_time * i + seconds(start_time - epoch)) / 86400
//! ```
//! in that order, so every sample carries the same rounding as the others.

use crate::error::{Otps2Error, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Modified Julian day epoch as `(year, month, day)`.
pub const REFERENCE_EPOCH: (i32, u32, u32) = (1858, 11, 17);

/// Seconds in one day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// The modified Julian day epoch as a timestamp.
pub fn reference_epoch() -> NaiveDateTime {
    let (y, m, d) = REFERENCE_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Seconds elapsed from the epoch to `time`, with microsecond resolution.
pub fn seconds_since_epoch(time: NaiveDateTime) -> Result<f64> {
    let micros = (time - reference_epoch()).num_microseconds().ok_or_else(|| {
        Otps2Error::InvalidTimeGrid(format!("{time} is too far from the 1858-11-17 epoch"))
    })?;
    Ok(micros as f64 / 1e6)
}

/// Fractional days elapsed from the epoch to `time` (the modified Julian day).
pub fn days_since_epoch(time: NaiveDateTime) -> Result<f64> {
    Ok(seconds_since_epoch(time)? / SECONDS_PER_DAY)
}

/// Evenly spaced prediction times.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use otps2_lib::TimeGrid;
///
/// let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let grid = TimeGrid::new(start, 3, 3600.0).unwrap();
/// let days = grid.days().unwrap();
///
/// assert_eq!(days.len(), 3);
/// assert_eq!(days[0], 58849.0);
/// assert!((days[1] - days[0] - 1.0 / 24.0).abs() < 1e-9);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeGrid")]
pub struct TimeGrid {
    start_time: NaiveDateTime,
    ntime: usize,
    delta_time: f64,
}

/// Unvalidated form read by serde, checked by [`TimeGrid::new`]
#[derive(Deserialize)]
struct RawTimeGrid {
    start_time: NaiveDateTime,
    ntime: usize,
    delta_time: f64,
}

impl TryFrom<RawTimeGrid> for TimeGrid {
    type Error = Otps2Error;

    fn try_from(raw: RawTimeGrid) -> Result<Self> {
        Self::new(raw.start_time, raw.ntime, raw.delta_time)
    }
}

/// Offset of sample `i` from the start, rounded to the nearest microsecond.
fn sample_offset(delta_time: f64, i: usize) -> Option<Duration> {
    let micros = (delta_time * i as f64 * 1e6).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(Duration::microseconds(micros as i64))
}

impl TimeGrid {
    /// Validate and build a grid.
    ///
    /// `ntime` must be positive and fit the native `int`; `delta_time` must be
    /// finite and strictly positive. Every sample, the last one included, must
    /// be a representable timestamp.
    pub fn new(start_time: NaiveDateTime, ntime: usize, delta_time: f64) -> Result<Self> {
        if ntime == 0 {
            return Err(Otps2Error::InvalidTimeGrid(
                "ntime must be at least 1".to_string(),
            ));
        }
        if i32::try_from(ntime).is_err() {
            return Err(Otps2Error::CountOverflow {
                what: "ntime",
                value: ntime,
            });
        }
        if !delta_time.is_finite() || delta_time <= 0.0 {
            return Err(Otps2Error::InvalidTimeGrid(format!(
                "delta_time must be a positive number of seconds, got {delta_time}"
            )));
        }
        seconds_since_epoch(start_time)?;

        let last = sample_offset(delta_time, ntime - 1)
            .and_then(|offset| start_time.checked_add_signed(offset))
            .ok_or_else(|| {
                Otps2Error::InvalidTimeGrid(format!(
                    "{ntime} samples {delta_time} s apart from {start_time} \
                     run past the last representable date"
                ))
            })?;
        seconds_since_epoch(last)?;

        Ok(Self {
            start_time,
            ntime,
            delta_time,
        })
    }

    /// First sample
    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    /// Number of samples
    pub fn ntime(&self) -> usize {
        self.ntime
    }

    /// Sample spacing in seconds
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Sample spacing in days
    pub fn step_days(&self) -> f64 {
        self.delta_time / SECONDS_PER_DAY
    }

    /// Build the `float64[ntime]` time buffer.
    pub fn days(&self) -> Result<Vec<f64>> {
        let offset = seconds_since_epoch(self.start_time)?;
        Ok((0..self.ntime)
            .map(|i| (self.delta_time * i as f64 + offset) / SECONDS_PER_DAY)
            .collect())
    }

    /// Timestamp of sample `i`, rounded to the nearest microsecond.
    ///
    /// `None` past the end of the grid.
    pub fn timestamp(&self, i: usize) -> Option<NaiveDateTime> {
        if i >= self.ntime {
            return None;
        }
        sample_offset(self.delta_time, i)
            .and_then(|offset| self.start_time.checked_add_signed(offset))
    }
}
