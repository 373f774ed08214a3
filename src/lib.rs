//! # OTPS2 Binding Library
//!
//! Runtime bindings to the OTPS2 harmonic tide prediction library. The tidal
//! synthesis itself lives in a precompiled shared library (`libotps2_.so`,
//! `libotps2_.dylib` or `otps2_.dll`); this crate owns only the call boundary.
//!
//! ## Design Philosophy
//!
//! ### Thin, fail-fast boundary
//! - **Validate before crossing**: identifier widths, coefficient grid shapes,
//!   time grid parameters and `i32` counts are all checked in safe Rust
//! - **Trusted callee**: once the buffers are handed over, the native routine
//!   is assumed to fill the output completely; it reports no errors
//! - **Loaded once**: the shared library is opened at most once per process and
//!   never unloaded (see [`native::Otps2Library::global`])
//!
//! ### Buffer Layout
//! Every buffer handed to the native side is contiguous and row-major:
//! - identifiers: `char[ncon][4]`, space padded
//! - coefficients: `float64[ncon]` (1-D) or `float64[ncon][n]` (2-D)
//! - times: `float64[ntime]`, days since 1858-11-17
//! - result: `float64[ntime]` or `float64[ntime][n]`
//!
//! ### Data Flow
//! 1. **Resolve**: find the platform library file ([`resolver`])
//! 2. **Marshal**: constituents and time grid become flat buffers
//!    ([`constituents`], [`time_grid`])
//! 3. **Call**: a [`kernel::TideKernel`] fills the result buffer
//! 4. **Shape**: the result comes back as an `ndarray` array ([`predict`])
//!
//! ## Core Types
//!
//! - [`ConstituentId`]: a 4-byte, space padded harmonic constituent name
//! - [`Coefficient`]: the complex coefficient of one constituent at one location
//!
//! # Example
//! ```no_run
//! use chrono::NaiveDate;
//! use otps2_lib::{Coefficient, ConstituentSet};
//!
//! let mut components = ConstituentSet::new();
//! components.insert_named("M2", Coefficient::new(1.0, 0.0))?;
//!
//! let start = NaiveDate::from_ymd_opt(2020, 1, 1)
//!     .and_then(|d| d.and_hms_opt(0, 0, 0))
//!     .unwrap();
//! let heights = otps2_lib::predict_tide(&components, 45.0, start, 24, 3600.0)?;
//! assert_eq!(heights.len(), 24);
//! # Ok::<(), otps2_lib::Otps2Error>(())
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Module declarations
pub mod config;
pub mod constituents;
pub mod error;
pub mod kernel;
pub mod native;
pub mod predict;
pub mod renderer;
pub mod resolver;
pub mod time_grid;

#[cfg(test)]
mod tests;

pub use constituents::{ConstituentSet, GridCoefficient};
pub use error::{Otps2Error, Result};
pub use kernel::TideKernel;
pub use native::Otps2Library;
pub use predict::{predict_tide, predict_tide_2d, predict_tide_2d_with, predict_tide_with};
pub use time_grid::{TimeGrid, REFERENCE_EPOCH};

/// A harmonic constituent name as the native library sees it: exactly four
/// bytes, left aligned and padded with ASCII spaces.
///
/// Names must be 1 to 4 printable ASCII characters without whitespace. Longer
/// names are rejected rather than truncated, so `"MSQM"` and `"MSQM2"` can
/// never silently collide.
///
/// `#[repr(transparent)]` makes a `&[ConstituentId]` laid out exactly like the
/// `char[ncon][4]` array the native entry points expect.
///
/// # Example
/// ```
/// use otps2_lib::ConstituentId;
///
/// let m2: ConstituentId = "M2".parse().unwrap();
/// assert_eq!(m2.as_bytes(), b"M2  ");
/// assert_eq!(m2.name(), "M2");
///
/// assert!("SIGMA1".parse::<ConstituentId>().is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[repr(transparent)]
pub struct ConstituentId([u8; ConstituentId::WIDTH]);

impl ConstituentId {
    /// Fixed identifier width in bytes
    pub const WIDTH: usize = 4;

    /// Fill byte for names shorter than [`Self::WIDTH`]
    pub const PAD: u8 = b' ';

    /// Build an identifier from a constituent name, padding with spaces.
    pub fn new(name: &str) -> Result<Self> {
        let invalid = |reason: &'static str| Otps2Error::InvalidConstituentId {
            name: name.to_string(),
            reason,
        };

        if name.is_empty() {
            return Err(invalid("name is empty"));
        }
        if !name.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(invalid("name must be printable ASCII without whitespace"));
        }
        if name.len() > Self::WIDTH {
            return Err(invalid("name is longer than 4 bytes"));
        }

        let mut bytes = [Self::PAD; Self::WIDTH];
        bytes[..name.len()].copy_from_slice(name.as_bytes());
        Ok(Self(bytes))
    }

    /// Raw padded bytes, as passed to the native library
    pub fn as_bytes(&self) -> &[u8; Self::WIDTH] {
        &self.0
    }

    /// Constituent name without padding
    pub fn name(&self) -> &str {
        // Only printable ASCII and padding are ever stored
        std::str::from_utf8(&self.0)
            .unwrap_or_default()
            .trim_end_matches(Self::PAD as char)
    }
}

impl FromStr for ConstituentId {
    type Err = Otps2Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ConstituentId {
    type Error = Otps2Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<ConstituentId> for String {
    fn from(id: ConstituentId) -> Self {
        id.name().to_string()
    }
}

impl fmt::Display for ConstituentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for ConstituentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConstituentId({:?})", self.name())
    }
}

/// Complex harmonic coefficient of one constituent at one location.
///
/// OTPS stores elevation constituents as `z = amplitude * exp(-i * phase)`,
/// so `re = A cos(phase)` and `im = -A sin(phase)`.
///
/// # Example
/// ```
/// use otps2_lib::Coefficient;
///
/// let z = Coefficient::from_amplitude_phase(2.0, 90.0);
/// assert!(z.re.abs() < 1e-12);
/// assert!((z.im + 2.0).abs() < 1e-12);
/// assert!((z.phase_degrees() - 90.0).abs() < 1e-9);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Coefficient {
    /// Real part
    pub re: f64,
    /// Imaginary part
    pub im: f64,
}

impl Coefficient {
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Build from amplitude and Greenwich phase lag in degrees.
    pub fn from_amplitude_phase(amplitude: f64, phase_deg: f64) -> Self {
        let phase = phase_deg.to_radians();
        Self {
            re: amplitude * phase.cos(),
            im: -amplitude * phase.sin(),
        }
    }

    pub fn amplitude(&self) -> f64 {
        self.re.hypot(self.im)
    }

    /// Phase lag in degrees, normalised to `[0, 360)`.
    pub fn phase_degrees(&self) -> f64 {
        (-self.im).atan2(self.re).to_degrees().rem_euclid(360.0)
    }
}

impl From<(f64, f64)> for Coefficient {
    fn from((re, im): (f64, f64)) -> Self {
        Self { re, im }
    }
}
