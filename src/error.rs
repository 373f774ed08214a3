//! # Binding Errors
//!
//! Every failure the binding layer can detect on its own side of the call
//! boundary. Failures inside the native routine are not observable and have no
//! variant here.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving, loading or calling the OTPS2 library.
#[derive(Error, Debug)]
pub enum Otps2Error {
    /// No candidate library file exists in any searched directory
    #[error("unable to locate OTPS2 dynamic library {}", .candidates.join(" or "))]
    LibraryNotFound { candidates: Vec<String> },

    /// The file exists but the dynamic loader rejected it
    #[error("failed to load OTPS2 library {}: {source}", .path.display())]
    LibraryLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// The library loaded but does not export an expected entry point
    #[error("OTPS2 library {} has no symbol `{symbol}`: {source}", .path.display())]
    MissingSymbol {
        path: PathBuf,
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },

    /// The process-wide library handle was already set
    #[error("OTPS2 library already initialized from {}", .0.display())]
    AlreadyInitialized(PathBuf),

    /// Constituent name cannot be represented as a 4-byte identifier
    #[error("invalid constituent identifier {name:?}: {reason}")]
    InvalidConstituentId { name: String, reason: &'static str },

    /// 2-D coefficient grid shape differs from the latitude shape
    #[error("constituent {constituent}: {part} coefficients have shape {found:?}, latitude has shape {expected:?}")]
    ShapeMismatch {
        constituent: String,
        part: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// Start time, sample count or spacing cannot form a valid time grid
    #[error("invalid time grid: {0}")]
    InvalidTimeGrid(String),

    /// A count does not fit the native `int` argument
    #[error("{what} = {value} exceeds the native int range")]
    CountOverflow { what: &'static str, value: usize },

    /// Buffer lengths disagree with the counts handed to the native call
    #[error("{buffer} buffer has length {found}, expected {expected}")]
    BufferLength {
        buffer: &'static str,
        expected: usize,
        found: usize,
    },

    /// A multi-dimensional buffer is not contiguous in row-major order
    #[error("{0} buffer is not contiguous in row-major order")]
    NonContiguous(&'static str),

    /// Configuration file could not be read or parsed
    #[error("config: {0}")]
    Config(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Otps2Error> = std::result::Result<T, E>;
