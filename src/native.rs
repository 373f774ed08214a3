//! # Native OTPS2 Library
//!
//! Opens the OTPS2 shared library with `libloading` and forwards prediction
//! buffers to its two C entry points:
//!
//! ```c
//! void predict_tide(int ncon, const char cid[][4], const double *z1Re,
//!                   const double *z1Im, double latitude, int ntime,
//!                   const double *times, double *result);
//! void predict_tide_2d(int n, int ncon, const char cid[][4],
//!                      const double *z1Re, const double *z1Im,
//!                      const double *latitude, int ntime,
//!                      const double *times, double *result);
//! ```
//!
//! ## Process-wide handle
//!
//! [`Otps2Library::global`] resolves and opens the library the first time it
//! is called and keeps it for the rest of the process. It is never unloaded.
//! When no library file can be found, or the file cannot be loaded, the
//! process prints a diagnostic and exits:
//!
//! | condition            | exit status                       |
//! |----------------------|-----------------------------------|
//! | library not found    | [`EXIT_LIBRARY_NOT_FOUND`] (1)    |
//! | load or symbol error | [`EXIT_LIBRARY_LOAD`] (2)         |
//!
//! Hosts that want to handle those failures themselves call
//! [`Otps2Library::load`] and [`Otps2Library::init_global`] instead.
//!
//! No locking is done around native calls.

use crate::config::Config;
use crate::error::{Otps2Error, Result};
use crate::kernel::{self, TideKernel};
use crate::resolver::LibraryResolver;
use crate::ConstituentId;
use libloading::Library;
use ndarray::{ArrayView2, ArrayViewMut2};
use std::os::raw::{c_char, c_double, c_int};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Exit status when no library file is found
pub const EXIT_LIBRARY_NOT_FOUND: i32 = 1;

/// Exit status when the library file cannot be loaded
pub const EXIT_LIBRARY_LOAD: i32 = 2;

const PREDICT_TIDE: &str = "predict_tide";
const PREDICT_TIDE_2D: &str = "predict_tide_2d";

type PredictTideFn = unsafe extern "C" fn(
    ncon: c_int,
    cid: *const c_char,
    z1_re: *const c_double,
    z1_im: *const c_double,
    latitude: c_double,
    ntime: c_int,
    times: *const c_double,
    result: *mut c_double,
);

type PredictTide2dFn = unsafe extern "C" fn(
    n: c_int,
    ncon: c_int,
    cid: *const c_char,
    z1_re: *const c_double,
    z1_im: *const c_double,
    latitude: *const c_double,
    ntime: c_int,
    times: *const c_double,
    result: *mut c_double,
);

static GLOBAL: OnceLock<Otps2Library> = OnceLock::new();

/// A loaded OTPS2 shared library and its two entry points.
#[derive(Debug)]
pub struct Otps2Library {
    predict_tide: PredictTideFn,
    predict_tide_2d: PredictTide2dFn,
    path: PathBuf,
    // Keeps the function pointers above valid
    _library: Library,
}

impl Otps2Library {
    /// Open the library at `path` and resolve both entry points.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        info!(path = %path.display(), "loading OTPS2 library");

        // SAFETY: opening runs the library's initialisers. The OTPS2 build
        // exports plain numeric routines with no load-time side effects.
        let library = unsafe { Library::new(&path) }.map_err(|source| Otps2Error::LibraryLoad {
            path: path.clone(),
            source,
        })?;

        // SAFETY: the declared types match the exported C signatures above.
        let predict_tide = unsafe { symbol::<PredictTideFn>(&library, &path, PREDICT_TIDE)? };
        let predict_tide_2d =
            unsafe { symbol::<PredictTide2dFn>(&library, &path, PREDICT_TIDE_2D)? };

        Ok(Self {
            predict_tide,
            predict_tide_2d,
            path,
            _library: library,
        })
    }

    /// Resolve the library file, then load it.
    pub fn locate_and_load(resolver: &LibraryResolver) -> Result<Self> {
        Self::load(resolver.resolve()?)
    }

    /// File the library was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The process-wide library, loaded on first use.
    ///
    /// Search locations come from `otps2.toml` (see [`crate::config`]) and the
    /// `OTPS2_LIBRARY_PATH` environment variable. Exits the process if the
    /// library cannot be found or loaded.
    pub fn global() -> &'static Otps2Library {
        GLOBAL.get_or_init(|| {
            let resolver = LibraryResolver::from_config(&Config::load().library);
            Self::load_or_exit(&resolver)
        })
    }

    /// The process-wide library if it has been loaded.
    pub fn try_global() -> Option<&'static Otps2Library> {
        GLOBAL.get()
    }

    /// Install `library` as the process-wide handle.
    ///
    /// Fails if a handle is already installed; the existing one is kept.
    pub fn init_global(library: Otps2Library) -> Result<&'static Otps2Library> {
        let mut installed = false;
        let global = GLOBAL.get_or_init(|| {
            installed = true;
            library
        });
        if !installed {
            return Err(Otps2Error::AlreadyInitialized(global.path.clone()));
        }
        Ok(global)
    }

    fn load_or_exit(resolver: &LibraryResolver) -> Self {
        let path = match resolver.resolve() {
            Ok(path) => path,
            Err(e) => {
                eprintln!("{e}.");
                std::process::exit(EXIT_LIBRARY_NOT_FOUND);
            }
        };
        match Self::load(&path) {
            Ok(library) => library,
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(EXIT_LIBRARY_LOAD);
            }
        }
    }
}

/// Copy a function pointer out of `library`.
///
/// # Safety
/// `T` must be the exact function pointer type of the exported symbol, and the
/// returned pointer must not outlive `library`.
unsafe fn symbol<T: Copy>(library: &Library, path: &Path, name: &'static str) -> Result<T> {
    let symbol = library
        .get::<T>(name.as_bytes())
        .map_err(|source| Otps2Error::MissingSymbol {
            path: path.to_path_buf(),
            symbol: name,
            source,
        })?;
    Ok(*symbol)
}

impl TideKernel for Otps2Library {
    fn predict_tide(
        &self,
        cid: &[ConstituentId],
        z1_re: &[f64],
        z1_im: &[f64],
        latitude: f64,
        times: &[f64],
        result: &mut [f64],
    ) -> Result<()> {
        let dims = kernel::scalar_dims(cid, z1_re, z1_im, times, result)?;
        debug!(ncon = dims.ncon, ntime = dims.ntime, latitude, "calling predict_tide");

        // SAFETY: `scalar_dims` checked every buffer length against the counts
        // passed here. `ConstituentId` is a transparent `[u8; 4]`, so `cid` is a
        // contiguous `char[ncon][4]`.
        unsafe {
            (self.predict_tide)(
                dims.ncon,
                cid.as_ptr().cast::<c_char>(),
                z1_re.as_ptr(),
                z1_im.as_ptr(),
                latitude,
                dims.ntime,
                times.as_ptr(),
                result.as_mut_ptr(),
            );
        }
        Ok(())
    }

    fn predict_tide_2d(
        &self,
        cid: &[ConstituentId],
        z1_re: ArrayView2<'_, f64>,
        z1_im: ArrayView2<'_, f64>,
        latitude: &[f64],
        times: &[f64],
        mut result: ArrayViewMut2<'_, f64>,
    ) -> Result<()> {
        let dims = kernel::grid_dims(cid, &z1_re, &z1_im, latitude, times, &result)?;
        debug!(
            n = dims.n,
            ncon = dims.ncon,
            ntime = dims.ntime,
            "calling predict_tide_2d"
        );

        // SAFETY: `grid_dims` checked shapes against the counts passed here and
        // that every two-dimensional view is contiguous and row-major.
        unsafe {
            (self.predict_tide_2d)(
                dims.n,
                dims.ncon,
                cid.as_ptr().cast::<c_char>(),
                z1_re.as_ptr(),
                z1_im.as_ptr(),
                latitude.as_ptr(),
                dims.ntime,
                times.as_ptr(),
                result.as_mut_ptr(),
            );
        }
        Ok(())
    }
}
