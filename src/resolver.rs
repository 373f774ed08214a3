//! # Shared Library Resolution
//!
//! Locates the platform build of the OTPS2 library on disk. Only the filename
//! differs per platform:
//!
//! | platform | candidates                        |
//! |----------|-----------------------------------|
//! | Windows  | `otps2_.dll`, `libotps2_.dll`     |
//! | macOS    | `libotps2_.dylib`                 |
//! | other    | `libotps2_.so`                    |
//!
//! The primary directory is probed first (by default the directory holding the
//! running executable), then every search path entry in order. The first
//! existing file wins. Nothing is cached here; the process-wide handle in
//! [`crate::native`] resolves once and keeps the result.

use crate::config::LibraryConfig;
use crate::error::{Otps2Error, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable holding extra search directories (platform path list)
pub const LIBRARY_PATH_ENV: &str = "OTPS2_LIBRARY_PATH";

/// Library filenames to probe on this platform, in preference order.
pub fn candidate_names() -> &'static [&'static str] {
    if cfg!(windows) {
        &["otps2_.dll", "libotps2_.dll"]
    } else if cfg!(target_os = "macos") {
        &["libotps2_.dylib"]
    } else {
        &["libotps2_.so"]
    }
}

/// First candidate present as a regular file in `dir`.
pub fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    candidate_names()
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Ordered description of where to look for the library.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LibraryResolver {
    /// Exact file to load, bypassing the directory search
    pub explicit: Option<PathBuf>,
    /// Directory probed before the search path
    pub primary: Option<PathBuf>,
    /// Directories probed in order after `primary`
    pub search_path: Vec<PathBuf>,
}

impl LibraryResolver {
    pub fn new(primary: impl Into<PathBuf>) -> Self {
        Self {
            primary: Some(primary.into()),
            ..Self::default()
        }
    }

    pub fn with_search_path<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_path.extend(dirs.into_iter().map(Into::into));
        self
    }

    pub fn with_explicit_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    /// Executable directory first, then `OTPS2_LIBRARY_PATH`, then the
    /// working directory.
    pub fn from_env() -> Self {
        Self {
            explicit: None,
            primary: executable_dir(),
            search_path: env_search_path(),
        }
    }

    /// Config entries take precedence over the environment defaults.
    pub fn from_config(config: &LibraryConfig) -> Self {
        let mut search_path = config.search_path.clone();
        search_path.extend(env_search_path());

        Self {
            explicit: config.path.clone(),
            primary: config.directory.clone().or_else(executable_dir),
            search_path,
        }
    }

    /// Find the library file.
    pub fn resolve(&self) -> Result<PathBuf> {
        if let Some(path) = &self.explicit {
            debug!(path = %path.display(), "probing explicit OTPS2 library path");
            if path.is_file() {
                return Ok(path.clone());
            }
            return Err(Otps2Error::LibraryNotFound {
                candidates: vec![path.display().to_string()],
            });
        }

        for dir in self.primary.iter().chain(self.search_path.iter()) {
            debug!(dir = %dir.display(), "searching for OTPS2 library");
            if let Some(path) = find_in_dir(dir) {
                debug!(path = %path.display(), "found OTPS2 library");
                return Ok(path);
            }
        }

        Err(Otps2Error::LibraryNotFound {
            candidates: candidate_names().iter().map(|s| s.to_string()).collect(),
        })
    }
}

fn executable_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

fn env_search_path() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = env::var_os(LIBRARY_PATH_ENV)
        .map(|value| env::split_paths(&value).collect())
        .unwrap_or_default();
    if let Ok(cwd) = env::current_dir() {
        dirs.push(cwd);
    }
    dirs
}
