//! Error types for option validation, artifact fetching and manifest parsing.
//!
//! Each kind names the flags involved, the resolved path, or the URL that
//! failed. Underlying I/O and transfer errors stay in the `source` chain and
//! are printed with `{:#}` at the process boundary.

use std::path::PathBuf;
use thiserror::Error;

use crate::options::Flag;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Rejection of a set of command-line arguments.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("Invalid CVE ID ({0})")]
    InvalidCve(String),

    #[error("The {first} and {second} options are incompatible and may not be specified together.")]
    Incompatible { first: Flag, second: Flag },

    #[error("Cannot specify {flag} argument without {requires}.")]
    MissingDependency { flag: Flag, requires: Flag },

    #[error("Cannot find file \"{}\". Current working directory is \"{}\".", .path.display(), .cwd.display())]
    MissingFile { path: PathBuf, cwd: PathBuf },
}

impl OptionsError {
    /// Returns true if this is an incompatibility between `a` and `b`, in either order.
    pub fn is_incompatible(&self, a: Flag, b: Flag) -> bool {
        matches!(self, OptionsError::Incompatible { first, second }
            if (*first == a && *second == b) || (*first == b && *second == a))
    }
}

/// Failure to retrieve a remote artifact.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Downloading {url} failed")]
    Download {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("Decompressing {url} to {} failed", .target.display())]
    Decompress {
        url: String,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create cache directory {}", .path.display())]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub(crate) fn download(url: &str, source: impl Into<BoxError>) -> Self {
        FetchError::Download {
            url: url.to_string(),
            source: source.into(),
        }
    }
}

/// Failure to read a package manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Cannot read manifest {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed manifest line {line}: {content:?}")]
    Malformed { line: usize, content: String },
}
