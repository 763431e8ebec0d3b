//! Command-line options: raw arguments, validation and normalization.
//!
//! [`RawArguments`] is whatever the user typed. It is checked against
//! [`rules::RULES`] by [`validate`], which yields a [`ValidatedArguments`]
//! token; only that token can be turned into [`Options`] by [`normalize`].
//!
//! # Example
//!
//! ```
//! use cvescan::options::{Options, RawArguments};
//! use cvescan::model::Priority;
//!
//! let options = Options::new(RawArguments::default()).unwrap();
//! assert_eq!(options.priority, Priority::High);
//! assert!(options.download_db);
//! ```

pub mod rules;

pub use rules::{validate, Flag, Rule, RULES};

use serde::Serialize;
use std::path::{Component, Path, PathBuf};

use crate::error::OptionsError;
use crate::model::{OutputMode, Priority};

/// File name used for the database when it is downloaded automatically.
pub const DEFAULT_DB_FILE: &str = "uct.json";

/// Arguments as parsed from the command line, before any checks.
#[derive(Debug, Clone, Default)]
pub struct RawArguments {
    pub cve: Option<String>,
    pub priority: Option<Priority>,
    pub silent: bool,
    pub manifest: Option<PathBuf>,
    pub nagios: bool,
    pub show_links: bool,
    pub csv: bool,
    pub json: bool,
    pub db: Option<PathBuf>,
    pub unresolved: bool,
    pub verbose: bool,
    pub experimental: bool,
}

/// Arguments that passed every rule in [`RULES`].
#[derive(Debug, Clone)]
pub struct ValidatedArguments(RawArguments);

/// Canonical, validated configuration for a scan.
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub struct Options {
    pub manifest_mode: bool,
    pub nagios_mode: bool,
    pub experimental_mode: bool,
    pub output: OutputMode,
    pub priority: Priority,
    /// Absolute path of the manifest to scan; `None` scans this host.
    pub manifest_file: Option<PathBuf>,
    /// User-supplied database path, or [`DEFAULT_DB_FILE`].
    pub db_file: PathBuf,
    /// Whether the database must be downloaded before scanning.
    pub download_db: bool,
    pub cve: Option<String>,
    pub unresolved: bool,
    pub show_links: bool,
    pub silent: bool,
    pub verbose: bool,
}

impl Options {
    /// Validates `args` and normalizes them.
    ///
    /// # Errors
    ///
    /// Returns the first rule violation, in [`RULES`] order.
    pub fn new(args: RawArguments) -> Result<Self, OptionsError> {
        validate(args).map(normalize)
    }

    /// True when nothing but the process exit code should be produced.
    pub fn is_quiet(&self) -> bool {
        self.silent
    }
}

/// Turns validated arguments into [`Options`].
pub fn normalize(args: ValidatedArguments) -> Options {
    let args = args.0;

    let (db_file, download_db) = match args.db {
        Some(db) => (db, false),
        None => (PathBuf::from(DEFAULT_DB_FILE), true),
    };

    let manifest_file = args.manifest.as_deref().map(absolute_path);

    let output = if args.csv {
        OutputMode::Csv
    } else if args.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    Options {
        manifest_mode: manifest_file.is_some(),
        nagios_mode: args.nagios,
        experimental_mode: args.experimental,
        output,
        priority: args.priority.unwrap_or_default(),
        manifest_file,
        db_file,
        download_db,
        cve: args.cve,
        unresolved: args.unresolved,
        show_links: args.show_links,
        silent: args.silent,
        verbose: args.verbose,
    }
}

/// Makes `path` absolute against the working directory and folds `.` and
/// `..` lexically. Symlinks are not resolved.
pub(crate) fn absolute_path(path: &Path) -> PathBuf {
    let joined = std::path::absolute(path)
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_default().join(path));

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
