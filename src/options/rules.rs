//! Compatibility rules between command-line flags.
//!
//! Rules are plain values evaluated in table order. The first rule that
//! fires decides the error, so the message always names the exact pair of
//! flags (or the missing dependency) rather than a generic complaint.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::{absolute_path, RawArguments, ValidatedArguments};
use crate::error::OptionsError;

static CVE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CVE-[0-9]{4}-[0-9]{4,}$").expect("valid CVE regex"));

/// A command-line flag that takes part in a compatibility rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    Csv,
    Cve,
    Json,
    Manifest,
    Nagios,
    ShowLinks,
    Db,
    Priority,
    Silent,
    Unresolved,
    Verbose,
}

impl Flag {
    /// Label used in error messages, listing the short and long spellings.
    pub fn label(&self) -> &'static str {
        match self {
            Flag::Csv => "--csv",
            Flag::Cve => "-c|--cve",
            Flag::Json => "--JSON",
            Flag::Manifest => "-m|--manifest",
            Flag::Nagios => "-n|--nagios",
            Flag::ShowLinks => "--show-links",
            Flag::Db => "--db",
            Flag::Priority => "-p|--priority",
            Flag::Silent => "-s|--silent",
            Flag::Unresolved => "--unresolved",
            Flag::Verbose => "-v|--verbose",
        }
    }

    /// Returns true if the user supplied this flag.
    pub fn is_set(&self, args: &RawArguments) -> bool {
        match self {
            Flag::Csv => args.csv,
            Flag::Cve => args.cve.is_some(),
            Flag::Manifest => args.manifest.is_some(),
            Flag::Json => args.json,
            Flag::Nagios => args.nagios,
            Flag::ShowLinks => args.show_links,
            Flag::Db => args.db.is_some(),
            Flag::Priority => args.priority.is_some(),
            Flag::Silent => args.silent,
            Flag::Unresolved => args.unresolved,
            Flag::Verbose => args.verbose,
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single validation rule.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// A CVE identifier, if given, must look like `CVE-YYYY-NNNN...`.
    WellFormedCve,
    /// If `flag` is set, `dependency` must be set too.
    Requires { flag: Flag, dependency: Flag },
    /// If `flag` is set, none of `conflicts` may be set.
    Excludes { flag: Flag, conflicts: &'static [Flag] },
    /// A path given for `flag` must name an existing, readable file.
    ExistingFile { flag: Flag },
}

/// Canonical evaluation order.
pub const RULES: &[Rule] = &[
    Rule::WellFormedCve,
    Rule::Excludes {
        flag: Flag::Nagios,
        conflicts: &[Flag::Cve, Flag::Silent, Flag::Unresolved, Flag::ShowLinks],
    },
    Rule::Requires {
        flag: Flag::Silent,
        dependency: Flag::Cve,
    },
    Rule::Excludes {
        flag: Flag::Silent,
        conflicts: &[Flag::Verbose, Flag::ShowLinks],
    },
    Rule::Excludes {
        flag: Flag::Unresolved,
        conflicts: &[Flag::Cve, Flag::Nagios],
    },
    Rule::Excludes {
        flag: Flag::Csv,
        conflicts: &[Flag::Silent, Flag::Cve, Flag::Json, Flag::Nagios],
    },
    Rule::Excludes {
        flag: Flag::Cve,
        conflicts: &[Flag::Json, Flag::Priority, Flag::ShowLinks],
    },
    Rule::Excludes {
        flag: Flag::Json,
        conflicts: &[Flag::Nagios],
    },
    Rule::ExistingFile {
        flag: Flag::Manifest,
    },
    Rule::ExistingFile { flag: Flag::Db },
];

impl Rule {
    /// Checks this rule against `args`.
    pub fn check(&self, args: &RawArguments) -> Result<(), OptionsError> {
        match *self {
            Rule::WellFormedCve => match &args.cve {
                Some(cve) if !CVE_ID.is_match(cve) => Err(OptionsError::InvalidCve(cve.clone())),
                _ => Ok(()),
            },
            Rule::Requires { flag, dependency } => {
                if flag.is_set(args) && !dependency.is_set(args) {
                    Err(OptionsError::MissingDependency {
                        flag,
                        requires: dependency,
                    })
                } else {
                    Ok(())
                }
            }
            Rule::Excludes { flag, conflicts } => {
                if !flag.is_set(args) {
                    return Ok(());
                }
                match conflicts.iter().find(|other| other.is_set(args)) {
                    Some(&second) => Err(OptionsError::Incompatible {
                        first: flag,
                        second,
                    }),
                    None => Ok(()),
                }
            }
            Rule::ExistingFile { flag } => {
                let path = match flag {
                    Flag::Manifest => args.manifest.as_deref(),
                    Flag::Db => args.db.as_deref(),
                    _ => None,
                };
                match path {
                    Some(path) => require_file(path),
                    None => Ok(()),
                }
            }
        }
    }
}

/// Runs every rule in [`RULES`] and returns the first failure.
///
/// On success the arguments are wrapped so they can be normalized.
pub fn validate(args: RawArguments) -> Result<ValidatedArguments, OptionsError> {
    RULES.iter().try_for_each(|rule| rule.check(&args))?;
    Ok(ValidatedArguments(args))
}

fn require_file(path: &Path) -> Result<(), OptionsError> {
    let cwd = std::env::current_dir().unwrap_or_default();
    let absolute = absolute_path(path);

    let readable = absolute.is_file() && std::fs::File::open(&absolute).is_ok();
    if readable {
        Ok(())
    } else {
        Err(OptionsError::MissingFile {
            path: absolute,
            cwd,
        })
    }
}
