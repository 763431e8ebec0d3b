//! Core data types shared by the options model, the scan plan and output.
//!
//! - [`Package`] - A package name/version pair taken from a manifest
//! - [`Severity`] - Ubuntu CVE Tracker priority of a single CVE
//! - [`Priority`] - The severity threshold requested on the command line
//! - [`OutputMode`] - How results are printed
//! - [`ExitStatus`] - Process exit codes shared with Nagios/NRPE
//!
//! # Example
//!
//! ```
//! use cvescan::model::{Priority, Severity};
//!
//! assert!(Priority::High.includes(Severity::Critical));
//! assert!(!Priority::High.includes(Severity::Medium));
//! ```

mod package;
mod vulnerability;

pub use package::*;
pub use vulnerability::*;
