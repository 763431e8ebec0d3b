pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod model;
pub mod options;
pub mod output;
pub mod plan;
pub mod platform;

pub use cache::CacheConfig;
pub use config::Config;
pub use error::{FetchError, ManifestError, OptionsError};
pub use fetch::{ContentHandler, Fetcher};
pub use model::{ExitStatus, OutputMode, Package, Priority, Severity};
pub use options::{Options, RawArguments};
pub use plan::{PackageSource, ScanPlan};
