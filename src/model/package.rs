use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

impl Package {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            arch: None,
        }
    }

    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = Some(arch.into());
        self
    }
}

impl std::fmt::Display for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.arch {
            Some(arch) => write!(f, "{}:{} {}", self.name, arch, self.version),
            None => write!(f, "{} {}", self.name, self.version),
        }
    }
}

/// How scan results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Text,
    Csv,
    Json,
}

/// Exit codes understood by Nagios/NRPE.
///
/// Silent mode uses the same codes for a single CVE lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Not vulnerable to any known CVE of the requested priority.
    Ok,
    /// Vulnerable, but no update is available yet.
    Warning,
    /// Vulnerable, and an update is available.
    Critical,
    /// Something went wrong.
    Unknown,
}

impl ExitStatus {
    pub fn code(&self) -> u8 {
        match self {
            ExitStatus::Ok => 0,
            ExitStatus::Warning => 1,
            ExitStatus::Critical => 2,
            ExitStatus::Unknown => 3,
        }
    }

    pub fn nagios_label(&self) -> &'static str {
        match self {
            ExitStatus::Ok => "OK",
            ExitStatus::Warning => "WARNING",
            ExitStatus::Critical => "CRITICAL",
            ExitStatus::Unknown => "UNKNOWN",
        }
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status.code())
    }
}
