use serde::{Deserialize, Serialize};

/// Priority assigned to a CVE by the Ubuntu CVE Tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Negligible,
    Untriaged,
}

impl Severity {
    fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
            Severity::Negligible => 4,
            Severity::Untriaged => 5,
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            "negligible" => Ok(Severity::Negligible),
            "untriaged" => Ok(Severity::Untriaged),
            _ => Err(format!("Unknown CVE priority: {}", s)),
        }
    }
}

/// Severity threshold for reported CVEs.
///
/// Thresholds are inclusive upward: `high` reports critical and high CVEs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Show only critical CVEs
    Critical,
    /// Show critical and high CVEs
    #[default]
    High,
    /// Show critical, high and medium CVEs
    Medium,
    /// Show all CVEs
    All,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::All => "all",
        }
    }

    /// Returns true if a CVE of `severity` should be reported at this threshold.
    pub fn includes(&self, severity: Severity) -> bool {
        match self {
            Priority::All => true,
            Priority::Critical => severity.rank() <= Severity::Critical.rank(),
            Priority::High => severity.rank() <= Severity::High.rank(),
            Priority::Medium => severity.rank() <= Severity::Medium.rank(),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
