use crate::plan::ScanPlan;
use anyhow::Result;

pub fn format_json(plan: &ScanPlan) -> Result<String> {
    Ok(serde_json::to_string_pretty(plan)?)
}
