use crate::plan::ScanPlan;
use tabled::{settings::Style, Table, Tabled};

use super::summary_rows;

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    setting: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub fn format_cli_table(plan: &ScanPlan) -> String {
    let rows: Vec<SettingRow> = summary_rows(plan)
        .into_iter()
        .map(|(setting, value)| SettingRow {
            setting: setting.to_string(),
            value: truncate(&value, 80),
        })
        .collect();

    let mut out = String::new();
    out.push_str("Scan inputs:\n\n");
    out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
    out
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RawArguments;
    use crate::output::test_support::plan;

    #[test]
    fn test_table_contains_settings() {
        let table = format_cli_table(&plan(RawArguments::default()));
        assert!(table.starts_with("Scan inputs:"));
        assert!(table.contains("Setting"));
        assert!(table.contains("focal"));
        assert!(table.contains("/home/ubuntu/manifest"));
        assert!(table.contains("2020-06-01 12:30:00 UTC"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }
}
