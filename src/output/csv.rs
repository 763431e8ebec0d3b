use crate::plan::ScanPlan;

use super::summary_rows;

pub fn format_csv(plan: &ScanPlan) -> String {
    let mut out = String::from("setting,value\n");
    for (setting, value) in summary_rows(plan) {
        out.push_str(&escape(setting));
        out.push(',');
        out.push_str(&escape(&value));
        out.push('\n');
    }
    out
}

/// Quotes a field if it contains a separator, quote or line break.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
