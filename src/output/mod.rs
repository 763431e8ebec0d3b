mod cli;
mod csv;
mod json;

pub use cli::format_cli_table;
pub use csv::format_csv;
pub use json::format_json;

use crate::model::OutputMode;
use crate::plan::ScanPlan;
use anyhow::Result;

/// Renders `plan` in the requested output mode.
pub fn render(plan: &ScanPlan, mode: OutputMode) -> Result<String> {
    match mode {
        OutputMode::Text => Ok(format_cli_table(plan)),
        OutputMode::Csv => Ok(format_csv(plan)),
        OutputMode::Json => format_json(plan),
    }
}

/// Prints `plan` to stdout unless the options ask for silence.
pub fn print_plan(plan: &ScanPlan) -> Result<()> {
    if plan.options.is_quiet() {
        return Ok(());
    }
    println!("{}", render(plan, plan.options.output)?);
    Ok(())
}

/// Setting/value pairs shared by the tabular renderers.
fn summary_rows(plan: &ScanPlan) -> Vec<(&'static str, String)> {
    let options = &plan.options;
    let yes_no = |flag: bool| (if flag { "yes" } else { "no" }).to_string();

    let mut rows = vec![
        ("Release", plan.release.clone().unwrap_or_else(|| "-".to_string())),
        ("Database", plan.db_file.display().to_string()),
        ("Database downloaded", yes_no(options.download_db)),
        ("Package source", plan.packages.describe()),
    ];
    if let Some(count) = plan.packages.package_count() {
        rows.push(("Packages", count.to_string()));
    }
    rows.push(match &options.cve {
        Some(cve) => ("CVE", cve.clone()),
        None => ("Priority", options.priority.to_string()),
    });
    rows.extend([
        ("Unresolved only", yes_no(options.unresolved)),
        ("Show links", yes_no(options.show_links)),
        ("Experimental", yes_no(options.experimental_mode)),
        ("Nagios", yes_no(options.nagios_mode)),
        (
            "Prepared at",
            plan.prepared_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ),
    ]);
    rows
}


#[cfg(test)]
mod tests {
    use super::test_support::plan;
    use super::*;
    use crate::options::RawArguments;

    #[test]
    fn test_summary_rows_priority() {
        let rows = summary_rows(&plan(RawArguments::default()));
        assert!(rows.contains(&("Priority", "high".to_string())));
        assert!(rows.contains(&("Packages", "2".to_string())));
        assert!(!rows.iter().any(|(name, _)| *name == "CVE"));
    }

    #[test]
    fn test_summary_rows_cve() {
        let rows = summary_rows(&plan(RawArguments {
            cve: Some("CVE-2020-1234".to_string()),
            ..Default::default()
        }));
        assert!(rows.contains(&("CVE", "CVE-2020-1234".to_string())));
        assert!(!rows.iter().any(|(name, _)| *name == "Priority"));
    }

    #[test]
    fn test_render_dispatch() {
        let json = render(&plan(RawArguments::default()), OutputMode::Json).unwrap();
        assert!(json.trim_start().starts_with('{'));

        let csv = render(&plan(RawArguments::default()), OutputMode::Csv).unwrap();
        assert!(csv.starts_with("setting,value\n"));

        let text = render(&plan(RawArguments::default()), OutputMode::Text).unwrap();
        assert!(text.contains("Package source"));
    }
}
