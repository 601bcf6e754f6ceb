//! Output formatting for CLI

use anyhow::Result;
use console::{style, Style};
use serde::Serialize;
use std::fmt::Display;
use tabled::{settings::Style as TableStyle, Table, Tabled};
use vcr_sync::report::{ReconcileReport, ResourceAction};
use vcr_sync::verify::SyncStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

/// Format and print rows in the specified format
pub fn print_output<T: Serialize + Tabled>(data: &[T], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                println!("{}", style("No results found").dim());
            } else {
                let table = Table::new(data).with(TableStyle::rounded()).to_string();
                println!("{}", table);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(data)?),
    }
    Ok(())
}

/// Print a single item as JSON or YAML
pub fn print_single<T: Serialize>(data: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table | OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?)
        }
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(data)?),
    }
    Ok(())
}

/// Success message
pub fn success(msg: impl Display) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Warning message
pub fn warning(msg: impl Display) {
    println!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Error message
pub fn error(msg: impl Display) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: impl Display) {
    let key_style = Style::new().cyan().bold();
    println!("{}: {}", key_style.apply_to(key), value);
}

/// Print a section header
pub fn print_header(title: &str) {
    println!();
    println!("{}", style(title).bold().underlined());
    println!();
}

/// Action label with color
pub fn action_indicator(action: &ResourceAction) -> String {
    let label = action.label();
    match action {
        ResourceAction::Created { .. }
        | ResourceAction::Expanded { .. }
        | ResourceAction::Refreshed { .. } => format!("{}", style(label).green()),
        ResourceAction::Skipped { .. } => format!("{}", style(label).yellow()),
        ResourceAction::Failed { .. } => format!("{}", style(label).red()),
        ResourceAction::Unchanged { .. } | ResourceAction::Ignored { .. } => {
            format!("{}", style(label).dim())
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct ResourceRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Partitions")]
    partitions: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<(&str, &ResourceAction)> for ResourceRow {
    fn from((resource, action): (&str, &ResourceAction)) -> Self {
        let (partitions, detail) = match action {
            ResourceAction::Created { partitions }
            | ResourceAction::Refreshed { partitions }
            | ResourceAction::Unchanged { partitions } => (partitions.to_string(), String::new()),
            ResourceAction::Expanded { added, partitions } => {
                (partitions.to_string(), format!("+{} partitions", added))
            }
            ResourceAction::Ignored { keyword } => ("-".to_string(), format!("matches '{}'", keyword)),
            ResourceAction::Skipped { reason } => ("-".to_string(), reason.clone()),
            ResourceAction::Failed { error } => ("-".to_string(), error.clone()),
        };
        Self {
            resource: resource.to_string(),
            action: action_indicator(action),
            partitions,
            detail,
        }
    }
}

/// Print a pass report
pub fn print_report(report: &ReconcileReport, format: OutputFormat) -> Result<()> {
    if format != OutputFormat::Table {
        return print_single(report, format);
    }

    let title = match &report.source_cluster {
        Some(src) => format!("{} {} -> {}", report.operation, src, report.destination_cluster),
        None => format!("{} {}", report.operation, report.destination_cluster),
    };
    print_header(&title);

    let rows: Vec<ResourceRow> = report
        .resources
        .iter()
        .map(|r| ResourceRow::from((r.resource.as_str(), &r.action)))
        .collect();
    print_output(&rows, format)?;
    println!();

    if report.cancelled {
        warning(report.summary());
    } else if report.has_failures() {
        error(report.summary());
    } else {
        success(report.summary());
    }
    Ok(())
}

#[derive(Debug, Serialize, Tabled)]
struct DriftRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Missing")]
    missing: String,
}

/// Print a verification result
pub fn print_status(status: &SyncStatus, format: OutputFormat) -> Result<()> {
    if format != OutputFormat::Table {
        return print_single(status, format);
    }

    print_header("Sync Status");
    if status.in_sync() {
        success("Destination contains every source partition");
        print_kv("Ignored", status.ignored.len());
        return Ok(());
    }

    let mut rows: Vec<DriftRow> = status
        .missing_resources
        .iter()
        .map(|r| DriftRow {
            resource: r.clone(),
            missing: style("whole resource").red().to_string(),
        })
        .collect();
    rows.extend(status.missing_partitions.iter().map(|(r, parts)| DriftRow {
        resource: r.clone(),
        missing: format!("{} partitions", parts.len()),
    }));
    print_output(&rows, format)?;
    println!();
    print_kv("Missing resources", status.missing_resources.len());
    print_kv("Missing partitions", status.missing_partition_count());
    print_kv("Ignored", status.ignored.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_row() {
        console::set_colors_enabled(false);
        let row = ResourceRow::from(("1", &ResourceAction::Expanded { added: 2, partitions: 10 }));
        assert_eq!(row.action, "expanded");
        assert_eq!(row.partitions, "10");
        assert_eq!(row.detail, "+2 partitions");

        let row = ResourceRow::from(("stats", &ResourceAction::Ignored { keyword: "stats".into() }));
        assert_eq!(row.partitions, "-");
        assert_eq!(row.detail, "matches 'stats'");
    }
}
