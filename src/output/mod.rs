mod cli;
mod html;
mod json;

pub use cli::{print_catalog_table, print_cli_table, print_lookup, print_verification};
pub use html::print_html;
pub use json::{print_json, report_document, ReportDocument};

use crate::model::{ProjectInfo, ScanReport};
use anyhow::Result;

/// Output format for scan reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON export document
    Json,
    /// Self-contained HTML report
    Html,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            _ => Err(format!(
                "Unknown format: {}. Use 'table', 'json', or 'html'",
                s
            )),
        }
    }
}

pub fn print_report(report: &ScanReport, project: &ProjectInfo, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_cli_table(report),
        OutputFormat::Json => print_json(report, project),
        OutputFormat::Html => print_html(report, project),
    }
}

/// Format a report to string for file output
pub fn format_report_to_string(
    report: &ScanReport,
    project: &ProjectInfo,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Html => Ok(html::generate_html_string(report, project)),
        // Tables go to files as the JSON export.
        OutputFormat::Json | OutputFormat::Table => json::generate_json_string(report, project),
    }
}
