use crate::catalog::{CatalogSummary, LookupResult, LookupStatus, VerificationReport};
use crate::model::{ScanReport, ScanStatus};
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct CheckRow {
    #[tabled(rename = "#")]
    ordinal: u8,
    #[tabled(rename = "Check")]
    name: String,
    #[tabled(rename = "Result")]
    verdict: String,
    #[tabled(rename = "Details")]
    detail: String,
}

#[derive(Tabled)]
struct LookupRow {
    #[tabled(rename = "Software")]
    software: String,
    #[tabled(rename = "Detected")]
    detected: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Approved Versions")]
    approved: String,
}

#[derive(Tabled)]
struct CatalogRow {
    #[tabled(rename = "Software")]
    software: String,
    #[tabled(rename = "Approved Versions")]
    versions: String,
}

pub fn print_cli_table(report: &ScanReport) -> Result<()> {
    println!();
    println!("Target: {}", report.target);
    println!(
        "Scan completed at: {}",
        report.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    let rows: Vec<CheckRow> = report
        .checks
        .iter()
        .map(|c| CheckRow {
            ordinal: c.ordinal,
            name: c.name.clone(),
            verdict: format_verdict(c.passed),
            detail: truncate(&c.detail, 80),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);

    println!();
    print_summary(report);

    Ok(())
}

fn print_summary(report: &ScanReport) {
    println!("Summary:");
    println!("  Total checks: {}", report.total);
    println!("  Passed: {}", report.passed);
    println!("  Failed: {}", report.failed);
    println!("  Status: {}", format_status(report.status));

    if !report.is_approved() {
        println!();
        println!("Failed checks:");
        for check in report.failed_checks() {
            println!("  {} - {}", check.title(), check.detail);
        }
    }
}

pub fn print_lookup(result: &LookupResult) {
    let status = match (result.status, result.compatible) {
        (LookupStatus::NotFound, _) => "\x1b[33mNOT FOUND\x1b[0m",
        (LookupStatus::Found, true) => "\x1b[32mCOMPATIBLE\x1b[0m",
        (LookupStatus::Found, false) => "\x1b[31mNOT COMPATIBLE\x1b[0m",
    };

    println!();
    println!("{}  {}", status, result.message);
    if let Some(recommendation) = &result.recommendation {
        println!("  {}", recommendation);
    }
}

pub fn print_verification(report: &VerificationReport) -> Result<()> {
    let rows: Vec<LookupRow> = report
        .details
        .iter()
        .map(|r| LookupRow {
            software: r.software.clone(),
            detected: r.detected_version.clone().unwrap_or_else(|| "-".to_string()),
            status: match (r.status, r.compatible) {
                (LookupStatus::NotFound, _) => "not found".to_string(),
                (LookupStatus::Found, true) => "compatible".to_string(),
                (LookupStatus::Found, false) => "not compatible".to_string(),
            },
            approved: truncate(&r.approved_versions.join(", "), 50),
        })
        .collect();

    println!();
    println!("{}", Table::new(rows).with(Style::rounded()));
    println!();
    println!(
        "Verified {}: {} compatible, {} not compatible, {} not found",
        report.total_verified, report.compatible, report.incompatible, report.not_found
    );
    Ok(())
}

pub fn print_catalog_table(summary: &CatalogSummary) -> Result<()> {
    println!();
    println!("Standard: {} (updated {})", summary.standard, summary.updated);
    println!("Approved software entries: {}", summary.total_software);
    println!();

    let rows: Vec<CatalogRow> = summary
        .software
        .iter()
        .map(|(name, versions)| CatalogRow {
            software: name.clone(),
            versions: truncate(&versions.join(", "), 70),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));

    println!();
    println!("Categories:");
    for (category, members) in &summary.categories {
        println!("  {:<20} {}", category, members.join(", "));
    }
    Ok(())
}

fn format_verdict(passed: bool) -> String {
    if passed {
        "\x1b[32mPASS\x1b[0m".to_string()
    } else {
        "\x1b[31mFAIL\x1b[0m".to_string()
    }
}

fn format_status(status: ScanStatus) -> String {
    match status {
        ScanStatus::Approved => format!("\x1b[32m{}\x1b[0m", status),
        ScanStatus::NotApproved => format!("\x1b[31m{}\x1b[0m", status),
    }
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

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer detail text", 10), "a longe...");
        assert_eq!(truncate("áéíóúáéíóúáéíóú", 6), "áéí...");
    }

    #[test]
    fn test_format_verdict() {
        assert!(format_verdict(true).contains("PASS"));
        assert!(format_verdict(false).contains("FAIL"));
    }
}
