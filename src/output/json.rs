use crate::model::{ProjectInfo, ScanReport};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Exported form of a scan report.
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub url: &'a str,
    pub date: DateTime<Utc>,
    pub project: &'a ProjectInfo,
    pub results: ResultSummary,
    pub checks: Vec<CheckEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ResultSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CheckEntry<'a> {
    pub name: String,
    pub status: &'static str,
    pub details: &'a str,
}

pub fn report_document<'a>(report: &'a ScanReport, project: &'a ProjectInfo) -> ReportDocument<'a> {
    ReportDocument {
        url: &report.target,
        date: report.scanned_at,
        project,
        results: ResultSummary {
            total: report.total,
            passed: report.passed,
            failed: report.failed,
            status: report.status.as_str(),
        },
        checks: report
            .checks
            .iter()
            .map(|c| CheckEntry {
                name: c.title(),
                status: c.verdict(),
                details: &c.detail,
            })
            .collect(),
    }
}

pub fn generate_json_string(report: &ScanReport, project: &ProjectInfo) -> Result<String> {
    Ok(serde_json::to_string_pretty(&report_document(report, project))?)
}

pub fn print_json(report: &ScanReport, project: &ProjectInfo) -> Result<()> {
    println!("{}", generate_json_string(report, project)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CheckResult;

    #[test]
    fn test_document_shape() {
        let report = ScanReport::new(
            "https://a.test",
            vec![
                CheckResult::new(1, "Captcha", true, "No forms found"),
                CheckResult::new(2, "Client and server side validation", false, "No validation detected"),
            ],
        );
        let project = ProjectInfo {
            name: "Portal".to_string(),
            ..ProjectInfo::default()
        };

        let json = generate_json_string(&report, &project).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["url"], "https://a.test");
        assert_eq!(value["project"]["name"], "Portal");
        assert_eq!(value["project"]["version"], "01.00.00");
        assert_eq!(value["results"]["total"], 2);
        assert_eq!(value["results"]["failed"], 1);
        assert_eq!(value["results"]["status"], "NOT APPROVED");
        assert_eq!(value["checks"][0]["name"], "1. Captcha");
        assert_eq!(value["checks"][1]["status"], "FAIL");
        assert!(value["date"].is_string());
    }
}
