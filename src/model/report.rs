use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one checkpoint check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Position in the fixed check order, starting at 1.
    pub ordinal: u8,
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn new(
        ordinal: u8,
        name: impl Into<String>,
        passed: bool,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            ordinal,
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }

    /// Name prefixed with the ordinal, e.g. "3. X-Frame-Options".
    pub fn title(&self) -> String {
        format!("{}. {}", self.ordinal, self.name)
    }

    pub fn verdict(&self) -> &'static str {
        if self.passed {
            "PASS"
        } else {
            "FAIL"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanStatus {
    #[serde(rename = "APPROVED")]
    Approved,
    #[serde(rename = "NOT APPROVED")]
    NotApproved,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Approved => "APPROVED",
            ScanStatus::NotApproved => "NOT APPROVED",
        }
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub target: String,
    pub scanned_at: DateTime<Utc>,
    pub checks: Vec<CheckResult>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub status: ScanStatus,
}

impl ScanReport {
    pub fn new(target: impl Into<String>, checks: Vec<CheckResult>) -> Self {
        let total = checks.len();
        let passed = checks.iter().filter(|c| c.passed).count();
        let failed = total - passed;

        Self {
            target: target.into(),
            scanned_at: Utc::now(),
            checks,
            total,
            passed,
            failed,
            status: if failed == 0 {
                ScanStatus::Approved
            } else {
                ScanStatus::NotApproved
            },
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == ScanStatus::Approved
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// Project metadata printed on exported reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectInfo {
    pub name: String,
    pub author: String,
    pub ticket: String,
    pub version: String,
}

impl Default for ProjectInfo {
    fn default() -> Self {
        Self {
            name: "N/A".to_string(),
            author: "Automated scan".to_string(),
            ticket: "N/A".to_string(),
            version: "01.00.00".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let checks = vec![
            CheckResult::new(1, "Captcha", true, "ok"),
            CheckResult::new(2, "Validation", false, "missing"),
            CheckResult::new(3, "X-Frame-Options", true, "DENY"),
        ];
        let report = ScanReport::new("https://example.com", checks);

        assert_eq!(report.total, 3);
        assert_eq!(report.passed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.status, ScanStatus::NotApproved);
        assert_eq!(report.failed_checks().count(), 1);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ScanStatus::NotApproved).unwrap();
        assert_eq!(json, "\"NOT APPROVED\"");
        assert_eq!(ScanStatus::Approved.to_string(), "APPROVED");
    }

    #[test]
    fn test_check_title() {
        let check = CheckResult::new(11, "Access-Control-Allow-Origin", false, "*");
        assert_eq!(check.title(), "11. Access-Control-Allow-Origin");
        assert_eq!(check.verdict(), "FAIL");
    }
}
