//! Core data types for evidence, check results, and scan reports.
//!
//! - [`EvidenceBundle`] - Signals extracted from one HTML document
//! - [`CheckResult`] - Outcome of a single checkpoint check
//! - [`ScanReport`] - All check results plus the overall verdict
//! - [`ProjectInfo`] - Project metadata attached to exported reports
//!
//! # Example
//!
//! ```
//! use webcheckpoint::{CheckResult, ScanReport, ScanStatus};
//!
//! let checks = vec![CheckResult::new(1, "Captcha", true, "CAPTCHA found")];
//! let report = ScanReport::new("https://example.com", checks);
//!
//! assert_eq!(report.status, ScanStatus::Approved);
//! ```

mod evidence;
mod report;

pub use evidence::*;
pub use report::*;
