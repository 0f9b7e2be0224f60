//! Checkpoint rule engine.
//!
//! Fourteen independent checks run in a fixed order against a fetched page.
//! Every check always runs and is reported; none gates another. Twelve of
//! them are pure functions of the page ([`checks`]); the error-page and
//! directory checks issue secondary requests through a [`Fetcher`]
//! ([`probes`]), and a failed secondary request never fails the scan.
//!
//! # Example
//!
//! ```
//! use webcheckpoint::catalog::VersionCatalog;
//! use webcheckpoint::extract::extract;
//! use webcheckpoint::fetch::Headers;
//! use webcheckpoint::rules::{Check, CheckContext, RuleEngine};
//!
//! let catalog = VersionCatalog::new();
//! let engine = RuleEngine::new(catalog.snapshot());
//!
//! let headers: Headers = [("Access-Control-Allow-Origin", "*")].into_iter().collect();
//! let evidence = extract("<p>hello</p>");
//! let ctx = CheckContext::new("https://example.com", "<p>hello</p>", &headers, &evidence);
//!
//! let result = engine.evaluate_passive(Check::CorsPolicy, &ctx).unwrap();
//! assert!(!result.passed);
//! ```

pub mod checks;
pub mod probes;

use crate::catalog::CatalogSnapshot;
use crate::fetch::{Fetcher, Headers};
use crate::model::{CheckResult, EvidenceBundle, ScanReport};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Hosts (matched as substrings) that external resources may load from.
pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &[
    "buenosaires.gob.ar",
    "google",
    "googleapis.com",
    "gstatic.com",
    "jquery",
    "cloudflare",
    "bootstrap",
];

/// The checkpoint checks, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Captcha,
    InputValidation,
    FrameOptions,
    VersionDisclosure,
    VersionCompatibility,
    SessionValidation,
    ProtectedAccess,
    FileUpload,
    ErrorMessages,
    ActiveDirectory,
    CorsPolicy,
    ExternalResources,
    DirectoryAccess,
    FrontendCode,
}

impl Check {
    pub const ALL: [Check; 14] = [
        Check::Captcha,
        Check::InputValidation,
        Check::FrameOptions,
        Check::VersionDisclosure,
        Check::VersionCompatibility,
        Check::SessionValidation,
        Check::ProtectedAccess,
        Check::FileUpload,
        Check::ErrorMessages,
        Check::ActiveDirectory,
        Check::CorsPolicy,
        Check::ExternalResources,
        Check::DirectoryAccess,
        Check::FrontendCode,
    ];

    /// 1-based position in the report.
    pub fn ordinal(&self) -> u8 {
        match self {
            Check::Captcha => 1,
            Check::InputValidation => 2,
            Check::FrameOptions => 3,
            Check::VersionDisclosure => 4,
            Check::VersionCompatibility => 5,
            Check::SessionValidation => 6,
            Check::ProtectedAccess => 7,
            Check::FileUpload => 8,
            Check::ErrorMessages => 9,
            Check::ActiveDirectory => 10,
            Check::CorsPolicy => 11,
            Check::ExternalResources => 12,
            Check::DirectoryAccess => 13,
            Check::FrontendCode => 14,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Check::Captcha => "Captcha",
            Check::InputValidation => "Client and server side validation",
            Check::FrameOptions => "X-Frame-Options",
            Check::VersionDisclosure => "No version disclosure",
            Check::VersionCompatibility => "Version verification",
            Check::SessionValidation => "Session validation",
            Check::ProtectedAccess => "Access to URLs or files without login",
            Check::FileUpload => "File upload validation",
            Check::ErrorMessages => "Custom error messages",
            Check::ActiveDirectory => "Active Directory authentication",
            Check::CorsPolicy => "Access-Control-Allow-Origin",
            Check::ExternalResources => "Application GET requests",
            Check::DirectoryAccess => "Unauthorized access to common directories and files",
            Check::FrontendCode => "Frontend code review",
        }
    }

    /// Short identifier used in logs and machine output.
    pub fn id(&self) -> &'static str {
        match self {
            Check::Captcha => "captcha",
            Check::InputValidation => "input_validation",
            Check::FrameOptions => "frame_options",
            Check::VersionDisclosure => "version_disclosure",
            Check::VersionCompatibility => "version_compatibility",
            Check::SessionValidation => "session_validation",
            Check::ProtectedAccess => "protected_access",
            Check::FileUpload => "file_upload",
            Check::ErrorMessages => "error_messages",
            Check::ActiveDirectory => "active_directory",
            Check::CorsPolicy => "cors_policy",
            Check::ExternalResources => "external_resources",
            Check::DirectoryAccess => "directory_access",
            Check::FrontendCode => "frontend_code",
        }
    }

    /// Whether the check needs secondary requests to the target.
    pub fn is_probe(&self) -> bool {
        matches!(self, Check::ErrorMessages | Check::DirectoryAccess)
    }
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}. {}", self.ordinal(), self.name())
    }
}

/// Pass/fail plus the human-readable justification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub passed: bool,
    pub detail: String,
}

impl CheckOutcome {
    pub fn pass(detail: impl Into<String>) -> Self {
        Self {
            passed: true,
            detail: detail.into(),
        }
    }

    pub fn fail(detail: impl Into<String>) -> Self {
        Self {
            passed: false,
            detail: detail.into(),
        }
    }

    fn into_result(self, check: Check) -> CheckResult {
        CheckResult::new(check.ordinal(), check.name(), self.passed, self.detail)
    }
}

/// Everything the checks read about the primary response.
pub struct CheckContext<'a> {
    /// Normalized URL of the scanned page; probes resolve paths against it.
    pub base_url: &'a str,
    pub content: &'a str,
    pub headers: &'a Headers,
    pub evidence: &'a EvidenceBundle,
    content_lower: String,
}

impl<'a> CheckContext<'a> {
    pub fn new(
        base_url: &'a str,
        content: &'a str,
        headers: &'a Headers,
        evidence: &'a EvidenceBundle,
    ) -> Self {
        Self {
            base_url,
            content,
            headers,
            evidence,
            content_lower: content.to_lowercase(),
        }
    }

    pub fn content_lower(&self) -> &str {
        &self.content_lower
    }

    /// True when any form's text contains one of `keywords`.
    pub fn forms_mention(&self, keywords: &[&str]) -> bool {
        self.evidence.forms.iter().any(|form| {
            let text = form.content.to_lowercase();
            keywords.iter().any(|k| text.contains(k))
        })
    }

    /// True when the page body contains one of `keywords`.
    pub fn content_mentions(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.content_lower.contains(k))
    }

    /// A login keyword appears in a form or anywhere in the page.
    pub fn has_login(&self) -> bool {
        self.forms_mention(&["login"]) || self.content_mentions(&["login"])
    }
}

/// Runs the checkpoint checks against one page.
///
/// Holds the catalog snapshot taken when the scan started, so a catalog
/// reload mid-scan is not observed.
pub struct RuleEngine {
    catalog: CatalogSnapshot,
    allowed_domains: Vec<String>,
}

impl RuleEngine {
    pub fn new(catalog: CatalogSnapshot) -> Self {
        Self {
            catalog,
            allowed_domains: DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }

    pub fn with_allowed_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_domains = domains
            .into_iter()
            .map(|d| d.into().to_lowercase())
            .collect();
        self
    }

    pub fn catalog(&self) -> &CatalogSnapshot {
        &self.catalog
    }

    pub fn allowed_domains(&self) -> &[String] {
        &self.allowed_domains
    }

    fn passive_outcome(&self, check: Check, ctx: &CheckContext<'_>) -> Option<CheckOutcome> {
        let outcome = match check {
            Check::Captcha => checks::captcha(ctx),
            Check::InputValidation => checks::input_validation(ctx),
            Check::FrameOptions => checks::frame_options(ctx),
            Check::VersionDisclosure => checks::version_disclosure(ctx),
            Check::VersionCompatibility => checks::version_compatibility(ctx, &self.catalog),
            Check::SessionValidation => checks::session_validation(ctx),
            Check::ProtectedAccess => checks::protected_access(ctx),
            Check::FileUpload => checks::file_upload(ctx),
            Check::ActiveDirectory => checks::active_directory(ctx),
            Check::CorsPolicy => checks::cors_policy(ctx),
            Check::ExternalResources => checks::external_resources(ctx, &self.allowed_domains),
            Check::FrontendCode => checks::frontend_code(ctx),
            Check::ErrorMessages | Check::DirectoryAccess => return None,
        };
        Some(outcome)
    }

    /// Evaluates a check that needs no network access.
    ///
    /// Returns `None` for probe checks.
    pub fn evaluate_passive(&self, check: Check, ctx: &CheckContext<'_>) -> Option<CheckResult> {
        self.passive_outcome(check, ctx)
            .map(|outcome| outcome.into_result(check))
    }

    pub async fn evaluate(
        &self,
        check: Check,
        ctx: &CheckContext<'_>,
        fetcher: &dyn Fetcher,
    ) -> CheckResult {
        let outcome = match self.passive_outcome(check, ctx) {
            Some(outcome) => outcome,
            None if check == Check::ErrorMessages => probes::error_messages(ctx, fetcher).await,
            None => probes::directory_access(ctx, fetcher).await,
        };
        let result = outcome.into_result(check);

        debug!(
            check = check.id(),
            passed = result.passed,
            "{}: {}",
            check,
            result.detail
        );
        result
    }

    /// Runs all checks in order and aggregates them into a report.
    pub async fn run_checks(&self, ctx: &CheckContext<'_>, fetcher: &dyn Fetcher) -> ScanReport {
        let mut results = Vec::with_capacity(Check::ALL.len());
        for check in Check::ALL {
            results.push(self.evaluate(check, ctx, fetcher).await);
        }
        ScanReport::new(ctx.base_url, results)
    }
}
