//! Scan orchestration.
//!
//! A scan is one primary GET of the target, evidence extraction from the
//! body, and the checkpoint checks against a catalog snapshot taken when
//! the scan starts. Only a failure of the primary request aborts a scan.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use webcheckpoint::catalog::VersionCatalog;
//! use webcheckpoint::fetch::HttpFetcher;
//! use webcheckpoint::scanner::Checkpoint;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let checkpoint = Checkpoint::new(HttpFetcher::new()?, Arc::new(VersionCatalog::new()));
//!     let report = checkpoint.scan("example.com").await?;
//!     println!("{}: {}", report.target, report.status);
//!     Ok(())
//! }
//! ```

use crate::catalog::VersionCatalog;
use crate::extract::extract;
use crate::fetch::{FetchError, Fetcher};
use crate::model::ScanReport;
use crate::rules::{CheckContext, RuleEngine, DEFAULT_ALLOWED_DOMAINS};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("could not fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid target URL: {0}")]
    InvalidUrl(String),
}

/// Adds `https://` when no scheme is given and drops a trailing slash.
pub fn normalize_target(url: &str) -> Result<String, ScanError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ScanError::InvalidUrl(url.to_string()));
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let normalized = with_scheme.strip_suffix('/').unwrap_or(&with_scheme).to_string();

    url::Url::parse(&normalized)
        .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
    Ok(normalized)
}

/// Runs checkpoint scans through a [`Fetcher`].
pub struct Checkpoint<F: Fetcher> {
    fetcher: F,
    catalog: Arc<VersionCatalog>,
    allowed_domains: Vec<String>,
}

impl<F: Fetcher> Checkpoint<F> {
    pub fn new(fetcher: F, catalog: Arc<VersionCatalog>) -> Self {
        Self {
            fetcher,
            catalog,
            allowed_domains: DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }

    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = domains;
        self
    }

    pub fn catalog(&self) -> &Arc<VersionCatalog> {
        &self.catalog
    }

    pub async fn scan(&self, url: &str) -> Result<ScanReport, ScanError> {
        let target = normalize_target(url)?;
        info!("scanning {}", target);

        let response = self
            .fetcher
            .get(&target)
            .await
            .map_err(|source| ScanError::Fetch {
                url: target.clone(),
                source,
            })?;

        if response.status != 200 {
            return Err(ScanError::Status {
                url: target,
                status: response.status,
            });
        }

        let evidence = extract(&response.body).with_cookies(response.cookies.iter().cloned());
        debug!(
            forms = evidence.forms.len(),
            scripts = evidence.scripts.len(),
            versions = evidence.detected_versions.len(),
            "extracted evidence"
        );

        let engine = RuleEngine::new(self.catalog.snapshot())
            .with_allowed_domains(self.allowed_domains.iter().cloned());
        let ctx = CheckContext::new(&target, &response.body, &response.headers, &evidence);
        let report = engine.run_checks(&ctx, &self.fetcher).await;

        info!(
            "{}: {} ({}/{} passed)",
            target, report.status, report.passed, report.total
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::stub::StubFetcher;
    use crate::fetch::FetchResponse;
    use crate::model::ScanStatus;

    fn checkpoint(fetcher: StubFetcher) -> Checkpoint<StubFetcher> {
        Checkpoint::new(fetcher, Arc::new(VersionCatalog::new()))
    }

    #[test]
    fn test_normalize_target() {
        assert_eq!(normalize_target("example.com/").unwrap(), "https://example.com");
        assert_eq!(
            normalize_target(" http://example.com/app ").unwrap(),
            "http://example.com/app"
        );
        assert!(matches!(normalize_target(""), Err(ScanError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_scan_runs_all_checks() {
        let page = FetchResponse::new(
            200,
            r#"<form><input type="password" required> login </form>
               <div class="g-recaptcha"></div>"#,
        )
        .with_header("Access-Control-Allow-Origin", "*")
        .with_cookie("JSESSIONID");
        let fetcher = StubFetcher::new().with("https://intranet.test", page);

        let report = checkpoint(fetcher).scan("intranet.test/").await.unwrap();

        assert_eq!(report.target, "https://intranet.test");
        assert_eq!(report.total, 14);
        assert_eq!(report.status, ScanStatus::NotApproved);
        let cors = &report.checks[10];
        assert!(!cors.passed);
        assert!(cors.detail.contains('*'));
        // Probe requests failed, which counts as no evidence.
        assert!(report.checks[8].passed);
        assert!(report.checks[12].passed);
    }

    #[tokio::test]
    async fn test_scan_primary_fetch_failure_aborts() {
        let err = checkpoint(StubFetcher::new())
            .scan("https://down.test")
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_scan_non_200_aborts() {
        let fetcher =
            StubFetcher::new().with("https://a.test", FetchResponse::new(503, "maintenance"));
        let err = checkpoint(fetcher).scan("https://a.test").await.unwrap_err();
        assert!(matches!(err, ScanError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_scan_uses_loaded_catalog() {
        let catalog = Arc::new(VersionCatalog::empty());
        catalog.load_from_str("jquery: 3.5.1");
        let fetcher = StubFetcher::new().with(
            "https://a.test",
            FetchResponse::new(200, r#"<script src="/jquery-3.5.1.js"></script>"#),
        );

        let report = Checkpoint::new(fetcher, Arc::clone(&catalog))
            .scan("a.test")
            .await
            .unwrap();
        assert!(report.checks[4].passed);
    }

    #[tokio::test]
    async fn test_session_cookie_from_login_redirect_counts() {
        use crate::fetch::test_server::{response, serve};
        use crate::fetch::HttpFetcher;

        let base = serve(vec![
            (
                "/",
                response(302, &[("Location", "/home"), ("Set-Cookie", "JSESSIONID=abc")], ""),
            ),
            ("/home", response(200, &[], "<p>public brochure</p>")),
        ])
        .await;

        let fetcher = HttpFetcher::new().unwrap();
        let checkpoint = Checkpoint::new(fetcher, Arc::new(VersionCatalog::new()));
        let report = checkpoint.scan(&base).await.unwrap();

        let access = &report.checks[6];
        assert!(access.passed, "{}", access.detail);
        assert!(access.detail.contains("session cookies"));
    }
}
