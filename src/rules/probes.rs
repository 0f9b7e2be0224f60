//! Checks that issue secondary requests to the target.
//!
//! A secondary request that fails is treated as absence of evidence, so the
//! check passes. It is logged at debug level and never surfaced as an error.

use super::{CheckContext, CheckOutcome};
use crate::fetch::Fetcher;
use tracing::debug;
use url::Url;

/// Path that no real application serves.
pub const ERROR_PROBE_PATH: &str = "/non_existent_page_12345";

const ERROR_SIGNATURES: &[&str] = &[
    "stack trace",
    "exception",
    "traceback",
    "system.web",
    "runtime error",
    "server error",
    "php error",
    "sql syntax",
];

/// Commonly exposed paths. Only the first [`PROBED_PATHS`] are requested.
pub const COMMON_PATHS: &[&str] = &[
    "/icons",
    "/icons/small",
    "/images",
    "/fonts",
    "/.htaccess",
    "/.gitignore",
    "/web.config",
    "/info.php",
    "/phpinfo.php",
    "/update.php",
];

pub const PROBED_PATHS: usize = 2;

/// Resolves an absolute path against the scanned page, keeping its origin.
fn resolve(base: &str, path: &str) -> Option<String> {
    Url::parse(base)
        .and_then(|base| base.join(path))
        .map(String::from)
        .ok()
}

/// 9. Custom error messages.
pub async fn error_messages(ctx: &CheckContext<'_>, fetcher: &dyn Fetcher) -> CheckOutcome {
    let Some(url) = resolve(ctx.base_url, ERROR_PROBE_PATH) else {
        debug!("cannot resolve error probe against {}", ctx.base_url);
        return CheckOutcome::pass("No errors detected during testing.");
    };

    let response = match fetcher.get(&url).await {
        Ok(response) => response,
        Err(e) => {
            debug!("error page probe failed: {}", e);
            return CheckOutcome::pass("No errors detected during testing.");
        }
    };

    let body = response.body.to_lowercase();
    if ERROR_SIGNATURES.iter().any(|s| body.contains(s)) {
        CheckOutcome::fail(format!("System errors detected. Tested URL: {}", url))
    } else {
        CheckOutcome::pass(format!("No errors detected during testing. Tested URL: {}", url))
    }
}

/// 13. Unauthorized access to common directories and files.
pub async fn directory_access(ctx: &CheckContext<'_>, fetcher: &dyn Fetcher) -> CheckOutcome {
    let mut exposed = Vec::new();

    for path in COMMON_PATHS.iter().take(PROBED_PATHS) {
        let Some(url) = resolve(ctx.base_url, path) else {
            continue;
        };
        match fetcher.get(&url).await {
            Ok(response) if response.status == 200 => exposed.push(*path),
            Ok(response) => debug!("{} -> {}", url, response.status),
            Err(e) => debug!("directory probe {} failed: {}", url, e),
        }
    }

    if exposed.is_empty() {
        CheckOutcome::pass("No unauthorized directory access detected during testing")
    } else {
        CheckOutcome::fail(format!("Access to: {}", exposed.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::stub::StubFetcher;
    use crate::fetch::{FetchResponse, Headers};
    use crate::model::EvidenceBundle;

    #[test]
    fn test_resolve_keeps_origin() {
        assert_eq!(
            resolve("https://a.test/app/login", "/icons").as_deref(),
            Some("https://a.test/icons")
        );
        assert_eq!(resolve("not a url", "/icons"), None);
    }

    #[tokio::test]
    async fn test_error_page_with_stack_trace_fails() {
        let headers = Headers::new();
        let evidence = EvidenceBundle::default();
        let ctx = CheckContext::new("https://a.test/app", "", &headers, &evidence);
        let fetcher = StubFetcher::new().with(
            "https://a.test/non_existent_page_12345",
            FetchResponse::new(500, "Unhandled Exception at System.Web.Mvc"),
        );

        let outcome = error_messages(&ctx, &fetcher).await;
        assert!(!outcome.passed);
        assert!(outcome.detail.ends_with("https://a.test/non_existent_page_12345"));
    }

    #[tokio::test]
    async fn test_error_page_clean_passes() {
        let headers = Headers::new();
        let evidence = EvidenceBundle::default();
        let ctx = CheckContext::new("https://a.test", "", &headers, &evidence);
        let fetcher = StubFetcher::new().with(
            "https://a.test/non_existent_page_12345",
            FetchResponse::new(404, "<h1>Not found</h1>"),
        );

        assert!(error_messages(&ctx, &fetcher).await.passed);
    }

    #[tokio::test]
    async fn test_error_probe_failure_is_a_pass() {
        let headers = Headers::new();
        let evidence = EvidenceBundle::default();
        let ctx = CheckContext::new("https://a.test", "", &headers, &evidence);

        let outcome = error_messages(&ctx, &StubFetcher::new()).await;
        assert!(outcome.passed);
        assert_eq!(outcome.detail, "No errors detected during testing.");
    }

    #[tokio::test]
    async fn test_directory_access_probes_two_paths() {
        let headers = Headers::new();
        let evidence = EvidenceBundle::default();
        let ctx = CheckContext::new("https://a.test", "", &headers, &evidence);
        let fetcher = StubFetcher::new()
            .with("https://a.test/icons", FetchResponse::new(200, "Index of /icons"))
            .with("https://a.test/icons/small", FetchResponse::new(403, ""))
            .with("https://a.test/images", FetchResponse::new(200, ""));

        let outcome = directory_access(&ctx, &fetcher).await;
        assert!(!outcome.passed);
        assert_eq!(outcome.detail, "Access to: /icons");
        assert_eq!(
            fetcher.requested(),
            vec!["https://a.test/icons", "https://a.test/icons/small"]
        );
    }

    #[tokio::test]
    async fn test_directory_probe_failures_pass() {
        let headers = Headers::new();
        let evidence = EvidenceBundle::default();
        let ctx = CheckContext::new("https://a.test", "", &headers, &evidence);

        let outcome = directory_access(&ctx, &StubFetcher::new()).await;
        assert!(outcome.passed);
    }
}
