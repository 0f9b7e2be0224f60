//! HTTP fetching.
//!
//! The rule engine and the scanner only talk to the network through the
//! [`Fetcher`] trait. [`HttpFetcher`] is the reqwest-backed implementation;
//! HTTP error statuses are returned as responses, only transport failures
//! become a [`FetchError`].

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::SET_COOKIE;
use reqwest::{Client, Method, Url};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Browser-like user agent; some targets refuse unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Headers a browser honours only once; a repeat keeps the first value.
const SINGLE_VALUED_HEADERS: &[&str] = &["access-control-allow-origin", "x-frame-options"];

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("could not connect to {url}: {reason}")]
    Connection { url: String, reason: String },

    #[error("request to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Response headers with case-insensitive lookup.
///
/// Names are stored lowercase; repeated headers are joined with ", ",
/// except [`SINGLE_VALUED_HEADERS`], which keep their first value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        let single = SINGLE_VALUED_HEADERS.contains(&name.as_str());
        self.0
            .entry(name)
            .and_modify(|existing| {
                if !single {
                    existing.push_str(", ");
                    existing.push_str(&value);
                }
            })
            .or_insert(value);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name.as_ref(), value);
        }
        headers
    }
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: Headers,
    /// Body decoded as UTF-8, invalid sequences replaced.
    pub body: String,
    /// Names of cookies held for the request, including any set while
    /// following redirects.
    pub cookies: Vec<String>,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>) -> Self {
        self.cookies.push(name.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs a request. Error statuses are returned, not raised.
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;

    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.fetch(FetchRequest::get(url)).await
    }
}

/// reqwest-backed [`Fetcher`] with a shared cookie jar and bounded timeout.
///
/// The jar persists across requests, so later requests see cookies that
/// earlier ones collected.
pub struct HttpFetcher {
    client: Client,
    jar: Arc<Jar>,
    timeout_secs: u64,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_settings(DEFAULT_USER_AGENT, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_settings(user_agent: &str, timeout_secs: u64) -> Result<Self, FetchError> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        Ok(Self {
            client,
            jar,
            timeout_secs,
        })
    }

    /// Cookie names the jar holds for `urls`, after any named in `set_cookies`.
    fn cookie_names<'h>(
        &self,
        set_cookies: impl Iterator<Item = &'h str>,
        urls: &[&Url],
    ) -> Vec<String> {
        let mut names: Vec<String> = set_cookies.filter_map(cookie_name).collect();

        for url in urls {
            let Some(header) = self.jar.cookies(url) else {
                continue;
            };
            let Ok(pairs) = header.to_str() else {
                continue;
            };
            for name in pairs.split(';').filter_map(cookie_name) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        debug!("{} {}", request.method, request.url);

        let url = Url::parse(&request.url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", request.url, e)))?;

        let mut builder = self.client.request(request.method.clone(), url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: request.url.clone(),
                    secs: self.timeout_secs,
                }
            } else if e.is_connect() {
                FetchError::Connection {
                    url: request.url.clone(),
                    reason: e.to_string(),
                }
            } else {
                FetchError::Request(e)
            }
        })?;

        let status = response.status().as_u16();

        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.as_str(), v);
            }
        }

        let final_url = response.url().clone();
        let cookies = self.cookie_names(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
            &[&final_url, &url],
        );

        let bytes = response.bytes().await?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        debug!("{} -> {} ({} bytes)", request.url, status, bytes.len());

        Ok(FetchResponse {
            status,
            headers,
            body,
            cookies,
        })
    }
}

/// Name part of a `Set-Cookie` value.
fn cookie_name(set_cookie: &str) -> Option<String> {
    let pair = set_cookie.split(';').next()?;
    let (name, _) = pair.split_once('=')?;
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}



#[cfg(test)]
mod tests {
    use super::*;
    use test_server::{response, serve};

    #[test]
    fn test_headers_case_insensitive() {
        let headers: Headers = [("X-Frame-Options", "DENY"), ("Server", "nginx")]
            .into_iter()
            .collect();

        assert_eq!(headers.get("x-frame-options"), Some("DENY"));
        assert_eq!(headers.get("SERVER"), Some("nginx"));
        assert!(headers.contains("server"));
        assert_eq!(headers.get("x-powered-by"), None);
    }

    #[test]
    fn test_headers_repeated_values_joined() {
        let mut headers = Headers::new();
        headers.insert("Vary", "Accept");
        headers.insert("vary", "Origin");
        assert_eq!(headers.get("Vary"), Some("Accept, Origin"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_single_valued_headers_keep_first() {
        let mut headers = Headers::new();
        headers.insert("Access-Control-Allow-Origin", "*");
        headers.insert("access-control-allow-origin", "*");
        headers.insert("X-Frame-Options", "DENY");
        headers.insert("X-Frame-Options", "SAMEORIGIN");

        assert_eq!(headers.get("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(headers.get("X-Frame-Options"), Some("DENY"));
    }

    #[test]
    fn test_cookie_name() {
        assert_eq!(
            cookie_name("JSESSIONID=abc123; Path=/; HttpOnly").as_deref(),
            Some("JSESSIONID")
        );
        assert_eq!(cookie_name("lang=es").as_deref(), Some("lang"));
        assert_eq!(cookie_name("=orphan"), None);
        assert_eq!(cookie_name("garbage"), None);
    }

    #[tokio::test]
    async fn test_stub_fetcher() {
        let fetcher = stub::StubFetcher::new()
            .with("https://example.com/", FetchResponse::new(404, "missing"));

        let response = fetcher.get("https://example.com/").await.unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.is_success());

        let err = fetcher.get("https://other.test/").await.unwrap_err();
        assert!(matches!(err, FetchError::Connection { .. }));
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_http_error_status_is_a_response() {
        let base = serve(vec![(
            "/missing",
            response(404, &[("X-Powered-By", "PHP/8.1")], "gone"),
        )])
        .await;

        let fetcher = HttpFetcher::new().unwrap();
        let response = fetcher.get(&format!("{}/missing", base)).await.unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_success());
        assert_eq!(response.body, "gone");
        assert_eq!(response.headers.get("x-powered-by"), Some("PHP/8.1"));
    }

    #[tokio::test]
    async fn test_cookie_set_on_redirect_is_kept() {
        let base = serve(vec![
            (
                "/",
                response(
                    302,
                    &[("Location", "/home"), ("Set-Cookie", "JSESSIONID=abc")],
                    "",
                ),
            ),
            (
                "/home",
                response(200, &[("Set-Cookie", "lang=es; Path=/")], "<p>public brochure</p>"),
            ),
        ])
        .await;

        let fetcher = HttpFetcher::new().unwrap();
        let response = fetcher.get(&base).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "<p>public brochure</p>");
        assert!(response.cookies.contains(&"JSESSIONID".to_string()));
        assert!(response.cookies.contains(&"lang".to_string()));
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_connection_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = HttpFetcher::new()
            .unwrap()
            .get(&format!("http://{}/", addr))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Connection { .. }), "{:?}", err);
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let fetcher = HttpFetcher::with_settings(DEFAULT_USER_AGENT, 1).unwrap();
        let err = fetcher.get(&format!("http://{}/", addr)).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { secs: 1, .. }), "{:?}", err);
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let err = HttpFetcher::new().unwrap().get("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }
}
