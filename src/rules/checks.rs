//! Checks that only read the primary response.

use super::{CheckContext, CheckOutcome};
use crate::catalog::{CatalogSnapshot, LookupStatus};
use crate::model::ScriptRecord;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

const CAPTCHA_INDICATORS: &[&str] = &[
    "recaptcha",
    "grecaptcha",
    "g-recaptcha",
    "captcha",
    "https://www.google.com/recaptcha",
    "data-sitekey",
    r#"class="g-recaptcha""#,
];

const VALIDATION_ATTRIBUTES: &[&str] = &["required", "pattern", "min", "max"];
const VALIDATION_EVENTS: &[&str] = &["onsubmit", "oninput", "onchange"];
const VALIDATION_KEYWORDS: &[&str] = &["validate", "validation", "checkvalidity", "isvalid"];

const VERSION_HEADERS: &[&str] = &[
    "Server",
    "X-Powered-By",
    "X-AspNet-Version",
    "X-AspNetMvc-Version",
];

const AUTH_INDICATORS: &[&str] = &[
    "login",
    "iniciar sesión",
    "ingresar",
    "acceder",
    "autenticar",
    "usuario",
    "contraseña",
    "sesión",
    "session",
    "token",
    "auth",
    "jwt",
    "acceso restringido",
    "acceso denegado",
    "debe iniciar sesión",
    "área protegida",
    "oauth",
    "openid",
    "saml",
    "ldap",
];

const LOGIN_FIELDS: &[&str] = &["password", "contraseña", "login"];
const SESSION_COOKIE_MARKERS: &[&str] = &["session", "token", "auth", "id"];

const AD_KEYWORDS: &[&str] = &[
    "ad authentication",
    "active directory",
    "ldap",
    "saml",
    "openid",
    "sso",
    "oauth",
    "windows authentication",
];

const SENSITIVE_COMMENT_KEYWORDS: &[&str] = &["password", "usuario", "token"];

const MAX_LISTED_RESOURCES: usize = 5;
const MAX_LISTED_ADDRESSES: usize = 3;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").expect("static pattern"));

static HTML_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(jquery|bootstrap|angular|react|vue)[-\s]?\d+\.\d+\.\d+")
        .expect("static pattern")
});

static FRAME_ANCESTORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"frame-ancestors\s+([^;]+)").expect("static pattern"));

static IPV4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b").expect("static pattern")
});

static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static pattern"));

/// 1. CAPTCHA presence.
pub fn captcha(ctx: &CheckContext<'_>) -> CheckOutcome {
    let evidence = ctx.evidence;

    let script = evidence
        .scripts
        .iter()
        .filter_map(ScriptRecord::src)
        .any(|src| src.contains("recaptcha/api.js"));
    let in_content = ctx.content_mentions(CAPTCHA_INDICATORS);
    let in_forms = ctx.forms_mention(CAPTCHA_INDICATORS);

    if script || in_content || in_forms {
        let mut found = Vec::new();
        if script {
            found.push("reCAPTCHA script detected");
        }
        if in_content {
            found.push("CAPTCHA references in page source");
        }
        if in_forms {
            found.push("CAPTCHA in forms");
        }
        CheckOutcome::pass(format!("CAPTCHA found: {}", found.join(", ")))
    } else if evidence.forms.is_empty() {
        CheckOutcome::pass("No forms found, CAPTCHA not required")
    } else {
        CheckOutcome::fail("No CAPTCHA implementation found")
    }
}

/// 2. Client and server side validation.
pub fn input_validation(ctx: &CheckContext<'_>) -> CheckOutcome {
    let evidence = ctx.evidence;

    let found = evidence
        .inputs
        .iter()
        .any(|input| VALIDATION_ATTRIBUTES.iter().any(|a| input.contains_key(*a)))
        || evidence
            .forms
            .iter()
            .any(|form| VALIDATION_EVENTS.iter().any(|e| form.attr(e).is_some()))
        || evidence.inline_scripts().any(|script| {
            let script = script.to_lowercase();
            VALIDATION_KEYWORDS.iter().any(|k| script.contains(k))
        });

    if found {
        CheckOutcome::pass("Validation mechanisms detected")
    } else {
        CheckOutcome::fail("No validation detected")
    }
}

/// 3. Clickjacking protection via X-Frame-Options or CSP.
pub fn frame_options(ctx: &CheckContext<'_>) -> CheckOutcome {
    let xfo = ctx
        .headers
        .get("X-Frame-Options")
        .map(|v| v.trim().to_uppercase())
        .unwrap_or_default();

    if xfo == "SAMEORIGIN" || xfo == "DENY" || xfo.starts_with("ALLOW-FROM ") {
        return CheckOutcome::pass(format!("X-Frame-Options header: {}", xfo));
    }

    let csp = ctx.headers.get("Content-Security-Policy").unwrap_or_default();
    if csp.contains("frame-ancestors") {
        let value = FRAME_ANCESTORS
            .captures(csp)
            .map(|caps| caps[1].trim().to_string())
            .unwrap_or_else(|| "configured".to_string());
        return CheckOutcome::pass(format!("CSP frame-ancestors: {}", value));
    }

    CheckOutcome::fail("Neither X-Frame-Options nor CSP frame-ancestors is properly configured")
}

/// 4. No version disclosure in headers or markup.
pub fn version_disclosure(ctx: &CheckContext<'_>) -> CheckOutcome {
    let mut disclosed: Vec<String> = VERSION_HEADERS
        .iter()
        .filter_map(|name| {
            ctx.headers
                .get(name)
                .filter(|value| DIGITS.is_match(value))
                .map(|value| format!("{}: {}", name, value))
        })
        .collect();

    disclosed.extend(
        HTML_VERSION
            .find_iter(ctx.content)
            .map(|m| m.as_str().to_string()),
    );

    if disclosed.is_empty() {
        CheckOutcome::pass("No versions detected")
    } else {
        CheckOutcome::fail(format!("Versions: {}", disclosed.join(", ")))
    }
}

/// 5. Detected library versions against the approved catalog.
///
/// A version is accepted when it is a substring of any approved version,
/// which is looser than [`crate::catalog::is_compatible`].
pub fn version_compatibility(ctx: &CheckContext<'_>, catalog: &CatalogSnapshot) -> CheckOutcome {
    let detected = &ctx.evidence.detected_versions;
    if detected.is_empty() {
        return CheckOutcome::pass("No specific software versions detected");
    }

    let vulnerable: Vec<String> = detected
        .iter()
        .filter(|(library, version)| {
            let result = catalog.lookup(library);
            result.status == LookupStatus::NotFound
                || !result
                    .approved_versions
                    .iter()
                    .any(|approved| approved.contains(version.as_str()))
        })
        .map(|(library, version)| format!("{} {}", library, version))
        .collect();

    if vulnerable.is_empty() {
        let verified: Vec<String> = detected
            .iter()
            .map(|(library, version)| format!("{} {}", library, version))
            .collect();
        CheckOutcome::pass(format!(
            "Versions verified and approved: {}",
            verified.join(", ")
        ))
    } else {
        CheckOutcome::fail(format!(
            "Vulnerable versions detected: {}",
            vulnerable.join(", ")
        ))
    }
}

/// 6. Session validation. Informational, always passes.
pub fn session_validation(ctx: &CheckContext<'_>) -> CheckOutcome {
    if ctx.has_login() {
        CheckOutcome::pass("The application provides login/logout")
    } else {
        CheckOutcome::pass("No username and password required")
    }
}

/// 7. Access to URLs or files without logging in.
pub fn protected_access(ctx: &CheckContext<'_>) -> CheckOutcome {
    let login_forms = ctx.forms_mention(LOGIN_FIELDS);
    let auth_in_content = ctx.content_mentions(AUTH_INDICATORS);
    let session_cookie = ctx.evidence.cookie_names.iter().any(|name| {
        let name = name.to_lowercase();
        SESSION_COOKIE_MARKERS.iter().any(|m| name.contains(m))
    });

    if !(login_forms || auth_in_content || session_cookie) {
        return CheckOutcome::fail("No access protection mechanisms detected");
    }

    let mut found = Vec::new();
    if login_forms {
        found.push("login forms detected");
    }
    if auth_in_content {
        found.push("authentication references in page source");
    }
    if session_cookie {
        found.push("session cookies identified");
    }
    CheckOutcome::pass(format!("Access protection found: {}", found.join(", ")))
}

/// 8. Restrictions on file uploads.
pub fn file_upload(ctx: &CheckContext<'_>) -> CheckOutcome {
    let evidence = ctx.evidence;
    let mut file_inputs = evidence.file_inputs().peekable();

    if file_inputs.peek().is_none() {
        return CheckOutcome::pass("Not applicable, no file upload functionality");
    }

    let restricted = file_inputs.any(|input| input.contains_key("accept"))
        || evidence
            .forms
            .iter()
            .any(|form| form.content.contains(r#"enctype="multipart/form-data""#));

    if restricted {
        CheckOutcome::pass("File type restrictions detected")
    } else {
        CheckOutcome::fail("No file type restrictions detected")
    }
}

/// 10. Credentials validated against Active Directory.
///
/// A page without any login indicator fails as well.
pub fn active_directory(ctx: &CheckContext<'_>) -> CheckOutcome {
    let has_login = ctx.has_login();
    let has_ad = ctx.content_mentions(AD_KEYWORDS);

    match (has_login, has_ad) {
        (true, true) => CheckOutcome::pass("Active Directory authentication detected"),
        (true, false) => CheckOutcome::fail(
            "No validation of user credentials against Active Directory detected",
        ),
        (false, _) => CheckOutcome::fail(
            "No username/password validation against Active Directory",
        ),
    }
}

/// 11. CORS policy. Only a literal wildcard fails.
pub fn cors_policy(ctx: &CheckContext<'_>) -> CheckOutcome {
    match ctx.headers.get("Access-Control-Allow-Origin") {
        None => CheckOutcome::pass("Not configured"),
        Some("*") => CheckOutcome::fail("Insecure configuration: *"),
        Some(value) => CheckOutcome::pass(format!("Value: {}", value)),
    }
}

/// 12. Resources fetched from hosts outside the allow-list.
pub fn external_resources(ctx: &CheckContext<'_>, allowed_domains: &[String]) -> CheckOutcome {
    let evidence = ctx.evidence;

    let script_srcs = evidence
        .scripts
        .iter()
        .filter_map(ScriptRecord::src)
        .map(|url| ("src", url));
    let image_srcs = evidence.images.iter().filter_map(|a| a.get("src")).map(|u| ("src", u.as_str()));
    let link_hrefs = evidence.links.iter().filter_map(|a| a.get("href")).map(|u| ("href", u.as_str()));
    let iframe_srcs = evidence.iframes.iter().filter_map(|a| a.get("src")).map(|u| ("src", u.as_str()));

    let external: Vec<String> = script_srcs
        .chain(image_srcs)
        .chain(link_hrefs)
        .chain(iframe_srcs)
        .filter(|(_, url)| is_external(url, allowed_domains))
        .map(|(attr, url)| format!("{}: {}", attr, url))
        .collect();

    if external.is_empty() {
        return CheckOutcome::pass("No external resources detected");
    }

    let mut detail = format!(
        "External resources: {}",
        external
            .iter()
            .take(MAX_LISTED_RESOURCES)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    );
    if external.len() > MAX_LISTED_RESOURCES {
        detail.push_str(&format!(" and {} more", external.len() - MAX_LISTED_RESOURCES));
    }
    CheckOutcome::fail(detail)
}

fn is_external(url: &str, allowed_domains: &[String]) -> bool {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return false;
    }
    let host = match Url::parse(url) {
        Ok(parsed) => parsed.host_str().unwrap_or_default().to_lowercase(),
        // Unparseable (bad port, stray characters): judge the raw authority.
        Err(_) => raw_authority(url).to_lowercase(),
    };
    !host.is_empty() && !allowed_domains.iter().any(|domain| host.contains(domain.as_str()))
}

/// Text between `://` and the next `/`, `?` or `#`.
fn raw_authority(url: &str) -> &str {
    let after_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    after_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
}

/// 14. Frontend code hygiene: hardcoded addresses and sensitive comments.
pub fn frontend_code(ctx: &CheckContext<'_>) -> CheckOutcome {
    let addresses: Vec<&str> = IPV4.find_iter(ctx.content).map(|m| m.as_str()).collect();
    let sensitive_comment = HTML_COMMENT.find_iter(ctx.content).any(|m| {
        let comment = m.as_str().to_lowercase();
        SENSITIVE_COMMENT_KEYWORDS.iter().any(|k| comment.contains(k))
    });

    if addresses.is_empty() && !sensitive_comment {
        return CheckOutcome::pass("No frontend code issues detected");
    }

    let mut issues = Vec::new();
    if !addresses.is_empty() {
        let shown: Vec<&str> = addresses.iter().take(MAX_LISTED_ADDRESSES).copied().collect();
        issues.push(format!("IP addresses found: {}", shown.join(", ")));
    }
    if sensitive_comment {
        issues.push("Commented code with sensitive information".to_string());
    }
    CheckOutcome::fail(issues.join("; "))
}
