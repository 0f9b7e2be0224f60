//! Name normalization, version extraction and compatibility matching.

use regex::Regex;
use std::sync::LazyLock;

/// Surface spellings that map onto a canonical catalog key.
const ALIASES: &[(&str, &str)] = &[
    ("node.js", "nodejs"),
    ("node js", "nodejs"),
    ("react.js", "react"),
    ("vue.js", "vue"),
    ("angular.js", "angular"),
    ("next.js", "nextjs"),
    ("nest.js", "nestjs"),
    ("express.js", "express"),
    ("fastify.js", "fastify"),
    ("spring boot", "springboot"),
    ("chart.js", "chartjs"),
    ("font awesome", "fontawesome"),
    ("font-awesome", "fontawesome"),
    ("open jdk", "openjdk"),
    ("red hat", "redhat"),
    ("red hat enterprise linux", "rhel"),
];

/// Version patterns in priority order. The first pattern that matches
/// anywhere in the text wins, regardless of where the match occurs.
static VERSION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(\d+\.\d+\.\d+)",
        r"(\d+\.\d+)",
        r"(\d+)",
        r"(?i)v(\d+\.\d+\.\d+)",
        r"(?i)version\s*(\d+\.\d+\.\d+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static version pattern"))
    .collect()
});

/// Normalizes a software name to its catalog key.
///
/// Lowercases and trims, then applies the alias table. Names without an
/// alias pass through unchanged, so the function is total and idempotent.
pub fn normalize(name: &str) -> String {
    let name = name.trim().to_lowercase();
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, key)| (*key).to_string())
        .unwrap_or(name)
}

/// Extracts a version string from free text.
///
/// Returns `None` when no pattern matches.
///
/// # Example
///
/// ```
/// use webcheckpoint::catalog::extract_version;
///
/// assert_eq!(extract_version("v18.2.0"), Some("18.2.0".to_string()));
/// assert_eq!(extract_version("jquery"), None);
/// ```
pub fn extract_version(text: &str) -> Option<String> {
    VERSION_PATTERNS
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Strips trailing version-like tokens ("3.6.4", "v3", "version") from a
/// combined "name version" input. Returns the input untouched when nothing
/// would remain.
pub fn strip_version_suffix(input: &str) -> &str {
    let mut end = input.trim_end().len();
    let trimmed = &input[..end];

    for token in trimmed.split_whitespace().rev() {
        if !is_version_token(token) {
            break;
        }
        // Tokens are visited right to left, so each one ends the current slice.
        let start = input[..end].rfind(token).unwrap_or(0);
        end = input[..start].trim_end().len();
    }

    let name = input[..end].trim();
    if name.is_empty() {
        input.trim()
    } else {
        name
    }
}

fn is_version_token(token: &str) -> bool {
    let lower = token.to_lowercase();
    if lower == "v" || lower == "version" {
        return true;
    }
    let mut chars = lower.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('v') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

/// Reports whether a detected version satisfies any approved version.
///
/// An exact string match is always compatible. Otherwise versions are split
/// into integer components: the major component must match, and the minor
/// component must match when both sides carry one. Approved entries that do
/// not parse as integers are skipped rather than failing the comparison.
pub fn is_compatible(detected: &str, approved: &[String]) -> bool {
    if detected.is_empty() || approved.is_empty() {
        return false;
    }

    if approved.iter().any(|v| v == detected) {
        return true;
    }

    let Some(detected_parts) = parse_components(detected) else {
        return false;
    };

    approved.iter().any(|candidate| {
        let Some(candidate_parts) = parse_components(candidate) else {
            return false;
        };

        match (detected_parts.first(), candidate_parts.first()) {
            (Some(a), Some(b)) if a == b => {
                match (detected_parts.get(1), candidate_parts.get(1)) {
                    (Some(a), Some(b)) => a == b,
                    _ => true,
                }
            }
            _ => false,
        }
    })
}

fn parse_components(version: &str) -> Option<Vec<u64>> {
    version
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect()
}
