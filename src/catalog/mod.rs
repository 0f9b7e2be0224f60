//! Catalog of approved ("homologated") software versions.
//!
//! The catalog maps normalized software names to the ordered list of
//! versions approved by the reference standard, and answers compatibility
//! queries against it.
//!
//! - [`VersionCatalog`] - Shared, updatable catalog owned by the caller
//! - [`CatalogSnapshot`] - Read-consistent view used for lookups
//! - [`LookupResult`] - Outcome of a lookup, never an error
//!
//! # Example
//!
//! ```
//! use webcheckpoint::catalog::{LookupStatus, VersionCatalog};
//!
//! let catalog = VersionCatalog::new();
//! let result = catalog.lookup("jquery 3.6.4");
//!
//! assert_eq!(result.status, LookupStatus::Found);
//! assert!(result.compatible);
//! ```

mod defaults;
mod summary;
mod version;

pub use defaults::{STANDARD_HINT, STANDARD_REFERENCE, STANDARD_UPDATED};
pub use summary::{CatalogSummary, VerificationReport};
pub use version::{extract_version, is_compatible, normalize, strip_version_suffix};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Normalized software name to approved versions, in display order.
pub type CatalogEntries = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    Found,
    NotFound,
}

impl LookupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupStatus::Found => "found",
            LookupStatus::NotFound => "not_found",
        }
    }
}

/// Result of looking a piece of software up in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResult {
    /// Normalized catalog key the input resolved to.
    pub software: String,
    pub status: LookupStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_version: Option<String>,
    /// Approved versions for the software; empty when not found.
    pub approved_versions: Vec<String>,
    pub compatible: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

/// Immutable view of the catalog at one point in time.
///
/// Cloning is cheap; a snapshot taken before a reload keeps seeing the
/// entries it was created with.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    entries: Arc<CatalogEntries>,
}

impl CatalogSnapshot {
    pub fn new(entries: CatalogEntries) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    pub fn entries(&self) -> &CatalogEntries {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the approved versions for a name, after normalization.
    pub fn approved_versions(&self, name: &str) -> Option<&[String]> {
        self.entries.get(&normalize(name)).map(Vec::as_slice)
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.entries.contains_key(&normalize(name))
    }

    /// Approved versions for a name in catalog order, or an empty list.
    pub fn recommended_versions(&self, name: &str) -> Vec<String> {
        self.approved_versions(name)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    /// Resolves a free-form "name version" input to a catalog key.
    ///
    /// The whole input is tried first so keys that contain digits still
    /// resolve; otherwise trailing version tokens are dropped.
    pub fn resolve_name(&self, input: &str) -> String {
        let full = normalize(input);
        if self.entries.contains_key(&full) {
            return full;
        }
        normalize(strip_version_suffix(input))
    }

    /// Looks software up, extracting a version from the same input.
    ///
    /// Callers typically pass `"name version"` as one string. Absence of
    /// the software or of a version is reported through the result, never
    /// as an error.
    pub fn lookup(&self, software: &str) -> LookupResult {
        let key = self.resolve_name(software);
        let detected_version = extract_version(software);

        let Some(approved) = self.entries.get(&key) else {
            debug!(software = %key, "not in catalog");
            return LookupResult {
                software: key,
                status: LookupStatus::NotFound,
                detected_version,
                approved_versions: Vec::new(),
                compatible: false,
                message: format!("{} is not in the catalog of approved software", software),
                recommendation: Some(STANDARD_HINT.to_string()),
            };
        };

        let listed = approved.join(", ");
        let (compatible, message, recommendation) = match &detected_version {
            Some(version) if is_compatible(version, approved) => (
                true,
                format!("{} v{} is compatible with the approved versions", software, version),
                None,
            ),
            Some(version) => (
                false,
                format!("{} v{} is not in the list of approved versions", software, version),
                Some(format!("Recommended versions: {}", listed)),
            ),
            None => (
                false,
                format!("{} is in the catalog of approved software", software),
                Some(format!("Approved versions: {}", listed)),
            ),
        };

        LookupResult {
            software: key,
            status: LookupStatus::Found,
            detected_version,
            approved_versions: approved.clone(),
            compatible,
            message,
            recommendation,
        }
    }

    /// Looks up software with its version given separately.
    pub fn lookup_version(&self, software: &str, version: Option<&str>) -> LookupResult {
        match version.map(str::trim).filter(|v| !v.is_empty()) {
            Some(version) => self.lookup(&format!("{} {}", software, version)),
            None => self.lookup(software),
        }
    }
}

impl Default for CatalogSnapshot {
    fn default() -> Self {
        VersionCatalog::new().snapshot()
    }
}

/// Shared catalog of approved versions.
///
/// Starts from the built-in table and can be extended from text files.
/// Updates build a new mapping and swap it in whole, so lookups running
/// against a [`CatalogSnapshot`] never observe a partial load.
pub struct VersionCatalog {
    entries: RwLock<Arc<CatalogEntries>>,
}

impl VersionCatalog {
    /// Creates a catalog holding the built-in approved versions.
    pub fn new() -> Self {
        let entries = defaults::DEFAULT_ENTRIES
            .iter()
            .map(|(name, versions)| {
                (
                    (*name).to_string(),
                    versions.iter().map(|v| (*v).to_string()).collect(),
                )
            })
            .collect();
        Self::from_entries(entries)
    }

    pub fn empty() -> Self {
        Self::from_entries(CatalogEntries::new())
    }

    pub fn from_entries(entries: CatalogEntries) -> Self {
        Self {
            entries: RwLock::new(Arc::new(entries)),
        }
    }

    /// Returns the current read-consistent view of the catalog.
    pub fn snapshot(&self) -> CatalogSnapshot {
        // Writers only ever swap the Arc, so a poisoned lock still guards a
        // complete mapping.
        let guard = self.entries.read().unwrap_or_else(|e| e.into_inner());
        CatalogSnapshot {
            entries: Arc::clone(&guard),
        }
    }

    pub fn lookup(&self, software: &str) -> LookupResult {
        self.snapshot().lookup(software)
    }

    pub fn lookup_version(&self, software: &str, version: Option<&str>) -> LookupResult {
        self.snapshot().lookup_version(software, version)
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.snapshot().is_known(name)
    }

    pub fn recommended_versions(&self, name: &str) -> Vec<String> {
        self.snapshot().recommended_versions(name)
    }

    /// Loads entries from a `name: v1, v2` text file.
    ///
    /// Each entry replaces the versions of its normalized name. Returns
    /// `false` without touching the catalog if the file is missing or
    /// unreadable.
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();

        if !path.exists() {
            warn!("Catalog file {} not found", path.display());
            return false;
        }

        match read_catalog_file(path) {
            Ok(content) => {
                let applied = self.load_from_str(&content);
                info!("Loaded {} catalog entries from {}", applied, path.display());
                true
            }
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    /// Applies catalog lines from a string, returning how many entries were
    /// written. Lines without a `:` separator are skipped.
    pub fn load_from_str(&self, content: &str) -> usize {
        let updates = parse_catalog(content);
        if updates.is_empty() {
            return 0;
        }

        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let mut next = CatalogEntries::clone(&guard);
        let applied = updates.len();
        for (name, versions) in updates {
            next.insert(name, versions);
        }
        *guard = Arc::new(next);

        applied
    }
}

impl Default for VersionCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn read_catalog_file(path: &Path) -> Result<String, CatalogError> {
    fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_catalog(content: &str) -> Vec<(String, Vec<String>)> {
    content
        .lines()
        .filter_map(|line| {
            let (name, versions) = line.split_once(':')?;
            let name = normalize(name);
            if name.is_empty() {
                return None;
            }

            let mut list: Vec<String> = Vec::new();
            for version in versions.split(',').map(str::trim) {
                if !version.is_empty() && !list.iter().any(|v| v == version) {
                    list.push(version.to_string());
                }
            }
            Some((name, list))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_lookup_compatible() {
        let catalog = VersionCatalog::new();
        let result = catalog.lookup("jquery 3.6.4");

        assert_eq!(result.status, LookupStatus::Found);
        assert_eq!(result.software, "jquery");
        assert_eq!(result.detected_version.as_deref(), Some("3.6.4"));
        assert!(result.compatible);
        assert!(result.recommendation.is_none());
    }

    #[test]
    fn test_lookup_incompatible() {
        let catalog = VersionCatalog::new();
        let result = catalog.lookup("jquery 2.0.0");

        assert_eq!(result.status, LookupStatus::Found);
        assert!(!result.compatible);
        assert_eq!(result.approved_versions, vec!["3.6.4", "3.7.0", "3.7.1"]);
        assert_eq!(
            result.recommendation.as_deref(),
            Some("Recommended versions: 3.6.4, 3.7.0, 3.7.1")
        );
    }

    #[test]
    fn test_lookup_not_found() {
        let catalog = VersionCatalog::new();
        let result = catalog.lookup("unknown_widget 1.0.0");

        assert_eq!(result.status, LookupStatus::NotFound);
        assert_eq!(result.software, "unknown_widget");
        assert!(!result.compatible);
        assert!(result.approved_versions.is_empty());
        assert_eq!(result.recommendation.as_deref(), Some(STANDARD_HINT));
    }

    #[test]
    fn test_lookup_without_version() {
        let catalog = VersionCatalog::new();
        let result = catalog.lookup("Bootstrap");

        assert_eq!(result.status, LookupStatus::Found);
        assert_eq!(result.detected_version, None);
        assert!(!result.compatible);
        assert!(result.message.contains("is in the catalog"));
        assert_eq!(
            result.recommendation.as_deref(),
            Some("Approved versions: 5.3.0, 5.3.1, 5.3.2")
        );
    }

    #[test]
    fn test_lookup_aliases_with_version() {
        let catalog = VersionCatalog::new();

        let result = catalog.lookup("Node.js 18.20.4");
        assert_eq!(result.software, "nodejs");
        assert!(result.compatible);

        let result = catalog.lookup_version("Red Hat Enterprise Linux", Some("8.7"));
        assert_eq!(result.software, "rhel");
        assert!(result.compatible);
    }

    #[test]
    fn test_is_known_and_recommended() {
        let catalog = VersionCatalog::new();
        assert!(catalog.is_known("Spring Boot"));
        assert!(!catalog.is_known("unknown_widget"));
        assert_eq!(catalog.recommended_versions("nextjs"), vec!["14.1"]);
        assert!(catalog.recommended_versions("unknown_widget").is_empty());
    }

    #[test]
    fn test_load_from_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "widgetjs: 1.0, 2.0").unwrap();
        writeln!(file, "this line has no separator").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  JQuery : 4.0.0 ").unwrap();

        let catalog = VersionCatalog::new();
        assert!(catalog.load_from_file(file.path()));

        assert_eq!(catalog.recommended_versions("widgetjs"), vec!["1.0", "2.0"]);
        // Entries are replaced, not merged.
        assert_eq!(catalog.recommended_versions("jquery"), vec!["4.0.0"]);
        assert!(catalog.is_known("php"));
    }

    #[test]
    fn test_load_from_missing_file() {
        let catalog = VersionCatalog::new();
        let before = catalog.snapshot().len();

        assert!(!catalog.load_from_file("/nonexistent/catalog.txt"));
        assert_eq!(catalog.snapshot().len(), before);
    }

    #[test]
    fn test_load_dedupes_versions() {
        let catalog = VersionCatalog::empty();
        assert_eq!(catalog.load_from_str("tool: 1.0, 1.0, , 2.0"), 1);
        assert_eq!(catalog.recommended_versions("tool"), vec!["1.0", "2.0"]);
    }

    #[test]
    fn test_snapshot_isolated_from_reload() {
        let catalog = VersionCatalog::new();
        let before = catalog.snapshot();

        catalog.load_from_str("jquery: 9.9.9");

        assert_eq!(before.recommended_versions("jquery"), vec!["3.6.4", "3.7.0", "3.7.1"]);
        assert_eq!(catalog.recommended_versions("jquery"), vec!["9.9.9"]);
    }
}
