use super::defaults::{CATEGORIES, STANDARD_REFERENCE, STANDARD_UPDATED};
use super::{CatalogEntries, CatalogSnapshot, LookupResult, LookupStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Overview of the catalog for display and export.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogSummary {
    pub standard: &'static str,
    pub updated: &'static str,
    pub total_software: usize,
    pub categories: BTreeMap<&'static str, Vec<&'static str>>,
    pub software: CatalogEntries,
}

/// Lookup results for a batch of software strings.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub verified_at: DateTime<Utc>,
    pub total_verified: usize,
    pub compatible: usize,
    pub incompatible: usize,
    pub not_found: usize,
    pub details: Vec<LookupResult>,
}

impl CatalogSnapshot {
    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            standard: STANDARD_REFERENCE,
            updated: STANDARD_UPDATED,
            total_software: self.len(),
            categories: CATEGORIES
                .iter()
                .map(|(name, members)| (*name, members.to_vec()))
                .collect(),
            software: self.entries().clone(),
        }
    }

    /// Looks up every entry and tallies the outcomes.
    pub fn verify_all<I, S>(&self, software: I) -> VerificationReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let details: Vec<LookupResult> = software
            .into_iter()
            .map(|s| self.lookup(s.as_ref()))
            .collect();

        let found = |compatible: bool| {
            details
                .iter()
                .filter(|r| r.status == LookupStatus::Found && r.compatible == compatible)
                .count()
        };

        VerificationReport {
            verified_at: Utc::now(),
            total_verified: details.len(),
            compatible: found(true),
            incompatible: found(false),
            not_found: details
                .iter()
                .filter(|r| r.status == LookupStatus::NotFound)
                .count(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::VersionCatalog;

    #[test]
    fn test_summary() {
        let summary = VersionCatalog::new().snapshot().summary();

        assert_eq!(summary.standard, "ES0901 v4.7");
        assert_eq!(summary.total_software, summary.software.len());
        assert_eq!(summary.categories["web_servers"], vec!["apache", "nginx", "tomcat"]);
    }

    #[test]
    fn test_verify_all_counts() {
        let report = VersionCatalog::new().snapshot().verify_all([
            "jquery 3.6.4",
            "bootstrap 4.0.0",
            "angular",
            "unknown_widget 1.0.0",
        ]);

        assert_eq!(report.total_verified, 4);
        assert_eq!(report.compatible, 1);
        assert_eq!(report.incompatible, 2);
        assert_eq!(report.not_found, 1);
        assert_eq!(report.details.len(), 4);
    }
}
