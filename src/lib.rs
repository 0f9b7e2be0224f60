pub mod catalog;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod model;
pub mod output;
pub mod rules;
pub mod scanner;

pub use catalog::{LookupResult, LookupStatus, VersionCatalog};
pub use config::Config;
pub use fetch::{Fetcher, HttpFetcher};
pub use model::{CheckResult, EvidenceBundle, ProjectInfo, ScanReport, ScanStatus};
pub use rules::{Check, RuleEngine};
pub use scanner::{Checkpoint, ScanError};
