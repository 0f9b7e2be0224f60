//! HTML evidence extraction.
//!
//! [`Tokenizer`] turns a document into a lazy sequence of tag, text and
//! comment events; [`EvidenceExtractor`] folds those events into an
//! [`EvidenceBundle`](crate::model::EvidenceBundle).
//!
//! # Example
//!
//! ```
//! use webcheckpoint::extract::extract;
//!
//! let bundle = extract(r#"<script src="/js/jquery-3.7.1.min.js"></script>"#);
//! assert_eq!(bundle.detected_versions["jquery"], "3.7.1");
//! ```

mod extractor;
pub mod tokenizer;

pub use extractor::{extract, EvidenceExtractor};
pub use tokenizer::{HtmlEvent, Tokenizer};
