use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag attributes keyed by lowercase name. Valueless attributes map to "".
pub type Attributes = BTreeMap<String, String>;

/// A `<form>` with the text collected between its open and close tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRecord {
    pub attributes: Attributes,
    pub content: String,
}

impl FormRecord {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScriptRecord {
    /// `<script src="...">`
    External { attributes: Attributes },
    /// Inline script body.
    Inline { content: String },
}

impl ScriptRecord {
    pub fn src(&self) -> Option<&str> {
        match self {
            ScriptRecord::External { attributes } => attributes.get("src").map(String::as_str),
            ScriptRecord::Inline { .. } => None,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            ScriptRecord::External { .. } => None,
            ScriptRecord::Inline { content } => Some(content.as_str()),
        }
    }
}

/// Everything the rule engine knows about a fetched page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub forms: Vec<FormRecord>,
    pub scripts: Vec<ScriptRecord>,
    pub links: Vec<Attributes>,
    pub images: Vec<Attributes>,
    pub iframes: Vec<Attributes>,
    pub anchors: Vec<Attributes>,
    /// `input`, `textarea` and `select` elements.
    pub inputs: Vec<Attributes>,
    /// Library name to the last version seen for it.
    pub detected_versions: BTreeMap<String, String>,
    /// Cookie names set by the target while fetching the page.
    pub cookie_names: Vec<String>,
}

impl EvidenceBundle {
    pub fn with_cookies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cookie_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn record_version(&mut self, library: &str, version: &str) {
        self.detected_versions
            .insert(library.to_string(), version.to_string());
    }

    pub fn inline_scripts(&self) -> impl Iterator<Item = &str> {
        self.scripts.iter().filter_map(ScriptRecord::content)
    }

    pub fn file_inputs(&self) -> impl Iterator<Item = &Attributes> {
        self.inputs
            .iter()
            .filter(|input| input.get("type").is_some_and(|t| t.eq_ignore_ascii_case("file")))
    }
}
