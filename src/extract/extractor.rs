use super::tokenizer::{HtmlEvent, Tokenizer};
use crate::model::{Attributes, EvidenceBundle, FormRecord, ScriptRecord};
use regex::Regex;
use std::sync::LazyLock;

/// Libraries whose versions are read from script sources and bodies.
const SCRIPT_LIBRARIES: &[&str] = &["jquery", "bootstrap", "react", "angular", "vue"];

/// Libraries whose versions are read from stylesheet links.
const STYLESHEET_LIBRARIES: &[&str] = &["bootstrap", "font-awesome"];

type LibraryPatterns = Vec<(&'static str, Regex)>;

fn compile(libraries: &[&'static str], template: &str) -> LibraryPatterns {
    libraries
        .iter()
        .map(|lib| {
            let pattern = template.replace("{lib}", &regex::escape(lib));
            (*lib, Regex::new(&pattern).expect("static library pattern"))
        })
        .collect()
}

/// `jquery-3.6.0.min.js`, `bootstrap.5.3.0`, ...
static SCRIPT_SRC_PATTERNS: LazyLock<LibraryPatterns> =
    LazyLock::new(|| compile(SCRIPT_LIBRARIES, r"(?i){lib}[.-](\d+\.\d+\.\d+)"));

/// `jquery version: "3.6.0"`, `react'version'='18.2.0'`, ...
static INLINE_SCRIPT_PATTERNS: LazyLock<LibraryPatterns> = LazyLock::new(|| {
    compile(
        SCRIPT_LIBRARIES,
        r#"(?i){lib}[\s'"]?version[\s'"]?[:=]\s*['"](\d+\.\d+\.\d+)['"]"#,
    )
});

static STYLESHEET_PATTERNS: LazyLock<LibraryPatterns> =
    LazyLock::new(|| compile(STYLESHEET_LIBRARIES, r"(?i){lib}[.-](\d+\.\d+\.\d+)"));

#[derive(Debug)]
struct OpenForm {
    attributes: Attributes,
    content: String,
}

/// Builds an [`EvidenceBundle`] from a stream of HTML events.
///
/// Form and inline-script accumulators are independent: text inside a
/// script nested in a form is appended to both.
#[derive(Debug, Default)]
pub struct EvidenceExtractor {
    bundle: EvidenceBundle,
    open_form: Option<OpenForm>,
    open_script: Option<String>,
}

impl EvidenceExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_form(&self) -> bool {
        self.open_form.is_some()
    }

    pub fn in_script(&self) -> bool {
        self.open_script.is_some()
    }

    pub fn handle(&mut self, event: HtmlEvent) {
        match event {
            HtmlEvent::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                self.start_tag(&name, attributes);
                if self_closing {
                    self.end_tag(&name);
                }
            }
            HtmlEvent::EndTag { name } => self.end_tag(&name),
            HtmlEvent::Text(text) => self.text(&text),
            HtmlEvent::Comment(_) => {}
        }
    }

    fn start_tag(&mut self, name: &str, attributes: Attributes) {
        match name {
            "form" => {
                self.open_form = Some(OpenForm {
                    attributes,
                    content: String::new(),
                });
            }
            "script" => match attributes.get("src") {
                Some(src) => {
                    for (lib, re) in SCRIPT_SRC_PATTERNS.iter() {
                        if let Some(caps) = re.captures(src) {
                            self.bundle.record_version(lib, &caps[1]);
                        }
                    }
                    self.bundle.scripts.push(ScriptRecord::External { attributes });
                }
                None => self.open_script = Some(String::new()),
            },
            "link" => {
                if let Some(href) = attributes.get("href") {
                    for (lib, re) in STYLESHEET_PATTERNS.iter() {
                        if let Some(caps) = re.captures(href) {
                            self.bundle.record_version(lib, &caps[1]);
                        }
                    }
                    self.bundle.links.push(attributes);
                }
            }
            "img" if attributes.contains_key("src") => self.bundle.images.push(attributes),
            "iframe" if attributes.contains_key("src") => self.bundle.iframes.push(attributes),
            "a" if attributes.contains_key("href") => self.bundle.anchors.push(attributes),
            "input" | "textarea" | "select" => self.bundle.inputs.push(attributes),
            _ => {}
        }
    }

    fn end_tag(&mut self, name: &str) {
        match name {
            "form" => {
                if let Some(form) = self.open_form.take() {
                    self.close_form(form);
                }
            }
            "script" => {
                if let Some(content) = self.open_script.take() {
                    self.close_script(content);
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(form) = self.open_form.as_mut() {
            form.content.push_str(text);
        }
        if let Some(script) = self.open_script.as_mut() {
            script.push_str(text);
        }
    }

    fn close_form(&mut self, form: OpenForm) {
        self.bundle.forms.push(FormRecord {
            attributes: form.attributes,
            content: form.content,
        });
    }

    fn close_script(&mut self, content: String) {
        for (lib, re) in INLINE_SCRIPT_PATTERNS.iter() {
            if let Some(caps) = re.captures(&content) {
                self.bundle.record_version(lib, &caps[1]);
            }
        }
        self.bundle.scripts.push(ScriptRecord::Inline { content });
    }

    /// Closes anything still open and returns the collected evidence.
    pub fn finish(mut self) -> EvidenceBundle {
        if let Some(content) = self.open_script.take() {
            self.close_script(content);
        }
        if let Some(form) = self.open_form.take() {
            self.close_form(form);
        }
        self.bundle
    }
}

/// Extracts evidence from an HTML document in one pass.
pub fn extract(html: &str) -> EvidenceBundle {
    let mut extractor = EvidenceExtractor::new();
    for event in Tokenizer::new(html) {
        extractor.handle(event);
    }
    extractor.finish()
}
