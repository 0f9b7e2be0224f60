//! Pull-based HTML tag tokenizer.
//!
//! Wraps the html5ever tokenizer behind an [`Iterator`] of [`HtmlEvent`]s.
//! Input is fed in chunks as events are pulled, so a caller that stops early
//! never tokenizes the rest of the document. Character references are
//! decoded in text and attribute values. Malformed markup never fails: it
//! is recovered the way browsers recover it. The bodies of `script` and
//! `style` elements are raw text, so markup inside them does not produce
//! tags.

use crate::model::Attributes;
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer as Html5Tokenizer,
    TokenizerOpts,
};
use std::collections::VecDeque;

/// Bytes handed to html5ever per feed.
const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlEvent {
    StartTag {
        /// Lowercase tag name.
        name: String,
        attributes: Attributes,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
    Text(String),
    Comment(String),
}

/// Queues html5ever tokens as events until the iterator pulls them.
#[derive(Default)]
struct EventSink {
    events: VecDeque<HtmlEvent>,
}

impl EventSink {
    fn push_text(&mut self, text: &str) {
        if let Some(HtmlEvent::Text(last)) = self.events.back_mut() {
            last.push_str(text);
        } else {
            self.events.push_back(HtmlEvent::Text(text.to_string()));
        }
    }

    fn push_tag(&mut self, tag: Tag) -> TokenSinkResult<()> {
        let name = tag.name.to_string();

        if tag.kind == TagKind::EndTag {
            self.events.push_back(HtmlEvent::EndTag { name });
            return TokenSinkResult::Continue;
        }

        let raw_kind = match name.as_str() {
            "script" if !tag.self_closing => Some(RawKind::ScriptData),
            "style" if !tag.self_closing => Some(RawKind::Rawtext),
            _ => None,
        };

        let mut attributes = Attributes::new();
        for attr in tag.attrs {
            attributes.insert(attr.name.local.to_string(), attr.value.to_string());
        }
        self.events.push_back(HtmlEvent::StartTag {
            name,
            attributes,
            self_closing: tag.self_closing,
        });

        match raw_kind {
            Some(kind) => TokenSinkResult::RawData(kind),
            None => TokenSinkResult::Continue,
        }
    }
}

impl TokenSink for EventSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => return self.push_tag(tag),
            Token::CharacterTokens(text) => self.push_text(&text),
            Token::CommentToken(text) => self.events.push_back(HtmlEvent::Comment(text.to_string())),
            // Doctypes, NUL characters, parse errors and EOF carry no evidence.
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

pub struct Tokenizer<'a> {
    rest: &'a str,
    queue: BufferQueue,
    inner: Html5Tokenizer<EventSink>,
    ended: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            rest: input,
            queue: BufferQueue::default(),
            inner: Html5Tokenizer::new(EventSink::default(), TokenizerOpts::default()),
            ended: false,
        }
    }

    /// Feeds the next chunk, or ends the stream once the input is consumed.
    /// Returns `false` when there is nothing left to produce.
    fn advance(&mut self) -> bool {
        if self.rest.is_empty() {
            if self.ended {
                return false;
            }
            self.inner.end();
            self.ended = true;
            return true;
        }

        let (chunk, rest) = self.rest.split_at(chunk_boundary(self.rest, CHUNK_SIZE));
        self.rest = rest;
        self.queue.push_back(StrTendril::from_slice(chunk));
        // The sink never asks for script execution, so feeding always drains the queue.
        let _ = self.inner.feed(&mut self.queue);
        true
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = HtmlEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.inner.sink.events.pop_front() {
                return Some(event);
            }
            if !self.advance() {
                return None;
            }
        }
    }
}

/// Largest char boundary at or below `max`.
fn chunk_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (1..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(name: &str, attrs: &[(&str, &str)]) -> HtmlEvent {
        HtmlEvent::StartTag {
            name: name.to_string(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            self_closing: false,
        }
    }

    fn end(name: &str) -> HtmlEvent {
        HtmlEvent::EndTag {
            name: name.to_string(),
        }
    }

    fn text(s: &str) -> HtmlEvent {
        HtmlEvent::Text(s.to_string())
    }

    #[test]
    fn test_basic_sequence() {
        let events: Vec<_> = Tokenizer::new("<p class=\"x\">Hello</p>").collect();
        assert_eq!(events, vec![start("p", &[("class", "x")]), text("Hello"), end("p")]);
    }

    #[test]
    fn test_attribute_forms() {
        let events: Vec<_> =
            Tokenizer::new("<INPUT Type=file required name='a b' accept=\"image/*\">").collect();
        assert_eq!(
            events,
            vec![start(
                "input",
                &[
                    ("type", "file"),
                    ("required", ""),
                    ("name", "a b"),
                    ("accept", "image/*"),
                ]
            )]
        );
    }

    #[test]
    fn test_self_closing() {
        let events: Vec<_> = Tokenizer::new("<img src=\"a.png\"/>").collect();
        assert_eq!(
            events,
            vec![HtmlEvent::StartTag {
                name: "img".to_string(),
                attributes: [("src".to_string(), "a.png".to_string())].into_iter().collect(),
                self_closing: true,
            }]
        );
    }

    #[test]
    fn test_script_body_is_raw_text() {
        let events: Vec<_> =
            Tokenizer::new("<script>if (a <b) { x = '<form>'; }</SCRIPT><p>").collect();
        assert_eq!(
            events,
            vec![
                start("script", &[]),
                text("if (a <b) { x = '<form>'; }"),
                end("script"),
                start("p", &[]),
            ]
        );
    }

    #[test]
    fn test_style_body_is_raw_text() {
        let events: Vec<_> = Tokenizer::new("<style>a > b { }</style>").collect();
        assert_eq!(events, vec![start("style", &[]), text("a > b { }"), end("style")]);
    }

    #[test]
    fn test_comments_and_doctype() {
        let events: Vec<_> = Tokenizer::new("<!DOCTYPE html><!-- token: abc -->text").collect();
        assert_eq!(
            events,
            vec![HtmlEvent::Comment(" token: abc ".to_string()), text("text")]
        );
    }

    #[test]
    fn test_processing_instruction_is_not_a_tag() {
        let events: Vec<_> = Tokenizer::new("<?xml version=\"1.0\"?>").collect();
        assert!(events
            .iter()
            .all(|e| !matches!(e, HtmlEvent::StartTag { .. })));
    }

    #[test]
    fn test_malformed_markup() {
        let events: Vec<_> = Tokenizer::new("a < b </> c <div").collect();
        // Stray '<' stays text, an empty end tag is dropped, an unterminated tag is lost.
        assert_eq!(events, vec![text("a < b  c ")]);
    }

    #[test]
    fn test_unterminated_comment() {
        let events: Vec<_> = Tokenizer::new("<!-- open").collect();
        assert_eq!(events, vec![HtmlEvent::Comment(" open".to_string())]);
    }

    #[test]
    fn test_character_references_decoded() {
        let events: Vec<_> = Tokenizer::new(
            "<a href=\"/x?a=1&amp;b=2\">Contrase&ntilde;a &#60;3</a>\
             <script src=\"https&#58;//evil.test/x.js\"></script>",
        )
        .collect();
        assert_eq!(
            events,
            vec![
                start("a", &[("href", "/x?a=1&b=2")]),
                text("Contraseña <3"),
                end("a"),
                start("script", &[("src", "https://evil.test/x.js")]),
                end("script"),
            ]
        );
    }

    #[test]
    fn test_large_input_spans_chunks() {
        let filler = "ñ".repeat(CHUNK_SIZE);
        let html = format!("<form>{}</form><p>", filler);
        let events: Vec<_> = Tokenizer::new(&html).collect();

        let body: String = events
            .iter()
            .filter_map(|e| match e {
                HtmlEvent::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(body, filler);
        assert_eq!(events.last(), Some(&start("p", &[])));
    }

    #[test]
    fn test_chunk_boundary_respects_chars() {
        assert_eq!(chunk_boundary("abc", 8), 3);
        assert_eq!(chunk_boundary("ñññ", 3), 2);
    }
}
