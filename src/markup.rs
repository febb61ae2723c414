//! Reads the fixture board's inputs back out of a rendered page.
//!
//! Only start tags are inspected. Anything the site builder does not emit
//! (comments, doctype, closing tags) is skipped, and script bodies are jumped
//! over so attribute-looking text inside them is never picked up.

use std::collections::HashMap;

use crate::fixture::FixtureRecord;

pub const CARD_CLASS: &str = "fixture-card";
pub const TIME_LABEL_CLASS: &str = "live-time";
pub const FILTER_CLASS: &str = "filter-btn";
pub const DATE_CLASS: &str = "date-item";
pub const LEAGUE_CLASS: &str = "league-item";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlItem {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    pub fixtures: Vec<FixtureRecord>,
    pub filters: Vec<ControlItem>,
    pub dates: Vec<ControlItem>,
    pub leagues: Vec<ControlItem>,
}

#[derive(Debug, Clone)]
pub struct StartTag {
    pub name: String,
    pub attrs: HashMap<String, String>,
    /// Byte offset just past the closing `>`.
    pub end: usize,
}

impl StartTag {
    pub fn has_class(&self, class: &str) -> bool {
        self.attrs
            .get("class")
            .is_some_and(|c| c.split_whitespace().any(|part| part == class))
    }

    fn attr(&self, key: &str) -> String {
        self.attrs.get(key).cloned().unwrap_or_default()
    }
}

pub fn parse_page(html: &str) -> RenderedPage {
    let mut page = RenderedPage::default();
    let mut card: Option<HashMap<String, String>> = None;

    for tag in start_tags(html) {
        if tag.has_class(CARD_CLASS) {
            if let Some(done) = card.take() {
                page.fixtures.push(FixtureRecord::from_attrs(&done));
            }
            card = Some(tag.attrs.clone());
            continue;
        }
        if tag.has_class(TIME_LABEL_CLASS) {
            if let (Some(open), Some(ts)) = (card.as_mut(), tag.attrs.get("data-timestamp")) {
                open.entry("data-timestamp".to_string())
                    .or_insert_with(|| ts.clone());
            }
            continue;
        }

        let label = text_after(html, tag.end);
        if tag.has_class(FILTER_CLASS) {
            page.filters.push(ControlItem {
                value: tag.attr("data-filter"),
                label,
            });
        } else if tag.has_class(DATE_CLASS) {
            page.dates.push(ControlItem {
                value: tag.attr("data-date"),
                label,
            });
        } else if tag.has_class(LEAGUE_CLASS) {
            page.leagues.push(ControlItem {
                value: tag.attr("data-league-id"),
                label,
            });
        }
    }
    if let Some(done) = card.take() {
        page.fixtures.push(FixtureRecord::from_attrs(&done));
    }
    page
}

pub fn start_tags(html: &str) -> Vec<StartTag> {
    let mut out = Vec::new();
    let mut pos = 0usize;
    while let Some(rel) = html[pos..].find('<') {
        let start = pos + rel;
        match parse_start_tag(html, start) {
            Some(tag) => {
                pos = tag.end;
                if tag.name == "script" || tag.name == "style" {
                    let close = format!("</{}", tag.name);
                    pos = find_ci(html, &close, pos).unwrap_or(html.len());
                }
                out.push(tag);
            }
            None => pos = start + 1,
        }
    }
    out
}

fn parse_start_tag(html: &str, start: usize) -> Option<StartTag> {
    let bytes = html.as_bytes();
    let mut i = start + 1;
    if !bytes.get(i)?.is_ascii_alphabetic() {
        return None;
    }
    let name_start = i;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-') {
        i += 1;
    }
    let name = html[name_start..i].to_ascii_lowercase();

    let mut attrs = HashMap::new();
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match bytes.get(i)? {
            b'>' => {
                return Some(StartTag {
                    name,
                    attrs,
                    end: i + 1,
                });
            }
            b'/' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let key_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let key = html[key_start..i].to_ascii_lowercase();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            attrs.insert(key, String::new());
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let value = match bytes.get(i)? {
            quote @ (b'"' | b'\'') => {
                let close = html[i + 1..].find(*quote as char)? + i + 1;
                let raw = &html[i + 1..close];
                i = close + 1;
                raw
            }
            _ => {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                &html[value_start..i]
            }
        };
        attrs.insert(key, decode_entities(value));
    }
}

/// Visible text between a start tag and the next tag.
fn text_after(html: &str, from: usize) -> String {
    let rest = &html[from..];
    let end = rest.find('<').unwrap_or(rest.len());
    let mut out = String::new();
    let mut prev_space = false;
    for ch in decode_entities(&rest[..end]).chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let needle = needle.to_ascii_lowercase();
    haystack
        .get(from..)?
        .to_ascii_lowercase()
        .find(&needle)
        .map(|idx| idx + from)
}

pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_quoted_and_bare_attributes() {
        let tags = start_tags(r#"<div class='a b' data-x="1 &amp; 2" hidden data-y=3>"#);
        assert_eq!(tags.len(), 1);
        let tag = &tags[0];
        assert!(tag.has_class("b"));
        assert_eq!(tag.attrs["data-x"], "1 & 2");
        assert_eq!(tag.attrs["hidden"], "");
        assert_eq!(tag.attrs["data-y"], "3");
    }

    #[test]
    fn skips_script_bodies() {
        let html = r#"<script>let s = '<div class="fixture-card">';</script><p class="x">"#;
        let names: Vec<_> = start_tags(html).into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["script", "p"]);
    }

    #[test]
    fn truncated_tag_is_ignored() {
        assert!(start_tags("<div class=\"fixture-card").is_empty());
    }
}
