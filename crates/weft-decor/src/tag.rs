// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tag grammar.
//!
//! ```text
//! tag     = tool ":" segment { ":" segment } { ws option }
//! tool    = [a-z0-9]+
//! option  = key "=" value { "," value }
//!         | flag
//! ```
//!
//! The first character after the tool's colon must be `[a-z0-9]`, which keeps
//! ordinary prose such as `Note: ...` out of the tag list.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::predicate::Predicate;

/// Value recorded for bare flag tokens.
pub const FLAG_VALUE: &str = "true";

/// Errors produced when a line looks like a tag but cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line does not start with `tool:segment`.
    #[error("not a tag: {0:?}")]
    NotATag(String),

    /// The namespace path contains an empty segment (`weft:workflow:`).
    #[error("empty segment in tag path {0:?}")]
    EmptySegment(String),

    /// An option has an empty key (`=value`).
    #[error("option with empty key in tag {tag:?}: {option:?}")]
    EmptyOptionKey {
        /// The tag path the option belongs to.
        tag: String,
        /// The offending option token.
        option: String,
    },
}

/// Reports whether `line` has the shape of a tag.
///
/// Leading whitespace is ignored, so raw doc comment text (`" weft:service"`)
/// can be passed as is.
pub fn is_tag(line: &str) -> bool {
    let line = line.trim_start();
    let Some(colon) = line.find(':') else {
        return false;
    };
    if colon == 0 {
        return false;
    }

    let is_tag_char = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    let bytes = line.as_bytes();
    if !bytes[..colon].iter().copied().all(is_tag_char) {
        return false;
    }

    bytes.get(colon + 1).copied().is_some_and(is_tag_char)
}

/// Parses a single tag line.
pub fn parse_tag(line: &str) -> Result<Tag, ParseError> {
    let line = line.trim();
    if !is_tag(line) {
        return Err(ParseError::NotATag(line.to_string()));
    }

    let mut tokens = line.split_whitespace();
    let key = tokens.next().unwrap_or_default();

    let path: Vec<String> = key.split(':').map(str::to_string).collect();
    if path.iter().any(String::is_empty) {
        return Err(ParseError::EmptySegment(key.to_string()));
    }

    let mut options = Options::default();
    for token in tokens {
        match token.split_once('=') {
            Some(("", _)) => {
                return Err(ParseError::EmptyOptionKey {
                    tag: key.to_string(),
                    option: token.to_string(),
                });
            }
            Some((name, values)) => {
                options.extend(name, values.split(',').filter(|v| !v.is_empty()));
            }
            None => options.extend(token, [FLAG_VALUE]),
        }
    }

    Ok(Tag { path, options })
}

/// Parses every tag line of a doc comment, ignoring everything else.
pub fn parse_doc(text: &str) -> TagList {
    TagList::parse(text)
}

/// Parses tags from already split doc lines, ignoring everything else.
pub fn parse_lines<I, S>(lines: I) -> TagList
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    TagList::scan(lines).tags
}

/// A parsed annotation tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Namespace path segments, tool first (`["weft", "workflow", "signal"]`).
    pub path: Vec<String>,
    /// Options in source order.
    pub options: Options,
}

impl Tag {
    /// Builds an option-less tag from its path segments.
    pub fn new<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            options: Options::default(),
        }
    }

    /// The tool segment (`weft` in `weft:workflow`).
    pub fn tool(&self) -> &str {
        self.path.first().map(String::as_str).unwrap_or_default()
    }

    /// The last path segment (`signal` in `weft:workflow:signal`).
    pub fn leaf(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    /// Whether the path equals `segments` exactly.
    pub fn path_is<S: AsRef<str>>(&self, segments: &[S]) -> bool {
        self.path.len() == segments.len() && self.path_starts_with(segments)
    }

    /// Whether the path starts with `segments`, compared segment by segment.
    pub fn path_starts_with<S: AsRef<str>>(&self, segments: &[S]) -> bool {
        segments.len() <= self.path.len()
            && self
                .path
                .iter()
                .zip(segments)
                .all(|(have, want)| have == want.as_ref())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path.join(":"))
    }
}

/// Ordered multi-valued options of a tag.
///
/// Keys keep the order of their first appearance and values keep source order.
/// Repeating a key appends to its values (`method=GET method=POST` is the same
/// as `method=GET,POST`). [`Options::get`] resolves duplicates first-wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    entries: Vec<(String, Vec<String>)>,
}

impl Options {
    /// Builds options from `(key, values)` pairs, merging repeated keys.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut options = Self::default();
        for (key, values) in pairs {
            options.extend(key, values);
        }
        options
    }

    /// Appends values to `key`, creating the key when missing.
    pub fn extend<K, I, V>(&mut self, key: K, values: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let key = key.into();
        let values = values.into_iter().map(Into::into);
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.extend(values),
            None => self.entries.push((key, values.collect())),
        }
    }

    /// First value recorded for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    /// First value recorded for `key`, or `fallback`.
    pub fn get_or<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.get(key).unwrap_or(fallback)
    }

    /// Every value recorded for `key` in source order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or_default()
    }

    /// Whether `key` was present, with or without a value.
    pub fn has(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Whether any of `keys` was present.
    pub fn has_any(&self, keys: &[&str]) -> bool {
        keys.iter().any(|key| self.has(key))
    }

    /// Whether `key` was given as a bare flag or explicitly set to `true`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key) == Some(FLAG_VALUE)
    }

    /// Iterates `(key, values)` in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no options.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of scanning documentation text.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    /// Tags that parsed successfully, in line order.
    pub tags: TagList,
    /// Lines shaped like tags that failed to parse, with their zero-based line index.
    pub malformed: Vec<(usize, ParseError)>,
}

/// An ordered list of tags attached to one declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagList(Vec<Tag>);

impl TagList {
    /// Parses every tag line of `text`, ignoring everything else.
    pub fn parse(text: &str) -> Self {
        Self::scan(text.lines()).tags
    }

    /// Scans lines, keeping malformed tag lines aside instead of failing.
    pub fn scan<I, S>(lines: I) -> Scan
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut scan = Scan::default();
        for (index, line) in lines.into_iter().enumerate() {
            let line = line.as_ref();
            if !is_tag(line) {
                continue;
            }
            match parse_tag(line) {
                Ok(tag) => scan.tags.0.push(tag),
                Err(err) => {
                    debug!(line = index, error = %err, "Skipping malformed tag");
                    scan.malformed.push((index, err));
                }
            }
        }
        scan
    }

    /// Iterates tags in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.0.iter()
    }

    /// Tags matching `predicate`, in order.
    pub fn filter(&self, predicate: &Predicate) -> TagList {
        TagList(
            self.0
                .iter()
                .filter(|tag| predicate.matches(tag))
                .cloned()
                .collect(),
        )
    }

    /// Whether at least one tag matches `predicate`.
    pub fn any(&self, predicate: &Predicate) -> bool {
        self.0.iter().any(|tag| predicate.matches(tag))
    }

    /// First tag matching `predicate`.
    pub fn find(&self, predicate: &Predicate) -> Option<&Tag> {
        self.0.iter().find(|tag| predicate.matches(tag))
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list holds no tags.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Tag>> for TagList {
    fn from(tags: Vec<Tag>) -> Self {
        Self(tags)
    }
}

impl FromIterator<Tag> for TagList {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TagList {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_tag() {
        let cases = [
            ("abc", false),
            ("weft:service", true),
            ("Weft:service", false),
            ("weft:Service", false),
            (":service", false),
            ("lint:1234", true),
            ("1234:lint", true),
            ("weft: service", false),
            ("weft:", false),
            ("weft:*", false),
            ("weft:x*", true),
            ("Note: this is prose", false),
            ("   weft:workflow:signal", true),
            ("see https://example.com", false),
        ];
        for (line, expected) in cases {
            assert_eq!(is_tag(line), expected, "is_tag({:?})", line);
        }
    }

    #[test]
    fn test_parse_basic_tag() {
        let tag = parse_tag("weft:service").unwrap();
        assert_eq!(tag.path, vec!["weft", "service"]);
        assert!(tag.options.is_empty());
        assert_eq!(tag.to_string(), "weft:service");
    }

    #[test]
    fn test_parse_tag_with_options() {
        let tag = parse_tag("weft:service:method method=GET path=/thing/place/:location").unwrap();
        assert_eq!(tag.path, vec!["weft", "service", "method"]);
        assert_eq!(tag.options.get("method"), Some("GET"));
        assert_eq!(tag.options.get("path"), Some("/thing/place/:location"));
    }

    #[test]
    fn test_parse_tag_ignores_extra_spaces() {
        let tag = parse_tag("weft:service:method method=GET     path=/a  ").unwrap();
        assert_eq!(tag.options.len(), 2);
        assert_eq!(tag.options.get("path"), Some("/a"));
    }

    #[test]
    fn test_repeated_keys_accumulate_and_first_wins() {
        let tag = parse_tag("weft:service:method method=GET method=POST").unwrap();
        assert_eq!(tag.options.get_all("method"), ["GET", "POST"]);
        assert_eq!(tag.options.get("method"), Some("GET"));
    }

    #[test]
    fn test_comma_separated_values() {
        let tag = parse_tag("weft:service:method method=GET,POST,,PUT").unwrap();
        assert_eq!(tag.options.get_all("method"), ["GET", "POST", "PUT"]);
    }

    #[test]
    fn test_bare_tokens_are_flags() {
        let tag = parse_tag("weft:service public task_queue=payments").unwrap();
        assert!(tag.options.flag("public"));
        assert!(!tag.options.flag("task_queue"));
        assert_eq!(tag.options.get("public"), Some(FLAG_VALUE));
    }

    #[test]
    fn test_empty_value_keeps_key() {
        let tag = parse_tag("weft:activity task_queue=").unwrap();
        assert!(tag.options.has("task_queue"));
        assert_eq!(tag.options.get("task_queue"), None);
        assert_eq!(tag.options.get_or("task_queue", "billing"), "billing");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_tag("weftservice"),
            Err(ParseError::NotATag(_))
        ));
        assert!(matches!(
            parse_tag("weft:workflow:"),
            Err(ParseError::EmptySegment(_))
        ));
        assert!(matches!(
            parse_tag("weft:workflow =x"),
            Err(ParseError::EmptyOptionKey { .. })
        ));
    }

    #[test]
    fn test_path_queries() {
        let tag = parse_tag("weft:workflow:signal").unwrap();
        assert_eq!(tag.tool(), "weft");
        assert_eq!(tag.leaf(), "signal");
        assert!(tag.path_is(&["weft", "workflow", "signal"]));
        assert!(!tag.path_is(&["weft", "workflow"]));
        assert!(tag.path_starts_with(&["weft", "workflow"]));
        assert!(!tag.path_starts_with(&["weft", "work"]));
    }

    #[test]
    fn test_scan_is_tolerant() {
        let doc = "Charges a card.\n\nweft:activity:method\nweft:bad:\nNote: retried";
        let scan = TagList::scan(doc.lines());
        assert_eq!(scan.tags.len(), 1);
        assert_eq!(scan.malformed.len(), 1);
        assert_eq!(scan.malformed[0].0, 3);
    }

    #[test]
    fn test_options_from_pairs_merges() {
        let options = Options::from_pairs([
            ("method", vec!["GET"]),
            ("path", vec!["/a"]),
            ("method", vec!["POST"]),
        ]);
        let keys: Vec<&str> = options.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["method", "path"]);
        assert_eq!(options.get_all("method"), ["GET", "POST"]);
    }
}
