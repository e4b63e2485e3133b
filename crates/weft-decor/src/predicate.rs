// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Predicates over tags.
//!
//! Extraction and generation never inspect tag paths by hand; they build a
//! [`Predicate`] and evaluate it against a [`TagList`](crate::TagList).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tag::Tag;

/// A small predicate language evaluated against one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// The tag path equals these segments exactly.
    Has(Vec<String>),
    /// The tag path starts with these segments.
    HasPrefix(Vec<String>),
    /// Any of the inner predicates matches. An empty list never matches.
    OneOf(Vec<Predicate>),
}

impl Predicate {
    /// Exact path match.
    pub fn has<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::Has(path.into_iter().map(Into::into).collect())
    }

    /// Segment-wise prefix match.
    pub fn has_prefix<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::HasPrefix(path.into_iter().map(Into::into).collect())
    }

    /// Disjunction.
    pub fn one_of(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::OneOf(predicates.into_iter().collect())
    }

    /// Evaluates the predicate against a single tag.
    pub fn matches(&self, tag: &Tag) -> bool {
        match self {
            Predicate::Has(path) => tag.path_is(path),
            Predicate::HasPrefix(path) => tag.path_starts_with(path),
            Predicate::OneOf(predicates) => predicates.iter().any(|p| p.matches(tag)),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Has(path) => write!(f, "has({})", path.join(":")),
            Predicate::HasPrefix(path) => write!(f, "has_prefix({})", path.join(":")),
            Predicate::OneOf(predicates) => {
                f.write_str("one_of(")?;
                for (i, p) in predicates.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(path: &[&str]) -> Tag {
        Tag::new(path.iter().copied())
    }

    #[test]
    fn test_has_is_exact() {
        let p = Predicate::has(["weft", "workflow"]);
        assert!(p.matches(&tag(&["weft", "workflow"])));
        assert!(!p.matches(&tag(&["weft", "workflow", "signal"])));
        assert!(!p.matches(&tag(&["weft"])));
    }

    #[test]
    fn test_has_prefix_is_segment_wise() {
        let p = Predicate::has_prefix(["weft", "work"]);
        assert!(!p.matches(&tag(&["weft", "workflow"])));

        let p = Predicate::has_prefix(["weft"]);
        assert!(p.matches(&tag(&["weft", "workflow", "signal"])));
        assert!(p.matches(&tag(&["weft", "service"])));
        assert!(!p.matches(&tag(&["lint", "ignore"])));
    }

    #[test]
    fn test_one_of() {
        let p = Predicate::one_of([
            Predicate::has(["weft", "service"]),
            Predicate::has(["weft", "activity"]),
        ]);
        assert!(p.matches(&tag(&["weft", "activity"])));
        assert!(!p.matches(&tag(&["weft", "workflow"])));
        assert!(!Predicate::one_of([]).matches(&tag(&["weft", "service"])));
    }

    #[test]
    fn test_display() {
        let p = Predicate::one_of([
            Predicate::has(["weft", "service"]),
            Predicate::has_prefix(["weft"]),
        ]);
        assert_eq!(p.to_string(), "one_of(has(weft:service), has_prefix(weft))");
    }
}
