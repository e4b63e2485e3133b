// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Weft Decor - Annotation Tags in Doc Comments
//!
//! Declarations opt into code generation with structured tags written on their
//! own line inside a doc comment:
//!
//! ```text
//! /// Charges the customer's payment method.
//! ///
//! /// weft:workflow:update
//! /// weft:service:method path=/billing/charge method=GET,POST public
//! ```
//!
//! A tag is a colon separated namespace path (`weft:workflow:update`) followed
//! by whitespace separated options. Options are `key=value` pairs, where a value
//! may hold several comma separated entries, or bare tokens that act as boolean
//! flags.
//!
//! Parsing is tolerant: lines that are not tags are ignored. Classification of
//! declarations is done exclusively through [`Predicate`] values evaluated
//! against a parsed [`TagList`].
//!
//! # Modules
//!
//! - [`tag`]: tag grammar, options and the ordered tag list
//! - [`predicate`]: the predicate language used to query tag lists

#![deny(missing_docs)]

/// Tag grammar, options and the ordered tag list.
pub mod tag;

/// Predicate language for classifying tagged declarations.
pub mod predicate;

pub use predicate::Predicate;
pub use tag::{
    FLAG_VALUE, Options, ParseError, Scan, Tag, TagList, is_tag, parse_doc, parse_lines, parse_tag,
};
