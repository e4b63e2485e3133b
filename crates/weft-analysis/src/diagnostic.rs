// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::Serialize;
use std::fmt;

/// Severity of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The affected declaration was skipped; the unit still succeeds.
    Warning,
    /// An analyzer failed while running in continue-on-error mode.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A source position, one-based line and zero-based column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    /// File path relative to the working directory.
    pub file: String,
    /// Line number (1-based).
    pub line: usize,
    /// Column (0-based, in characters).
    pub column: usize,
}

impl Location {
    /// Creates a location.
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A recoverable problem found while analyzing a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// How serious the problem is.
    pub severity: Severity,
    /// Where it was found, when known.
    pub location: Option<Location>,
    /// Human readable description.
    pub message: String,
    /// Name of the analyzer that reported it.
    pub analyzer: &'static str,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(
                f,
                "{}: {} [{}]: {}",
                location, self.severity, self.analyzer, self.message
            ),
            None => write!(f, "{} [{}]: {}", self.severity, self.analyzer, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_location() {
        let diagnostic = Diagnostic {
            severity: Severity::Warning,
            location: Some(Location::new("src/orders.rs", 12, 4)),
            message: "tagged declaration is not a trait".to_string(),
            analyzer: "services",
        };
        assert_eq!(
            diagnostic.to_string(),
            "src/orders.rs:12:4: warning [services]: tagged declaration is not a trait"
        );
    }

    #[test]
    fn test_display_without_location() {
        let diagnostic = Diagnostic {
            severity: Severity::Error,
            location: None,
            message: "boom".to_string(),
            analyzer: "generate",
        };
        assert_eq!(diagnostic.to_string(), "error [generate]: boom");
    }
}
