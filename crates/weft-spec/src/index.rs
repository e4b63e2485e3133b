// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

use weft_analysis::{Analyzer, Pass};
use weft_decor::TagList;

use crate::syntax::SourceFile;

/// Indexes the tags of every top-level declaration.
///
/// Every tool's tags are kept, not just ours; filtering by marker happens in
/// the consumers. Malformed tag lines are reported as warnings and skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecoratorIndex;

/// Declaration name to tags, in source order. Declarations without tags are absent.
#[derive(Debug, Clone, Default)]
pub struct DecoratorMap {
    entries: Vec<(String, TagList)>,
}

impl DecoratorMap {
    /// Tags of `name`.
    pub fn get(&self, name: &str) -> Option<&TagList> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, tags)| tags)
    }

    /// `(name, tags)` pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagList)> {
        self.entries.iter().map(|(n, tags)| (n.as_str(), tags))
    }

    /// Number of tagged declarations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tagged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Analyzer<SourceFile> for DecoratorIndex {
    type Output = DecoratorMap;

    fn name(&self) -> &'static str {
        "decorators"
    }

    fn run(&self, pass: &Pass<'_, SourceFile>) -> anyhow::Result<DecoratorMap> {
        let mut map = DecoratorMap::default();
        for item in &pass.unit().items {
            let scan = TagList::scan(&item.docs);
            for (_, err) in &scan.malformed {
                pass.warn(
                    item.location.clone(),
                    format!("failed to parse tag on `{}`: {}", item.name, err),
                );
            }
            if !scan.tags.is_empty() {
                map.entries.push((item.name.clone(), scan.tags));
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_analysis::{Runner, WalkOptions, analyzer};

    #[test]
    fn test_indexes_tagged_items_of_any_tool() {
        let source = r#"
/// weft:activity
pub trait Payments {}

/// lint:allow
pub fn helper() {}

/// Plain docs only.
pub struct Untagged;

/// weft:bad:
pub struct Broken;
"#;
        let unit = SourceFile::parse("billing", "billing.rs", source).unwrap();
        let runner = Runner::new(vec![analyzer(DecoratorIndex)]).unwrap();
        let outcome = runner.execute(&unit, &WalkOptions::default()).unwrap();

        let map = outcome.results.get::<DecoratorIndex>().unwrap();
        let names: Vec<&str> = map.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["Payments", "helper"]);
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(outcome.diagnostics[0].message.contains("`Broken`"));
    }
}
