// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Service extraction.
//!
//! Turns tagged traits into the [`Package`] model. Classification is done only
//! through [`Predicate`] values built by [`Classifier`].

use tracing::{debug, warn};

use weft_analysis::{Analyzer, AnalyzerRef, Location, Pass, analyzer};
use weft_decor::{Predicate, Tag, TagList};

use crate::index::DecoratorIndex;
use crate::model::{Operation, OperationKind, Package, Service, ServiceKind};
use crate::syntax::{Item, ItemKind, Member, MethodDecl, Receiver, SourceFile, doc_text};

/// Default tag marker.
pub const DEFAULT_MARKER: &str = "weft";

/// Builds the predicates that classify declarations for one marker.
#[derive(Debug, Clone)]
pub struct Classifier {
    marker: String,
}

impl Classifier {
    /// Classifier for tags rooted at `marker`.
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// The marker (tool segment).
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Any tag rooted at the marker.
    pub fn any_tag(&self) -> Predicate {
        Predicate::has_prefix([self.marker.as_str()])
    }

    /// Exactly `marker:<kind>`.
    pub fn service_kind(&self, kind: ServiceKind) -> Predicate {
        Predicate::has([self.marker.as_str(), kind.segment()])
    }

    /// Exactly `marker:workflow:<kind>`. `Method` matches nothing.
    pub fn operation_kind(&self, kind: OperationKind) -> Predicate {
        match kind.segment() {
            Some(segment) => Predicate::has([
                self.marker.as_str(),
                ServiceKind::Workflow.segment(),
                segment,
            ]),
            None => Predicate::one_of([]),
        }
    }

    /// Either `marker:service:method` or `marker:service`, where route options live.
    pub fn route(&self) -> Predicate {
        Predicate::one_of([
            Predicate::has([self.marker.as_str(), "service", "method"]),
            self.service_kind(ServiceKind::Service),
        ])
    }

    /// Top kinds requested by `tags`, in tag order, without duplicates.
    pub fn service_kinds(&self, tags: &TagList) -> Vec<ServiceKind> {
        let mut kinds = Vec::new();
        for tag in tags {
            let found = ServiceKind::ALL
                .into_iter()
                .find(|kind| self.service_kind(*kind).matches(tag));
            if let Some(kind) = found
                && !kinds.contains(&kind)
            {
                kinds.push(kind);
            }
        }
        kinds
    }

    /// Workflow operation kinds requested by `tags`, in tag order, without duplicates.
    pub fn operation_kinds(&self, tags: &TagList) -> Vec<OperationKind> {
        let mut kinds = Vec::new();
        for tag in tags {
            let found = OperationKind::WORKFLOW
                .into_iter()
                .find(|kind| self.operation_kind(*kind).matches(tag));
            if let Some(kind) = found
                && !kinds.contains(&kind)
            {
                kinds.push(kind);
            }
        }
        kinds
    }

    /// The tag carrying a service's top-level options (`task_queue=`, ...).
    pub fn top_tag<'a>(&self, service: &'a Service) -> Option<&'a Tag> {
        service.tags.find(&self.service_kind(service.kind))
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}

/// Builds the [`Package`] of a unit from its tagged traits.
#[derive(Debug, Clone, Default)]
pub struct ServiceExtractor {
    classifier: Classifier,
}

impl ServiceExtractor {
    /// Extractor for tags rooted at `marker`.
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            classifier: Classifier::new(marker),
        }
    }

    /// The classifier in use.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    fn extract_service(
        &self,
        pass: &Pass<'_, SourceFile>,
        item: &Item,
        tags: &TagList,
    ) -> Option<Service> {
        let marker = self.classifier.marker();

        if item.kind != ItemKind::Trait {
            report(
                pass,
                item.location.clone(),
                format!(
                    "`{}` is a {} tagged with `{}:`; only traits become services",
                    item.name,
                    item.kind.describe(),
                    marker
                ),
            );
            return None;
        }

        let declared_kinds = self.classifier.service_kinds(tags);
        let Some(&kind) = declared_kinds.first() else {
            report(
                pass,
                item.location.clone(),
                format!(
                    "`{}` has `{m}:` tags but none of `{m}:service`, `{m}:activity` or `{m}:workflow`",
                    item.name,
                    m = marker
                ),
            );
            return None;
        };

        let mut methods = Vec::new();
        let mut rejected = false;
        for member in &item.members {
            match member {
                Member::Method(method) => match unsupported_reason(method) {
                    None => methods.push(method),
                    Some(reason) => {
                        report(
                            pass,
                            method.location.clone(),
                            format!("`{}::{}` {}", item.name, method.name, reason),
                        );
                        rejected = true;
                    }
                },
                Member::Other { what, location } => {
                    report(
                        pass,
                        location.clone(),
                        format!("{} in `{}` is not supported in a service trait", what, item.name),
                    );
                    rejected = true;
                }
            }
        }
        if rejected {
            report(
                pass,
                item.location.clone(),
                format!("`{}` skipped: unsupported trait members", item.name),
            );
            return None;
        }

        let operations = methods
            .into_iter()
            .map(|method| self.extract_operation(pass, kind, method))
            .collect();

        Some(Service {
            name: item.name.clone(),
            docs: doc_text(&item.docs),
            tags: tags.clone(),
            kind,
            declared_kinds,
            operations,
            location: item.location.clone(),
        })
    }

    fn extract_operation(
        &self,
        pass: &Pass<'_, SourceFile>,
        service_kind: ServiceKind,
        method: &MethodDecl,
    ) -> Operation {
        let scan = TagList::scan(&method.docs);
        for (_, err) in &scan.malformed {
            report(
                pass,
                method.location.clone(),
                format!("failed to parse tag on `{}`: {}", method.name, err),
            );
        }
        let tags = scan.tags;

        let (kind, declared_kinds) = if service_kind == ServiceKind::Workflow {
            let declared = self.classifier.operation_kinds(&tags);
            let kind = declared.first().copied().unwrap_or(OperationKind::Method);
            (kind, declared)
        } else {
            (OperationKind::Method, Vec::new())
        };

        Operation {
            name: method.name.clone(),
            docs: doc_text(&method.docs),
            params: method.params.clone(),
            results: method.output.clone(),
            tags,
            kind,
            declared_kinds,
            location: method.location.clone(),
        }
    }
}

impl Analyzer<SourceFile> for ServiceExtractor {
    type Output = Package;

    fn name(&self) -> &'static str {
        "services"
    }

    fn requires(&self) -> Vec<AnalyzerRef<SourceFile>> {
        vec![analyzer(DecoratorIndex)]
    }

    fn run(&self, pass: &Pass<'_, SourceFile>) -> anyhow::Result<Package> {
        let unit = pass.unit();
        let index = pass.require::<DecoratorIndex>()?;
        let ours = self.classifier.any_tag();

        let mut services = Vec::new();
        for (name, tags) in index.iter() {
            if !tags.any(&ours) {
                continue;
            }
            let Some(item) = unit.item(name) else {
                continue;
            };
            if let Some(service) = self.extract_service(pass, item, tags) {
                debug!(
                    package = %unit.package,
                    service = %service.name,
                    kind = %service.kind,
                    operations = service.operations.len(),
                    "Extracted service"
                );
                services.push(service);
            }
        }

        Ok(Package {
            name: unit.package.clone(),
            source_path: unit.path.clone(),
            services,
        })
    }
}

fn unsupported_reason(method: &MethodDecl) -> Option<&'static str> {
    match method.receiver {
        Receiver::Ref => {}
        Receiver::None => return Some("has no `&self` receiver"),
        Receiver::RefMut => return Some("takes `&mut self`; service methods must take `&self`"),
        Receiver::Value | Receiver::Typed => {
            return Some("takes `self` by value; service methods must take `&self`");
        }
    }
    if method.generic {
        return Some("is generic");
    }
    if method.asyncness {
        return Some("is async");
    }
    None
}

fn report(pass: &Pass<'_, SourceFile>, location: Location, message: String) {
    warn!(location = %location, "{}", message);
    pass.warn(location, message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_decor::TagList;

    #[test]
    fn test_service_kinds_keep_tag_order() {
        let classifier = Classifier::default();
        let tags = TagList::parse("weft:activity\nweft:workflow\nweft:activity");
        assert_eq!(
            classifier.service_kinds(&tags),
            [ServiceKind::Activity, ServiceKind::Workflow]
        );
    }

    #[test]
    fn test_operation_kind_needs_exact_path() {
        let classifier = Classifier::default();
        let tags = TagList::parse("weft:workflow:signal:extra\nweft:workflow:query");
        assert_eq!(classifier.operation_kinds(&tags), [OperationKind::Query]);
        assert!(
            !classifier
                .operation_kind(OperationKind::Method)
                .matches(&weft_decor::parse_tag("weft:workflow").unwrap())
        );
    }

    #[test]
    fn test_custom_marker() {
        let classifier = Classifier::new("acme");
        let tags = TagList::parse("weft:service\nacme:workflow");
        assert_eq!(classifier.service_kinds(&tags), [ServiceKind::Workflow]);
        assert!(tags.any(&classifier.any_tag()));
    }
}
