// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Source front end.
//!
//! Parses a Rust file with `syn` and lowers the parts the extractor needs into
//! plain data. The lowered tree owns no `syn` values, so it can be shared with
//! analyzers running on other threads.

use proc_macro2::Span;
use quote::ToTokens;
use std::path::{Component, Path, PathBuf};
use syn::spanned::Spanned;
use syn::{Attribute, Expr, FnArg, GenericArgument, Lit, Pat, PathArguments, ReturnType, Type};
use tracing::{debug, info};

use weft_analysis::Location;

use crate::error::LoadError;
use crate::model::{Param, TypeRef};

/// Default pattern used when none is given.
pub const DEFAULT_PATTERN: &str = "**/*.rs";

/// Suffix of generated files, which are never loaded back.
pub const GENERATED_SUFFIX: &str = ".gen.rs";

/// What kind of top-level item a declaration is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// `trait`.
    Trait,
    /// `struct`.
    Struct,
    /// `enum`.
    Enum,
    /// `type` alias.
    TypeAlias,
    /// Free `fn`.
    Function,
    /// Any other named item (const, static, mod, union, ...).
    Other,
}

impl ItemKind {
    /// Lowercase description for diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            ItemKind::Trait => "trait",
            ItemKind::Struct => "struct",
            ItemKind::Enum => "enum",
            ItemKind::TypeAlias => "type alias",
            ItemKind::Function => "function",
            ItemKind::Other => "item",
        }
    }
}

/// How a trait method takes `self`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// No receiver (associated function).
    None,
    /// `&self`.
    Ref,
    /// `&mut self`.
    RefMut,
    /// `self` or `mut self`.
    Value,
    /// `self: Type`.
    Typed,
}

/// A trait method signature.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    /// Method name.
    pub name: String,
    /// Raw doc lines.
    pub docs: Vec<String>,
    /// Receiver form.
    pub receiver: Receiver,
    /// Whether the method declares generic parameters.
    pub generic: bool,
    /// Whether the method is `async`.
    pub asyncness: bool,
    /// Parameters after the receiver.
    pub params: Vec<Param>,
    /// Results: empty for `()`, `[T, E]` for `Result<T, E>`, otherwise one.
    pub output: Vec<Param>,
    /// Position of the method name.
    pub location: Location,
}

/// A member of a trait body.
#[derive(Debug, Clone)]
pub enum Member {
    /// A method signature.
    Method(MethodDecl),
    /// Associated const, type or macro.
    Other {
        /// Description of the member (`associated type`, ...).
        what: &'static str,
        /// Position of the member.
        location: Location,
    },
}

/// A named top-level item.
#[derive(Debug, Clone)]
pub struct Item {
    /// Item name.
    pub name: String,
    /// What the item is.
    pub kind: ItemKind,
    /// Raw doc lines.
    pub docs: Vec<String>,
    /// Position of the item name.
    pub location: Location,
    /// Trait members, empty for other kinds.
    pub members: Vec<Member>,
}

/// One parsed compilation unit.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Package name derived from the path.
    pub package: String,
    /// Path relative to the working directory, `/` separated.
    pub path: String,
    /// Named top-level items in source order.
    pub items: Vec<Item>,
}

impl SourceFile {
    /// Parses `source` and lowers its top-level items.
    pub fn parse(
        package: impl Into<String>,
        path: impl Into<String>,
        source: &str,
    ) -> Result<Self, LoadError> {
        let path = path.into();
        let file = syn::parse_file(source).map_err(|err| {
            let start = err.span().start();
            LoadError::Parse {
                path: path.clone(),
                line: start.line,
                column: start.column,
                message: err.to_string(),
            }
        })?;

        let items = file
            .items
            .iter()
            .filter_map(|item| lower_item(&path, item))
            .collect();

        Ok(Self {
            package: package.into(),
            path,
            items,
        })
    }

    /// Directory of the file relative to the working directory (`""` at the root).
    pub fn dir(&self) -> &str {
        self.path.rsplit_once('/').map_or("", |(dir, _)| dir)
    }

    /// Looks an item up by name.
    pub fn item(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.name == name)
    }
}

fn lower_item(path: &str, item: &syn::Item) -> Option<Item> {
    let (ident, kind, attrs) = match item {
        syn::Item::Trait(t) => (&t.ident, ItemKind::Trait, &t.attrs),
        syn::Item::Struct(s) => (&s.ident, ItemKind::Struct, &s.attrs),
        syn::Item::Enum(e) => (&e.ident, ItemKind::Enum, &e.attrs),
        syn::Item::Type(t) => (&t.ident, ItemKind::TypeAlias, &t.attrs),
        syn::Item::Fn(f) => (&f.sig.ident, ItemKind::Function, &f.attrs),
        syn::Item::Union(u) => (&u.ident, ItemKind::Other, &u.attrs),
        syn::Item::Const(c) => (&c.ident, ItemKind::Other, &c.attrs),
        syn::Item::Static(s) => (&s.ident, ItemKind::Other, &s.attrs),
        syn::Item::Mod(m) => (&m.ident, ItemKind::Other, &m.attrs),
        _ => return None,
    };

    let members = match item {
        syn::Item::Trait(t) => t.items.iter().map(|m| lower_member(path, m)).collect(),
        _ => Vec::new(),
    };

    Some(Item {
        name: ident.to_string(),
        kind,
        docs: doc_lines(attrs),
        location: location(path, ident.span()),
        members,
    })
}

fn lower_member(path: &str, member: &syn::TraitItem) -> Member {
    let (what, span) = match member {
        syn::TraitItem::Fn(f) => return Member::Method(lower_method(path, f)),
        syn::TraitItem::Const(c) => ("associated const", c.ident.span()),
        syn::TraitItem::Type(t) => ("associated type", t.ident.span()),
        syn::TraitItem::Macro(m) => ("macro invocation", m.span()),
        other => ("trait member", other.span()),
    };
    Member::Other {
        what,
        location: location(path, span),
    }
}

fn lower_method(path: &str, method: &syn::TraitItemFn) -> MethodDecl {
    let sig = &method.sig;

    let mut receiver = Receiver::None;
    let mut params = Vec::new();
    for input in &sig.inputs {
        match input {
            FnArg::Receiver(r) => {
                receiver = if r.colon_token.is_some() {
                    Receiver::Typed
                } else {
                    match (&r.reference, &r.mutability) {
                        (Some(_), None) => Receiver::Ref,
                        (Some(_), Some(_)) => Receiver::RefMut,
                        (None, _) => Receiver::Value,
                    }
                };
            }
            FnArg::Typed(pat_type) => {
                let name = match pat_type.pat.as_ref() {
                    Pat::Ident(ident) => Some(ident.ident.to_string()),
                    _ => None,
                };
                params.push(Param {
                    name,
                    ty: type_ref(&pat_type.ty),
                });
            }
        }
    }

    MethodDecl {
        name: sig.ident.to_string(),
        docs: doc_lines(&method.attrs),
        receiver,
        generic: !sig.generics.params.is_empty() || sig.generics.where_clause.is_some(),
        asyncness: sig.asyncness.is_some(),
        params,
        output: split_output(&sig.output),
        location: location(path, sig.ident.span()),
    }
}

/// Splits a return type into results.
///
/// `Result<T, E>` becomes `[T, E]`. A single-argument alias such as
/// `anyhow::Result<T>` becomes `[T, anyhow::Error]`, following the usual
/// `type Result<T> = std::result::Result<T, Error>` convention.
fn split_output(output: &ReturnType) -> Vec<Param> {
    let ReturnType::Type(_, ty) = output else {
        return Vec::new();
    };

    if let Type::Tuple(tuple) = ty.as_ref()
        && tuple.elems.is_empty()
    {
        return Vec::new();
    }

    let Type::Path(type_path) = ty.as_ref() else {
        return vec![Param::unnamed(type_ref(ty))];
    };
    let Some(segment) = type_path.path.segments.last() else {
        return vec![Param::unnamed(type_ref(ty))];
    };
    if segment.ident != "Result" {
        return vec![Param::unnamed(type_ref(ty))];
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return vec![Param::unnamed(type_ref(ty))];
    };

    let types: Vec<&Type> = args
        .args
        .iter()
        .filter_map(|arg| match arg {
            GenericArgument::Type(t) => Some(t),
            _ => None,
        })
        .collect();

    match types.as_slice() {
        [ok, err] => vec![Param::unnamed(type_ref(ok)), Param::unnamed(type_ref(err))],
        [ok] => {
            let mut error_path = type_path.path.clone();
            if let Some(last) = error_path.segments.last_mut() {
                last.ident = syn::Ident::new("Error", last.ident.span());
                last.arguments = PathArguments::None;
            }
            vec![
                Param::unnamed(type_ref(ok)),
                Param::unnamed(TypeRef::new(error_path.to_token_stream().to_string())),
            ]
        }
        _ => vec![Param::unnamed(type_ref(ty))],
    }
}

fn type_ref(ty: &Type) -> TypeRef {
    TypeRef::new(ty.to_token_stream().to_string())
}

/// Collects `#[doc = "..."]` values, one entry per line.
fn doc_lines(attrs: &[Attribute]) -> Vec<String> {
    let mut lines = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        let syn::Meta::NameValue(nv) = &attr.meta else {
            continue;
        };
        if let Expr::Lit(expr) = &nv.value
            && let Lit::Str(s) = &expr.lit
        {
            let value = s.value();
            if value.is_empty() {
                lines.push(String::new());
            } else {
                lines.extend(value.lines().map(str::to_string));
            }
        }
    }
    lines
}

/// Joins raw doc lines into documentation text, dropping the conventional
/// single leading space.
pub fn doc_text(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| line.strip_prefix(' ').unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn location(path: &str, span: Span) -> Location {
    let start = span.start();
    Location::new(path, start.line, start.column)
}

/// Where and what to load.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Working directory patterns are resolved against.
    pub cwd: PathBuf,
    /// Glob patterns relative to `cwd`. Empty means [`DEFAULT_PATTERN`].
    pub patterns: Vec<String>,
}

impl LoadConfig {
    /// Loads everything under `cwd` with the default pattern.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            patterns: Vec::new(),
        }
    }
}

/// Resolves the configured patterns and parses every matching file.
///
/// Generated files and anything under a `target` directory are skipped.
/// Files are returned sorted by path.
pub fn load_units(config: &LoadConfig) -> Result<Vec<SourceFile>, LoadError> {
    let default_patterns = [DEFAULT_PATTERN.to_string()];
    let patterns: &[String] = if config.patterns.is_empty() {
        &default_patterns
    } else {
        &config.patterns
    };

    let mut paths = Vec::new();
    for pattern in patterns {
        let full = config.cwd.join(pattern);
        let entries = glob::glob(&full.to_string_lossy()).map_err(|source| {
            LoadError::Pattern {
                pattern: pattern.clone(),
                source,
            }
        })?;
        for entry in entries {
            let path = entry.map_err(|err| LoadError::Io {
                path: err.path().to_path_buf(),
                source: err.into_error(),
            })?;
            if path.is_file() && !is_skipped(&config.cwd, &path) {
                paths.push(path);
            }
        }
    }
    paths.sort();
    paths.dedup();

    let mut units = Vec::with_capacity(paths.len());
    for path in paths {
        let rel = relative_path(&config.cwd, &path);
        let source = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        let package = package_name(Path::new(&rel), &config.cwd);
        debug!(path = %rel, package = %package, "Parsing source file");
        units.push(SourceFile::parse(package, rel, &source)?);
    }

    info!(units = units.len(), "Loaded source files");
    Ok(units)
}

fn is_skipped(cwd: &Path, path: &Path) -> bool {
    let rel = path.strip_prefix(cwd).unwrap_or(path);
    let generated = rel
        .file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with(GENERATED_SUFFIX));
    let in_target = rel
        .components()
        .any(|c| matches!(c, Component::Normal(name) if name == "target"));
    generated || in_target
}

fn relative_path(cwd: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(cwd).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Derives the package name of a file.
///
/// `orders.rs` is `orders`; `orders/mod.rs` is `orders`; `billing/src/lib.rs`
/// is `billing`. Dashes become underscores.
pub fn package_name(rel: &Path, cwd: &Path) -> String {
    let stem = rel
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let dir_name = |p: Option<&Path>| {
        p.and_then(Path::file_name)
            .map(|s| s.to_string_lossy().into_owned())
    };

    let name = match stem.as_str() {
        "mod" => dir_name(rel.parent()),
        "lib" | "main" => {
            let parent = rel.parent();
            match dir_name(parent) {
                Some(dir) if dir == "src" => {
                    dir_name(parent.and_then(Path::parent)).or_else(|| dir_name(Some(cwd)))
                }
                other => other,
            }
        }
        _ => Some(stem.clone()),
    };

    name.or_else(|| dir_name(Some(cwd)))
        .unwrap_or(stem)
        .replace('-', "_")
}
