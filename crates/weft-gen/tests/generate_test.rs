// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Generation tests over fixture sources.
//!
//! Generated text is re-parsed with `syn` so assertions look at items instead
//! of formatting.

use quote::ToTokens;
use weft_analysis::{Runner, WalkOptions};
use weft_gen::{Artifact, GenOptions, Generator, analyzers};
use weft_spec::SourceFile;

const SHIPPING: &str = include_str!("fixtures/shipping.rs");
const BILLING: &str = include_str!("fixtures/billing.rs");

fn generate(package: &str, source: &str, options: &GenOptions) -> Artifact {
    let unit = SourceFile::parse(package, format!("src/{}.rs", package), source).unwrap();
    let runner = Runner::new(analyzers(options)).unwrap();
    let outcome = runner.execute(&unit, &WalkOptions::default()).unwrap();
    outcome
        .results
        .get::<Generator>()
        .unwrap()
        .clone()
        .expect("fixture declares services")
}

fn parse(artifact: &Artifact) -> syn::File {
    syn::parse_file(&artifact.text).expect("generated code should parse")
}

fn find_trait<'a>(file: &'a syn::File, name: &str) -> &'a syn::ItemTrait {
    file.items
        .iter()
        .find_map(|item| match item {
            syn::Item::Trait(t) if t.ident == name => Some(t),
            _ => None,
        })
        .unwrap_or_else(|| panic!("trait {} not generated", name))
}

fn trait_methods(item: &syn::ItemTrait) -> Vec<String> {
    item.items
        .iter()
        .filter_map(|member| match member {
            syn::TraitItem::Fn(f) => Some(f.sig.ident.to_string()),
            _ => None,
        })
        .collect()
}

fn find_impl<'a>(file: &'a syn::File, trait_name: &str, self_ty: &str) -> &'a syn::ItemImpl {
    file.items
        .iter()
        .find_map(|item| match item {
            syn::Item::Impl(i)
                if i.trait_.as_ref().is_some_and(|(_, path, _)| path.is_ident(trait_name))
                    && i.self_ty.to_token_stream().to_string() == self_ty =>
            {
                Some(i)
            }
            _ => None,
        })
        .unwrap_or_else(|| panic!("impl {} for {} not generated", trait_name, self_ty))
}

fn find_fn<'a>(file: &'a syn::File, name: &str) -> &'a syn::ItemFn {
    file.items
        .iter()
        .find_map(|item| match item {
            syn::Item::Fn(f) if f.sig.ident == name => Some(f),
            _ => None,
        })
        .unwrap_or_else(|| panic!("fn {} not generated", name))
}

fn find_struct<'a>(file: &'a syn::File, name: &str) -> &'a syn::ItemStruct {
    file.items
        .iter()
        .find_map(|item| match item {
            syn::Item::Struct(s) if s.ident == name => Some(s),
            _ => None,
        })
        .unwrap_or_else(|| panic!("struct {} not generated", name))
}

#[test]
fn test_artifact_header_and_path() {
    let artifact = generate("shipping", SHIPPING, &GenOptions::default());
    assert_eq!(artifact.path.to_str(), Some("src/shipping.gen.rs"));
    assert_eq!(artifact.package, "shipping");
    assert!(artifact.text.starts_with("// Code generated by weft-gen. DO NOT EDIT.\n"));
    assert!(artifact.text.contains("// source: src/shipping.rs"));
}

#[test]
fn test_workflow_run_exposes_get_update_and_signal() {
    let artifact = generate("shipping", SHIPPING, &GenOptions::default());
    let file = parse(&artifact);

    let run = trait_methods(find_trait(&file, "ShipmentRun"));
    for expected in ["workflow_id", "run_id", "get", "foo", "foo_async", "bar", "position"] {
        assert!(run.contains(&expected.to_string()), "missing {} in {:?}", expected, run);
    }

    let child = trait_methods(find_trait(&file, "ShipmentChildRun"));
    assert!(child.contains(&"bar".to_string()));
    assert!(child.contains(&"bar_async".to_string()));
    assert!(!child.contains(&"position".to_string()));

    let client = trait_methods(find_trait(&file, "ShipmentClient"));
    assert!(client.contains(&"execute_with_bar".to_string()));
}

#[test]
fn test_workflow_input_has_request_and_channel() {
    let artifact = generate("shipping", SHIPPING, &GenOptions::default());
    let file = parse(&artifact);

    let input = find_struct(&file, "ShipmentInput");
    let fields: Vec<String> = input
        .fields
        .iter()
        .filter_map(|f| f.ident.as_ref().map(ToString::to_string))
        .collect();
    assert_eq!(fields, ["request", "bar_channel"]);

    let accessor = file.items.iter().any(|item| match item {
        syn::Item::Impl(i) if i.trait_.is_none() => {
            i.self_ty.to_token_stream().to_string() == "ShipmentInput"
                && i.items.iter().any(|member| {
                    matches!(member, syn::ImplItem::Fn(f) if f.sig.ident == "bar_channel")
                })
        }
        _ => false,
    });
    assert!(accessor, "ShipmentInput::bar_channel not generated");
}

#[test]
fn test_signal_symbol_defined_once_and_shared() {
    let artifact = generate("shipping", SHIPPING, &GenOptions::default());
    assert_eq!(artifact.text.matches("\"shipping.Shipment.Bar\"").count(), 1);
    assert_eq!(artifact.text.matches("\"shipping-queue\"").count(), 1);

    let file = parse(&artifact);
    let call_site = find_impl(&file, "ShipmentRun", "ShipmentRunImpl");
    assert!(call_site.to_token_stream().to_string().contains("SHIPMENT_BAR_NAME"));

    let registration = find_fn(&file, "new_shipment_bar_signal_channel");
    assert!(registration.to_token_stream().to_string().contains("SHIPMENT_BAR_NAME"));
}

#[test]
fn test_tagged_struct_is_not_a_service() {
    let artifact = generate("shipping", SHIPPING, &GenOptions::default());
    let file = parse(&artifact);
    let has_order_items = file.items.iter().any(|item| match item {
        syn::Item::Trait(t) => t.ident.to_string().starts_with("Order"),
        _ => false,
    });
    assert!(!has_order_items);
}

#[test]
fn test_generation_is_deterministic() {
    let first = generate("shipping", SHIPPING, &GenOptions::default());
    let second = generate("shipping", SHIPPING, &GenOptions::default());
    assert_eq!(first.text, second.text);
    assert_eq!(first.checksum(), second.checksum());
}

#[test]
fn test_activity_proxy_and_controller() {
    let artifact = generate("billing", BILLING, &GenOptions::default());
    let file = parse(&artifact);

    assert_eq!(
        trait_methods(find_trait(&file, "PaymentsProxy")),
        ["charge", "charge_async", "refund", "refund_async"]
    );
    find_struct(&file, "PaymentsController");
    find_fn(&file, "new_payments_proxy");
    assert!(artifact.text.contains("\"billing.Payments.charge\""));

    let worker = find_struct(&file, "WorkerController");
    let fields: Vec<String> = worker
        .fields
        .iter()
        .filter_map(|f| f.ident.as_ref().map(ToString::to_string))
        .collect();
    assert_eq!(fields, ["payments"]);
}

#[test]
fn test_service_routes() {
    let artifact = generate("billing", BILLING, &GenOptions::default());
    let file = parse(&artifact);
    find_struct(&file, "InvoicesController");

    let text = artifact.text;
    assert!(text.contains("\"/invoices/:id\""));
    assert!(text.contains("\"/billing/create\""));
    assert!(text.contains("\"GET\""));
    assert!(text.contains("\"POST\""));
}

#[test]
fn test_custom_runtime_crate() {
    let options = GenOptions {
        runtime_crate: "crate::rt".to_string(),
        ..GenOptions::default()
    };
    let artifact = generate("billing", BILLING, &options);
    parse(&artifact);
    assert!(artifact.text.contains("crate :: rt :: worker :: Worker"));
    assert!(!artifact.text.contains("weft_runtime :: worker"));
}
