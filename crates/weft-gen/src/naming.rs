// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Deterministic names for generated items.
//!
//! Every generated identifier and every symbolic name goes through this
//! module, so call sites and registration sites cannot drift apart.

use heck::{ToShoutySnakeCase, ToSnakeCase};

/// Suffix of private implementations of generated traits.
pub const IMPL_SUFFIX: &str = "Impl";

/// Constant holding the package name.
pub const PACKAGE_CONSTANT: &str = "PACKAGE_NAME";

/// Symbolic name of a service: `<package>.<service>`.
pub fn service_symbol(package: &str, service: &str) -> String {
    format!("{}.{}", package, service)
}

/// Symbolic name of an operation: `<package>.<service>.<operation>`.
///
/// The operation name is kept exactly as declared.
pub fn operation_symbol(package: &str, service: &str, operation: &str) -> String {
    format!("{}.{}.{}", package, service, operation)
}

/// `{SERVICE}_NAME`.
pub fn service_constant(service: &str) -> String {
    format!("{}_NAME", service.to_shouty_snake_case())
}

/// `{SERVICE}_{OPERATION}_NAME`.
pub fn operation_constant(service: &str, operation: &str) -> String {
    format!(
        "{}_{}_NAME",
        service.to_shouty_snake_case(),
        operation.to_shouty_snake_case()
    )
}

/// `{SERVICE}_TASK_QUEUE`.
pub fn task_queue_constant(service: &str) -> String {
    format!("{}_TASK_QUEUE", service.to_shouty_snake_case())
}

/// Generated method name of an operation.
pub fn method(operation: &str) -> String {
    operation.to_snake_case()
}

/// Non-blocking variant of a generated method.
pub fn async_method(operation: &str) -> String {
    format!("{}_async", method(operation))
}

/// Accessor for a signal channel on a workflow input.
pub fn channel_method(operation: &str) -> String {
    format!("{}_channel", method(operation))
}

/// Signal-with-start entry point on a workflow client.
pub fn execute_with(operation: &str) -> String {
    format!("execute_with_{}", method(operation))
}

/// Signal channel provider function.
pub fn signal_channel_provider(service: &str, operation: &str) -> String {
    format!(
        "new_{}_{}_signal_channel",
        service.to_snake_case(),
        operation.to_snake_case()
    )
}

/// Field or accessor named after a service (`order_sync` for `OrderSync`).
pub fn service_field(service: &str) -> String {
    service.to_snake_case()
}

/// Constructor function for a generated trait object (`new_{snake}`).
pub fn constructor(type_name: &str) -> String {
    format!("new_{}", type_name.to_snake_case())
}

/// Private implementation of a generated trait.
pub fn implementation(type_name: &str) -> String {
    format!("{}{}", type_name, IMPL_SUFFIX)
}

/// Names of the per-service generated types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNames {
    service: String,
}

impl TypeNames {
    /// Names derived from the service trait `service`.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn suffixed(&self, suffix: &str) -> String {
        format!("{}{}", self.service, suffix)
    }

    /// `{S}Proxy`.
    pub fn proxy(&self) -> String {
        self.suffixed("Proxy")
    }

    /// `{S}Run`.
    pub fn run(&self) -> String {
        self.suffixed("Run")
    }

    /// `{S}ChildRun`.
    pub fn child_run(&self) -> String {
        self.suffixed("ChildRun")
    }

    /// `{S}ExternalRun`.
    pub fn external_run(&self) -> String {
        self.suffixed("ExternalRun")
    }

    /// `{S}Client`.
    pub fn client(&self) -> String {
        self.suffixed("Client")
    }

    /// `{S}ChildClient`.
    pub fn child_client(&self) -> String {
        self.suffixed("ChildClient")
    }

    /// `{S}Input`.
    pub fn input(&self) -> String {
        self.suffixed("Input")
    }

    /// `{S}Factory`.
    pub fn factory(&self) -> String {
        self.suffixed("Factory")
    }

    /// `{S}Controller`.
    pub fn controller(&self) -> String {
        self.suffixed("Controller")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_keep_declared_case() {
        assert_eq!(service_symbol("orders", "Fulfilment"), "orders.Fulfilment");
        assert_eq!(
            operation_symbol("orders", "Fulfilment", "Bar"),
            "orders.Fulfilment.Bar"
        );
    }

    #[test]
    fn test_constants() {
        assert_eq!(service_constant("OrderSync"), "ORDER_SYNC_NAME");
        assert_eq!(
            operation_constant("OrderSync", "change_address"),
            "ORDER_SYNC_CHANGE_ADDRESS_NAME"
        );
        assert_eq!(operation_constant("S", "Bar"), "S_BAR_NAME");
        assert_eq!(task_queue_constant("OrderSync"), "ORDER_SYNC_TASK_QUEUE");
    }

    #[test]
    fn test_method_forms() {
        assert_eq!(method("ChangeAddress"), "change_address");
        assert_eq!(async_method("Foo"), "foo_async");
        assert_eq!(channel_method("Bar"), "bar_channel");
        assert_eq!(execute_with("Cancel"), "execute_with_cancel");
        assert_eq!(
            signal_channel_provider("OrderSync", "Cancel"),
            "new_order_sync_cancel_signal_channel"
        );
    }

    #[test]
    fn test_type_names() {
        let names = TypeNames::new("Fulfilment");
        assert_eq!(names.run(), "FulfilmentRun");
        assert_eq!(names.child_client(), "FulfilmentChildClient");
        assert_eq!(implementation(&names.run()), "FulfilmentRunImpl");
        assert_eq!(constructor(&names.client()), "new_fulfilment_client");
    }
}
