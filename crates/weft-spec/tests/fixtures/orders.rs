//! Order fulfilment workflows.

use weft_runtime::workflow::Context;

pub struct OrderRequest {
    pub order_id: String,
}

pub struct OrderReceipt {
    pub total_cents: u64,
}

pub struct AddressChange {
    pub line1: String,
}

pub struct Status {
    pub state: String,
}

#[derive(Debug)]
pub struct FulfilmentError;

/// Drives an order from payment to shipment.
///
/// weft:workflow task_queue=fulfilment
pub trait Fulfilment {
    /// Runs the order to completion.
    ///
    /// weft:workflow:execute
    fn execute(&self, ctx: &Context, req: OrderRequest) -> Result<OrderReceipt, FulfilmentError>;

    /// weft:workflow:update
    fn change_address(&self, ctx: &Context, req: AddressChange) -> Result<Status, FulfilmentError>;

    /// weft:workflow:query
    fn status(&self, req: ()) -> Result<Status, FulfilmentError>;

    /// Cancels the order if it has not shipped yet.
    ///
    /// weft:workflow:signal
    fn cancel(&self, ctx: &Context, req: String);

    /// Helper without a workflow tag.
    fn describe(&self, ctx: &Context);
}

/// weft:workflow
pub struct NotATrait;

/// weft:workflow
pub trait Mutating {
    /// weft:workflow:execute
    fn execute(&mut self, ctx: &Context, req: OrderRequest);
}

/// Just documentation, no tags.
pub trait Untagged {
    fn noop(&self);
}
