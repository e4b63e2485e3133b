// Shipment workflow used by the generation tests.

use weft_runtime::workflow::Context;

/// Order shipment.
///
/// weft:workflow task_queue=shipping-queue
pub trait Shipment {
    /// weft:workflow:execute
    fn execute(&self, ctx: &Context, req: Order) -> Result<Receipt, Error>;

    /// Change the delivery address while the shipment is in flight.
    ///
    /// weft:workflow:update
    #[allow(non_snake_case)]
    fn Foo(&self, ctx: &Context, req: AddressChange) -> Result<Address, Error>;

    /// weft:workflow:signal
    #[allow(non_snake_case)]
    fn Bar(&self, ctx: &Context, req: CancelRequest);

    /// weft:workflow:query
    fn position(&self, req: ()) -> Position;
}

/// Not a service: tags on structs are ignored.
///
/// weft:workflow
pub struct Order {
    pub id: String,
}
