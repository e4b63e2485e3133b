// Activity and plain service used by the generation tests.

use weft_runtime::activity::Context;

/// weft:activity task_queue=billing
pub trait Payments {
    fn charge(&self, ctx: &Context, req: Charge) -> anyhow::Result<PaymentReceipt>;

    fn refund(&self, ctx: &Context, req: Refund);
}

/// weft:service
pub trait Invoices {
    /// weft:service:method path=/invoices/:id method=GET
    fn fetch(&self, ctx: &weft_runtime::http::Context, req: String) -> Invoice;

    fn create(&self, ctx: &weft_runtime::http::Context, req: NewInvoice) -> Invoice;
}
