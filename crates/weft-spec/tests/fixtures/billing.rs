use weft_runtime::activity::Context;

pub struct ChargeRequest {
    pub cents: u64,
}

pub struct ChargeReceipt {
    pub id: String,
}

/// Card payments.
///
/// weft:activity
pub trait Payments {
    /// weft:activity:method
    fn charge(&self, ctx: &Context, req: ChargeRequest) -> anyhow::Result<ChargeReceipt>;

    fn refund(&self, ctx: &Context, req: ChargeReceipt) -> anyhow::Result<()>;
}

/// Invoice lookups over HTTP.
///
/// weft:service
pub trait Invoices {
    /// weft:service:method path=/billing/invoices/:id method=GET
    fn get(&self, ctx: &Context, req: String) -> anyhow::Result<ChargeReceipt>;

    fn create(&self, ctx: &Context, req: ChargeRequest) -> anyhow::Result<ChargeReceipt>;
}

/// weft:activity
pub trait Generic {
    fn run<T>(&self, ctx: &Context, req: T);

    const LIMIT: usize;
}
