// Declares two service kinds on one trait, which strict generation rejects.

/// weft:workflow
/// weft:activity
pub trait Ambiguous {
    /// weft:workflow:execute
    fn execute(&self, ctx: &Context, req: Job);
}
