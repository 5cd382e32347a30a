use std::future::Future;

use crate::error::DocSinkResult;
use crate::types::WriteInstruction;

/// Trait for systems that apply organization document writes.
///
/// [`Destination`] implementations receive the instructions produced by a single change, in
/// the order they must be applied: reconciliation writes first, placeholder cleanup after.
/// A failed write stops the pipeline; retrying is left to whoever redelivers the stream.
pub trait Destination {
    /// Returns the name of the destination.
    fn name() -> &'static str;

    /// Propagates the shutdown signal to the destination.
    ///
    /// Override this method if the destination needs to flush or release resources when the
    /// pipeline stops. The default implementation is a no-op.
    fn shutdown(&self) -> impl Future<Output = DocSinkResult<()>> + Send {
        async { Ok(()) }
    }

    /// Applies `instructions` in order.
    ///
    /// Replaces create the document when it does not exist. Deletes of missing documents must
    /// succeed.
    fn write_instructions(
        &self,
        instructions: Vec<WriteInstruction>,
    ) -> impl Future<Output = DocSinkResult<()>> + Send;
}
