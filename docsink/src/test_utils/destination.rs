use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::bail;
use crate::destination::Destination;
use crate::destination::memory::MemoryDestination;
use crate::error::{DocSinkResult, ErrorKind};
use crate::types::WriteInstruction;

/// Destination that delegates to a [`MemoryDestination`] and fails every write after the
/// first `successful_writes` ones. Its shutdown can be made to fail as well.
#[derive(Debug, Clone)]
pub struct FailingDestination {
    inner: MemoryDestination,
    successful_writes: usize,
    writes: Arc<AtomicUsize>,
    fail_shutdown: bool,
}

impl FailingDestination {
    pub fn new(successful_writes: usize) -> Self {
        Self {
            inner: MemoryDestination::new(),
            successful_writes,
            writes: Arc::new(AtomicUsize::new(0)),
            fail_shutdown: false,
        }
    }

    /// Makes [`Destination::shutdown`] fail.
    pub fn with_failing_shutdown(mut self) -> Self {
        self.fail_shutdown = true;
        self
    }

    /// Returns the destination holding the writes that succeeded.
    pub fn inner(&self) -> &MemoryDestination {
        &self.inner
    }
}

impl Destination for FailingDestination {
    fn name() -> &'static str {
        "failing"
    }

    async fn shutdown(&self) -> DocSinkResult<()> {
        if self.fail_shutdown {
            bail!(
                ErrorKind::DestinationError,
                "Destination failed to flush on shutdown"
            );
        }

        Ok(())
    }

    async fn write_instructions(&self, instructions: Vec<WriteInstruction>) -> DocSinkResult<()> {
        let write = self.writes.fetch_add(1, Ordering::SeqCst);
        if write >= self.successful_writes {
            bail!(
                ErrorKind::DestinationError,
                "Destination rejected the write",
                format!("write number {}", write + 1)
            );
        }

        self.inner.write_instructions(instructions).await
    }
}
