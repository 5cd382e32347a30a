//! Denormalization of organization, division and unit change streams into nested organization
//! documents.
//!
//! Changes are folded into an in-memory [`store::HierarchyStore`] by the
//! [`reconciler::Reconciler`]. Children whose parent has not been seen yet are quarantined in
//! placeholder organizations, which the [`sweeper::CleanupSweeper`] removes once every division
//! they hold has reached a real organization. The resulting writes are handed to a
//! [`destination::Destination`] by the [`pipeline::Pipeline`].

mod macros;

pub mod concurrency;
pub mod conversions;
pub mod destination;
pub mod emitter;
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod reconciler;
pub mod store;
pub mod sweeper;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
