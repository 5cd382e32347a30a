//! Shared configuration types for the docsink pipeline and replicator.

mod base;
mod destination;
mod hierarchy;
mod pipeline;
mod replicator;
mod snapshot;
mod source;

pub use base::ValidationError;
pub use destination::DestinationConfig;
pub use hierarchy::{HierarchyConfig, TableMappingConfig};
pub use pipeline::PipelineConfig;
pub use replicator::ReplicatorConfig;
pub use snapshot::SnapshotConfig;
pub use source::SourceConfig;
