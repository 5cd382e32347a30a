mod hierarchy;
pub mod snapshot;

pub use hierarchy::HierarchyStore;
