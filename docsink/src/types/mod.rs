//! Common types used throughout docsink.
//!
//! Holds the hierarchy entities, the inbound CDC envelope, the normalized change and the
//! outbound write instruction.

mod change;
mod entity;
mod envelope;
mod instruction;

pub use change::*;
pub use entity::*;
pub use envelope::*;
pub use instruction::*;
