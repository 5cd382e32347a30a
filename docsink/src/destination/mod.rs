mod base;
pub mod json_lines;
pub mod memory;

pub use base::Destination;
