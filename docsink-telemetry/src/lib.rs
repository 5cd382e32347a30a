//! Logging setup shared by the docsink binaries and tests.

pub mod tracing;
