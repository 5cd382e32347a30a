//! Builders and doubles for testing the hierarchy engine and the pipeline.
//!
//! Envelopes built here follow the default table mapping (`organization`, `division`, `unit`
//! with `organization_id` and `division_id` foreign keys).

pub mod destination;
pub mod envelope;
pub mod pipeline;
