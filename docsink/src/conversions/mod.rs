//! Conversions from raw CDC envelopes into normalized changes.

pub mod envelope;
pub mod row;
