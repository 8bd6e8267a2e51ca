//! Persisted forms of an analysis result.

pub mod json;

pub use json::{from_json, to_json};
