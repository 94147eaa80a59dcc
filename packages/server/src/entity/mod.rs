//! Table declarations. Every table and column name of the metadata schema
//! is spelled out here; nothing is derived from record types at runtime.

pub mod entities;
pub mod entities_alt_labels;
pub mod entities_exact_matches;
pub mod files;
pub mod json_data;
pub mod typed_json_data;
