//! Execution value objects - per-node results and the request-scoped result map.

pub mod value_objects;
