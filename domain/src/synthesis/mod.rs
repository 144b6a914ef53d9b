//! Synthesis - compression of node results and the final answer value objects.

pub mod compression;
pub mod value_objects;
