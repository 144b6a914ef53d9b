//! Use cases - the three pipeline layers and their composition.

pub mod decompose_query;
pub mod execute_graph;
pub mod process_query;
pub mod strategies;
pub mod synthesize_answer;
