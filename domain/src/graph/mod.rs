//! Execution graph - the DAG of information needs produced by decomposition.

pub mod entities;
pub mod strategy_method;
pub mod validation;
