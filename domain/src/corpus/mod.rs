//! Communication corpus entities
//!
//! Read-only views of the data held by external mail and calendar services.
//! Nothing in this module persists; instances live for one request.

pub mod entities;
