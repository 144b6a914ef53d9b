//! Core domain utilities

pub mod token;
