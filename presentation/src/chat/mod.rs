//! Interactive chat interface

mod repl;

pub use repl::ChatRepl;
