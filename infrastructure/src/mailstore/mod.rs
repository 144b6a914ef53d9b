//! Local mailbox corpus adapters

mod json_store;

pub use json_store::{JsonMailStore, MailStoreError};
