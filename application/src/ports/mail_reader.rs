//! Mail read port
//!
//! Narrow, side-effect-free reads over the user's mail. Durable state and
//! cross-request caching live behind the adapter.

use async_trait::async_trait;
use courier_domain::{MailItem, Thread};
use thiserror::Error;

/// Errors from the domain read services.
#[derive(Error, Debug, Clone)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

/// Read access to mail threads and search.
#[async_trait]
pub trait MailReader: Send + Sync {
    /// Fetch one thread with all of its messages.
    async fn get_thread(&self, id: &str) -> Result<Thread, ServiceError>;

    /// Full-text search over mail, returning at most `limit` lightweight hits.
    /// An empty query returns the most recent items.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<MailItem>, ServiceError>;
}
