//! Calendar read port

use crate::ports::mail_reader::ServiceError;
use async_trait::async_trait;
use courier_domain::{CalendarEvent, TimeRange};

/// Read access to calendar events.
#[async_trait]
pub trait CalendarReader: Send + Sync {
    /// Events overlapping the given range, in start order.
    async fn events_in_range(&self, range: TimeRange) -> Result<Vec<CalendarEvent>, ServiceError>;
}
