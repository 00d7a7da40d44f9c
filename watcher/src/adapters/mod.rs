//! Status API adapter trait.
//!
//! The poller only ever talks to a `StatusApi`; the concrete HTTP client
//! lives in `practicum`.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::PollError;

pub mod practicum;

#[async_trait]
pub trait StatusApi: Send + Sync {
    /// Fetch every homework updated at or after `from_date` (Unix seconds).
    ///
    /// Returns the parsed body unmodified. Transport problems, non-OK
    /// statuses and embedded error markers come back as `PollError`.
    async fn fetch(&self, from_date: i64) -> Result<Value, PollError>;
}
