//! Clock port: abstracts `now()` and timer scheduling so tests can drive
//! virtual time with `tokio::time::pause()`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Suspend the calling task for `duration`. Cancellation is expressed by
    /// dropping the future the caller is awaiting (e.g. inside a `tokio::select!`).
    async fn sleep(&self, duration: Duration);
}

/// The real wall clock, backed by `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
