use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};

/// Represents an entity responsible for providing dates across application. This allows
/// commands that depend on "today" and request pacing to be tested.
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn today(&self) -> NaiveDate;

    async fn sleep(&self, duration: Duration);
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock pinned to a single day. Sleeping returns immediately.
#[derive(Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

#[async_trait]
impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }

    async fn sleep(&self, _duration: Duration) {}
}
