mod daily_scheduler;

pub use daily_scheduler::DailyScheduler;
pub(crate) use daily_scheduler::target_delay;

use async_trait::async_trait;
use chrono::{NaiveTime, Timelike};

/// Wall-clock time of day at which the daily notification fires.
/// Sub-second precision is dropped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireTime(NaiveTime);

impl FireTime {
    pub fn new(inner: NaiveTime) -> Self {
        let normalized = inner.with_nanosecond(0).expect("always in range");
        Self(normalized)
    }

    pub fn time(&self) -> &NaiveTime {
        &self.0
    }
}

/// What the fire step needs to do its work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub city: String,
}

/// One save of the notification settings. Enablement is routed by the
/// caller: enabled saves go to [`DailyScheduler::schedule`], disabled ones
/// to [`DailyScheduler::cancel`].
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub city: String,
    pub fire_at: FireTime,
}

impl ScheduleRequest {
    pub fn new(city: impl Into<String>, fire_at: FireTime) -> Self {
        Self {
            city: city.into(),
            fire_at,
        }
    }
}

/// Performed once per fire, outside the scheduler's control flow. An `Err`
/// means the attempt is dropped; the scheduler never retries or re-arms.
#[async_trait]
pub trait NotificationWorker: Send + Sync + 'static {
    async fn fire(&self, payload: &NotificationPayload) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests;
