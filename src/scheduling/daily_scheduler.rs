use std::sync::Arc;

use chrono::{NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;
use tokio::{
    sync::Mutex,
    task::{self, JoinHandle},
};
use tokio_util::sync::CancellationToken;

use super::{FireTime, NotificationPayload, NotificationWorker, ScheduleRequest};

struct ScheduledSlot {
    payload: NotificationPayload,
    fire_at: FireTime,
    task: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

impl ScheduledSlot {
    async fn cancel(self) {
        self.cancellation_token.cancel();
        let _ = self.task.await;
    }
}

/// Owns the single "daily notification" slot: at most one pending fire
/// exists at any time. Scheduling again atomically replaces the pending
/// fire, cancelling is idempotent, and a fired slot goes back to idle.
pub struct DailyScheduler {
    slot: Mutex<Option<ScheduledSlot>>,
    worker: Arc<dyn NotificationWorker>,
    timezone: Tz,
}

impl DailyScheduler {
    pub fn new(worker: Arc<dyn NotificationWorker>, timezone: Tz) -> Self {
        Self {
            slot: Mutex::new(None),
            worker,
            timezone,
        }
    }

    /// Installs the pending fire for `request`, superseding any previous
    /// one. Rejects an empty city before touching the slot.
    pub async fn schedule(&self, request: ScheduleRequest) -> anyhow::Result<()> {
        anyhow::ensure!(
            !request.city.trim().is_empty(),
            "cannot schedule a notification without a city"
        );

        let mut slot = self.slot.lock().await;
        if let Some(previous) = slot.take() {
            log::info!(
                "Replacing pending daily notification for {} at {}",
                previous.payload.city,
                previous.fire_at.time()
            );
            previous.cancel().await;
        }

        let delay = target_delay(request.fire_at.time(), self.local_now())
            .to_std()
            .expect("target delay is never negative");

        let payload = NotificationPayload { city: request.city };
        let cancellation_token = CancellationToken::new();
        let task_token = cancellation_token.child_token();
        let worker = Arc::clone(&self.worker);
        let task_payload = payload.clone();

        log::info!(
            "Scheduling daily notification for {} in {:?}",
            payload.city,
            delay
        );

        let task = task::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => {
                    log::debug!("Pending daily notification for {} cancelled", task_payload.city);
                }
                _ = tokio::time::sleep(delay) => {
                    if let Err(err) = worker.fire(&task_payload).await {
                        log::warn!(
                            "Daily notification for {} failed, dropping this attempt: {err:#}",
                            task_payload.city
                        );
                    }
                }
            }
        });

        *slot = Some(ScheduledSlot {
            payload,
            fire_at: request.fire_at,
            task,
            cancellation_token,
        });

        Ok(())
    }

    /// Removes the pending fire if there is one. A no-op on an idle slot.
    pub async fn cancel(&self) {
        let mut slot = self.slot.lock().await;
        if let Some(pending) = slot.take() {
            log::info!(
                "Cancelling pending daily notification for {}",
                pending.payload.city
            );
            pending.cancel().await;
        }
    }

    /// Payload of the pending fire, or `None` when the slot is idle. A slot
    /// whose task has already fired counts as idle.
    pub async fn pending(&self) -> Option<NotificationPayload> {
        let slot = self.slot.lock().await;
        slot.as_ref()
            .filter(|pending| !pending.task.is_finished())
            .map(|pending| pending.payload.clone())
    }

    fn local_now(&self) -> NaiveTime {
        Utc::now().with_timezone(&self.timezone).time()
    }
}

/// Delay from `now` until the next wall-clock occurrence of `fire_at`.
///
/// Pure time-of-day arithmetic: a target that already passed today is
/// pushed exactly 24 hours out, a target equal to `now` fires immediately.
/// Calendar effects are ignored, so a fire spanning a DST transition can
/// land up to an hour off the wall clock.
pub(crate) fn target_delay(fire_at: &NaiveTime, now: NaiveTime) -> TimeDelta {
    let raw = *fire_at - now;

    if raw < TimeDelta::zero() {
        raw + TimeDelta::days(1)
    } else {
        raw
    }
}
