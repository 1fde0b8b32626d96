use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;
use proptest::prelude::*;
use test_strategy::proptest;

use crate::scheduling::{
    DailyScheduler, FireTime, NotificationPayload, NotificationWorker, ScheduleRequest,
    target_delay,
};

type FiredPayloads = Arc<Mutex<Vec<NotificationPayload>>>;

#[derive(Clone, Default)]
struct RecordingWorker {
    fired: FiredPayloads,
    fail: bool,
}

#[async_trait]
impl NotificationWorker for RecordingWorker {
    async fn fire(&self, payload: &NotificationPayload) -> anyhow::Result<()> {
        self.fired.lock().unwrap().push(payload.clone());
        if self.fail {
            anyhow::bail!("synthetic fire failure");
        }
        Ok(())
    }
}

struct TestContext {
    fired: FiredPayloads,
    scheduler: DailyScheduler,
}

impl TestContext {
    fn new() -> Self {
        Self::with_worker(RecordingWorker::default())
    }

    fn failing() -> Self {
        Self::with_worker(RecordingWorker {
            fail: true,
            ..Default::default()
        })
    }

    fn with_worker(worker: RecordingWorker) -> Self {
        let fired = worker.fired.clone();
        let scheduler = DailyScheduler::new(Arc::new(worker), Tz::UTC);

        Self { fired, scheduler }
    }
}

fn time_strategy() -> impl Strategy<Value = NaiveTime> {
    (0u32..24, 0u32..60).prop_map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0).unwrap())
}

fn tokio_ct(
    future: impl std::future::Future<Output = Result<(), TestCaseError>>,
) -> Result<(), TestCaseError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap()
        .block_on(future)
}

fn expected_delay(fire_at: &FireTime) -> TimeDelta {
    target_delay(fire_at.time(), Utc::now().time())
}

fn fire_time_in(delta: TimeDelta) -> FireTime {
    let (time, _) = Utc::now().time().overflowing_add_signed(delta);
    FireTime::new(time)
}

async fn wait(delta: TimeDelta) {
    tokio::time::sleep(delta.to_std().unwrap() + std::time::Duration::from_secs(1)).await;
}

#[proptest(async = tokio_ct)]
async fn fires_once_at_the_target_time(#[strategy(time_strategy())] time: NaiveTime) {
    let ctx = TestContext::new();
    let fire_at = FireTime::new(time);
    let delay = expected_delay(&fire_at);
    prop_assume!(delay > TimeDelta::seconds(5));

    ctx.scheduler
        .schedule(ScheduleRequest::new("Seattle", fire_at))
        .await
        .unwrap();
    prop_assert!(ctx.scheduler.pending().await.is_some());

    wait(delay).await;

    let fired = ctx.fired.lock().unwrap().clone();
    prop_assert_eq!(
        fired,
        vec![NotificationPayload {
            city: "Seattle".to_string()
        }]
    );
    prop_assert!(ctx.scheduler.pending().await.is_none());
}

#[proptest(async = tokio_ct)]
async fn does_not_fire_before_the_target_time(#[strategy(time_strategy())] time: NaiveTime) {
    let ctx = TestContext::new();
    let fire_at = FireTime::new(time);
    let delay = expected_delay(&fire_at);
    prop_assume!(delay > TimeDelta::seconds(90));

    ctx.scheduler
        .schedule(ScheduleRequest::new("Seattle", fire_at))
        .await
        .unwrap();

    tokio::time::sleep((delay - TimeDelta::seconds(60)).to_std().unwrap()).await;

    prop_assert!(ctx.fired.lock().unwrap().is_empty());
    prop_assert!(ctx.scheduler.pending().await.is_some());
}

#[tokio::test(start_paused = true)]
async fn replacing_keeps_only_the_latest_request() {
    let ctx = TestContext::new();
    let first = fire_time_in(TimeDelta::hours(2));
    let second = fire_time_in(TimeDelta::hours(3));

    ctx.scheduler
        .schedule(ScheduleRequest::new("Seattle", first))
        .await
        .unwrap();
    ctx.scheduler
        .schedule(ScheduleRequest::new("Boston", second))
        .await
        .unwrap();

    let pending = ctx.scheduler.pending().await.unwrap();
    assert_eq!(pending.city, "Boston");

    wait(TimeDelta::hours(26)).await;

    let fired = ctx.fired.lock().unwrap();
    assert_eq!(fired.len(), 1, "only the replacement may fire");
    assert_eq!(fired[0].city, "Boston");
}

#[tokio::test(start_paused = true)]
async fn cancel_removes_the_pending_fire_and_is_idempotent() {
    let ctx = TestContext::new();

    ctx.scheduler
        .schedule(ScheduleRequest::new("Seattle", fire_time_in(TimeDelta::hours(1))))
        .await
        .unwrap();

    ctx.scheduler.cancel().await;
    assert!(ctx.scheduler.pending().await.is_none());

    // Cancelling an idle slot is a no-op, not an error.
    ctx.scheduler.cancel().await;
    assert!(ctx.scheduler.pending().await.is_none());

    wait(TimeDelta::hours(25)).await;

    assert!(ctx.fired.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn empty_city_is_rejected_without_touching_the_slot() {
    let ctx = TestContext::new();

    let result = ctx
        .scheduler
        .schedule(ScheduleRequest::new("   ", fire_time_in(TimeDelta::hours(1))))
        .await;
    assert!(result.is_err());
    assert!(ctx.scheduler.pending().await.is_none());

    ctx.scheduler
        .schedule(ScheduleRequest::new("Seattle", fire_time_in(TimeDelta::hours(1))))
        .await
        .unwrap();

    let result = ctx
        .scheduler
        .schedule(ScheduleRequest::new("", fire_time_in(TimeDelta::hours(2))))
        .await;
    assert!(result.is_err());

    let pending = ctx.scheduler.pending().await.unwrap();
    assert_eq!(pending.city, "Seattle", "rejected request must not replace the pending one");
}

#[tokio::test(start_paused = true)]
async fn fire_failure_is_dropped_without_rearming() {
    let ctx = TestContext::failing();

    ctx.scheduler
        .schedule(ScheduleRequest::new("Seattle", fire_time_in(TimeDelta::hours(1))))
        .await
        .unwrap();

    wait(TimeDelta::hours(1)).await;

    assert_eq!(ctx.fired.lock().unwrap().len(), 1);
    assert!(ctx.scheduler.pending().await.is_none());

    wait(TimeDelta::hours(24)).await;

    assert_eq!(
        ctx.fired.lock().unwrap().len(),
        1,
        "a failed fire is never retried"
    );
}
