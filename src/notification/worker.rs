use std::sync::Arc;

use async_trait::async_trait;

use super::NotificationSink;
use crate::scheduling::{NotificationPayload, NotificationWorker};
use crate::weather::{WeatherFetcher, WeatherSnapshot};

const NOTIFICATION_TITLE: &str = "Weather Update";
const DAILY_FORECAST_DAYS: u8 = 1;

/// The fire step of the daily notification: one weather lookup, one
/// summary line pushed through the sink. Any failure drops the attempt.
pub struct WeatherNotificationWorker {
    fetcher: Arc<dyn WeatherFetcher>,
    sink: Arc<dyn NotificationSink>,
}

impl WeatherNotificationWorker {
    pub fn new(fetcher: Arc<dyn WeatherFetcher>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { fetcher, sink }
    }
}

#[async_trait]
impl NotificationWorker for WeatherNotificationWorker {
    async fn fire(&self, payload: &NotificationPayload) -> anyhow::Result<()> {
        let snapshot = self
            .fetcher
            .fetch(&payload.city, DAILY_FORECAST_DAYS)
            .await?;

        self.sink
            .present(NOTIFICATION_TITLE, &summary_body(&snapshot))
            .await;

        Ok(())
    }
}

fn summary_body(snapshot: &WeatherSnapshot) -> String {
    format!(
        "Current Temp: {}°F, Condition: {}",
        snapshot.current.temp_f, snapshot.current.condition.text
    )
}
