mod telegram;
mod worker;

pub use telegram::TelegramNotificationSink;
pub use worker::WeatherNotificationWorker;

use async_trait::async_trait;

/// Presents a notification to the user. Fire-and-forget: callers never
/// observe the outcome, implementations report their own failures.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    async fn present(&self, title: &str, body: &str);
}
