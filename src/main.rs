mod appsettings;
mod notification;
mod scheduling;
mod storage;
mod telegram;
mod weather;

use std::sync::Arc;

use anyhow::Context;
use teloxide::Bot;
use teloxide::types::ChatId;

use appsettings::AppSettings;
use notification::{TelegramNotificationSink, WeatherNotificationWorker};
use scheduling::{DailyScheduler, FireTime, ScheduleRequest};
use storage::{JsonUserStore, SettingsStorage};
use telegram::TelegramInterface;
use weather::{WeatherApiClient, WeatherFetcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::load().context("could not load application settings")?;

    let fetcher: Arc<dyn WeatherFetcher> = Arc::new(WeatherApiClient::new(&settings.weather)?);
    let bot = Bot::new(&settings.telegram.token);
    let sink = Arc::new(TelegramNotificationSink::new(
        bot.clone(),
        ChatId(settings.telegram.chat_id),
    ));
    let worker = Arc::new(WeatherNotificationWorker::new(Arc::clone(&fetcher), sink));
    let scheduler = Arc::new(DailyScheduler::new(worker, settings.notification.timezone));
    let store = Arc::new(JsonUserStore::new(settings.storage.data_file.clone()));

    rearm_daily_slot(&store, &scheduler, &settings).await?;

    TelegramInterface::start(bot, fetcher, scheduler, store).await;

    Ok(())
}

/// Restores the daily notification slot from the persisted settings. Only
/// the enablement flag and the city survive restarts; the fire time comes
/// from configuration.
async fn rearm_daily_slot(
    store: &JsonUserStore,
    scheduler: &DailyScheduler,
    settings: &AppSettings,
) -> anyhow::Result<()> {
    let saved = store.load().await?;
    if !saved.notifications_enabled {
        return Ok(());
    }

    match saved.city {
        Some(city) => {
            log::info!("Re-arming daily weather notification for {city}");
            scheduler
                .schedule(ScheduleRequest::new(
                    city,
                    FireTime::new(settings.notification.default_fire_at),
                ))
                .await?;
        }
        None => log::warn!("Notifications are enabled but no city is saved, skipping re-arm"),
    }

    Ok(())
}
