mod notification_dialogue;

use std::sync::Arc;

use teloxide::dptree::{self, case};
use teloxide::{
    dispatching::dialogue::{self, InMemStorage},
    macros::BotCommands,
    prelude::*,
};

use crate::scheduling::DailyScheduler;
use crate::storage::{FavoriteStorage, JsonUserStore, SettingsStorage};
use crate::weather::{WeatherFetcher, WeatherSnapshot};
use notification_dialogue::ConfiguringNotificationsState;

type GlobalDialogue = Dialogue<GlobalState, InMemStorage<GlobalState>>;
type HandlerResult = anyhow::Result<()>;

const FORECAST_DAYS: u8 = 3;
const FETCH_FAILED_TEXT: &str = "Failed to load data, please try again";

#[derive(Default, Clone, Debug, PartialEq, Eq)]
enum GlobalState {
    #[default]
    Idle,
    ConfiguringNotifications(ConfiguringNotificationsState),
}

#[derive(BotCommands, Clone)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
enum GlobalCommand {
    #[command(description = "current conditions for a city.")]
    Weather(String),
    #[command(description = "multi-day forecast for a city.")]
    Forecast(String),
    #[command(description = "list favorite cities.")]
    Favorites,
    #[command(description = "add a city to favorites.")]
    AddFavorite(String),
    #[command(description = "remove a city from favorites.")]
    RemoveFavorite(String),
    #[command(description = "set up the daily weather notification.")]
    Notifications,
    #[command(description = "turn the daily weather notification off.")]
    NotificationsOff,
    #[command(description = "cancel the current operation.")]
    Cancel,
}

pub struct TelegramInterface;

impl TelegramInterface {
    pub async fn start(
        bot: Bot,
        fetcher: Arc<dyn WeatherFetcher>,
        scheduler: Arc<DailyScheduler>,
        store: Arc<JsonUserStore>,
    ) {
        log::info!("Starting Telegram interaction interface");

        let command_handler = Update::filter_message().branch(
            teloxide::filter_command::<GlobalCommand, _>()
                .branch(case![GlobalCommand::Weather(city)].endpoint(current_weather))
                .branch(case![GlobalCommand::Forecast(city)].endpoint(forecast))
                .branch(case![GlobalCommand::Favorites].endpoint(list_favorites))
                .branch(case![GlobalCommand::AddFavorite(city)].endpoint(add_favorite))
                .branch(case![GlobalCommand::RemoveFavorite(city)].endpoint(remove_favorite))
                .branch(case![GlobalCommand::NotificationsOff].endpoint(disable_notifications))
                .branch(case![GlobalCommand::Cancel].endpoint(cancel)),
        );

        let invalid_state_handler = Update::filter_message().branch(dptree::endpoint(invalid_state));

        let invalid_callback_handler =
            Update::filter_callback_query().branch(dptree::endpoint(invalid_query));

        let schema = dialogue::enter::<Update, InMemStorage<GlobalState>, GlobalState, _>()
            .branch(command_handler)
            .branch(notification_dialogue::schema())
            .branch(invalid_state_handler)
            .branch(invalid_callback_handler);

        Dispatcher::builder(bot, schema)
            .dependencies(dptree::deps![
                InMemStorage::<GlobalState>::new(),
                fetcher,
                scheduler,
                store
            ])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await
    }
}

async fn current_weather(
    bot: Bot,
    fetcher: Arc<dyn WeatherFetcher>,
    msg: Message,
    city: String,
) -> HandlerResult {
    let Some(city) = non_empty(&city) else {
        bot.send_message(msg.chat.id, "Please provide a city, e.g. /weather Seattle")
            .await?;
        return Ok(());
    };

    match fetcher.fetch(city, 1).await {
        Ok(snapshot) => {
            bot.send_message(msg.chat.id, render_current(&snapshot))
                .await?;
        }
        Err(err) => {
            log::warn!("Weather lookup for {city} failed: {err}");
            bot.send_message(msg.chat.id, FETCH_FAILED_TEXT).await?;
        }
    }

    Ok(())
}

async fn forecast(
    bot: Bot,
    fetcher: Arc<dyn WeatherFetcher>,
    msg: Message,
    city: String,
) -> HandlerResult {
    let Some(city) = non_empty(&city) else {
        bot.send_message(msg.chat.id, "Please provide a city, e.g. /forecast Seattle")
            .await?;
        return Ok(());
    };

    match fetcher.fetch(city, FORECAST_DAYS).await {
        Ok(snapshot) => {
            bot.send_message(msg.chat.id, render_forecast(&snapshot))
                .await?;
        }
        Err(err) => {
            log::warn!("Forecast lookup for {city} failed: {err}");
            bot.send_message(msg.chat.id, FETCH_FAILED_TEXT).await?;
        }
    }

    Ok(())
}

async fn list_favorites(bot: Bot, store: Arc<JsonUserStore>, msg: Message) -> HandlerResult {
    let favorites = store.list().await?;

    let text = if favorites.is_empty() {
        "No favorite cities yet. Add one with /addfavorite <city>.".to_string()
    } else {
        format!("Favorite cities:\n{}", favorites.join("\n"))
    };

    bot.send_message(msg.chat.id, text).await?;

    Ok(())
}

async fn add_favorite(
    bot: Bot,
    store: Arc<JsonUserStore>,
    msg: Message,
    city: String,
) -> HandlerResult {
    let Some(city) = non_empty(&city) else {
        bot.send_message(msg.chat.id, "Please provide a city, e.g. /addfavorite Seattle")
            .await?;
        return Ok(());
    };

    let text = if store.add(city).await? {
        format!("Added {city} to favorites.")
    } else {
        format!("{city} is already a favorite.")
    };

    bot.send_message(msg.chat.id, text).await?;

    Ok(())
}

async fn remove_favorite(
    bot: Bot,
    store: Arc<JsonUserStore>,
    msg: Message,
    city: String,
) -> HandlerResult {
    let Some(city) = non_empty(&city) else {
        bot.send_message(
            msg.chat.id,
            "Please provide a city, e.g. /removefavorite Seattle",
        )
        .await?;
        return Ok(());
    };

    let text = if store.remove(city).await? {
        format!("Removed {city} from favorites.")
    } else {
        format!("{city} is not in your favorites.")
    };

    bot.send_message(msg.chat.id, text).await?;

    Ok(())
}

async fn disable_notifications(
    bot: Bot,
    scheduler: Arc<DailyScheduler>,
    store: Arc<JsonUserStore>,
    msg: Message,
) -> HandlerResult {
    let mut settings = store.load().await?;
    settings.notifications_enabled = false;
    store.save(&settings).await?;

    scheduler.cancel().await;

    bot.send_message(msg.chat.id, "Daily weather notification turned off.")
        .await?;

    Ok(())
}

async fn cancel(bot: Bot, dialogue: GlobalDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "Cancelled current operation.")
        .await?;
    dialogue.exit().await?;
    Ok(())
}

async fn invalid_state(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        "Unable to handle the message. Please try again or use /cancel to stop current operation.",
    )
    .await?;
    Ok(())
}

async fn invalid_query(bot: Bot, dialogue: GlobalDialogue, query: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(query.id).await?;
    bot.send_message(
        dialogue.chat_id(),
        "Unable to handle the query result. Please try again or use /cancel to stop current operation.",
    )
    .await?;

    Ok(())
}

fn non_empty(city: &str) -> Option<&str> {
    let city = city.trim();
    (!city.is_empty()).then_some(city)
}

fn render_current(snapshot: &WeatherSnapshot) -> String {
    format!(
        "{}, {}\n{}°F ({}°C), {}\nHumidity: {}%\nWind: {} mph",
        snapshot.location.name,
        snapshot.location.country,
        snapshot.current.temp_f,
        snapshot.current.temp_c,
        snapshot.current.condition.text,
        snapshot.current.humidity,
        snapshot.current.wind_mph
    )
}

fn render_forecast(snapshot: &WeatherSnapshot) -> String {
    let mut lines = vec![format!(
        "Forecast for {}, {}:",
        snapshot.location.name, snapshot.location.country
    )];

    for day in &snapshot.forecast.forecastday {
        lines.push(format!(
            "{}: {}°F (low {}°F, high {}°F), {}, rain {}%",
            day.date,
            day.day.avgtemp_f,
            day.day.mintemp_f,
            day.day.maxtemp_f,
            day.day.condition.text,
            day.day.daily_chance_of_rain
        ));
    }

    lines.join("\n")
}
