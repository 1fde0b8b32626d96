use std::sync::Arc;

use chrono::NaiveTime;
use teloxide::dptree::{self, case};
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::scheduling::{DailyScheduler, FireTime, ScheduleRequest};
use crate::storage::{JsonUserStore, NotificationSettings, SettingsStorage};

use super::{GlobalCommand, GlobalDialogue, GlobalState, HandlerResult};

#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub(super) enum ConfiguringNotificationsState {
    #[default]
    Start,
    WaitingForCity,
    WaitingForFiringTime {
        city: String,
    },
    WaitingForConfirmation {
        city: String,
        firing_time: NaiveTime,
    },
}

async fn configure_notifications_start(
    bot: Bot,
    dialogue: GlobalDialogue,
    scheduler: Arc<DailyScheduler>,
    store: Arc<JsonUserStore>,
    msg: Message,
) -> HandlerResult {
    let mut prompt = String::from(
        "Setting up the daily weather notification! Which city should it cover? \
         If you want to stop, use the /cancel command.",
    );

    if let Some(pending) = scheduler.pending().await {
        prompt = format!(
            "A daily notification for {} is already scheduled; finishing this setup will replace it.\n{prompt}",
            pending.city
        );
    } else if let Some(city) = store.load().await?.city {
        prompt = format!("{prompt}\nThe last saved city was {city}.");
    }

    bot.send_message(msg.chat.id, prompt).await?;

    dialogue
        .update(GlobalState::ConfiguringNotifications(
            ConfiguringNotificationsState::WaitingForCity,
        ))
        .await?;

    Ok(())
}

async fn receive_city(bot: Bot, dialogue: GlobalDialogue, msg: Message) -> HandlerResult {
    match msg.text().map(str::trim).filter(|text| !text.is_empty()) {
        Some(city) => {
            let message = format!(
                "Got it, {city}. Now send the time of day for the notification (e.g. 08:00)."
            );
            bot.send_message(msg.chat.id, message).await?;

            dialogue
                .update(GlobalState::ConfiguringNotifications(
                    ConfiguringNotificationsState::WaitingForFiringTime {
                        city: city.to_string(),
                    },
                ))
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "Please send me a city name.")
                .await?;
        }
    }

    Ok(())
}

async fn receive_firing_time(
    bot: Bot,
    dialogue: GlobalDialogue,
    city: String,
    msg: Message,
) -> HandlerResult {
    match msg
        .text()
        .map(|text| NaiveTime::parse_from_str(text.trim(), "%H:%M"))
    {
        Some(Ok(time)) => {
            let message_text = format!(
                "Every day at {} you will get the weather for {}.\nIf it's okay, please press Confirm.\nIf you want to change something, please type /cancel and start over.",
                time.format("%H:%M"),
                city
            );

            let ok_button = InlineKeyboardButton::callback("Confirm", "Confirm");
            let keyboard = InlineKeyboardMarkup::new(vec![vec![ok_button]]);

            dialogue
                .update(GlobalState::ConfiguringNotifications(
                    ConfiguringNotificationsState::WaitingForConfirmation {
                        city,
                        firing_time: time,
                    },
                ))
                .await?;

            bot.send_message(msg.chat.id, message_text)
                .reply_markup(keyboard)
                .await?;
        }
        _ => {
            bot.send_message(
                msg.chat.id,
                "Could not parse time. Please send time in the following format: 08:00",
            )
            .await?;
        }
    }

    Ok(())
}

async fn confirm_notifications(
    bot: Bot,
    dialogue: GlobalDialogue,
    (city, firing_time): (String, NaiveTime),
    query: CallbackQuery,
    scheduler: Arc<DailyScheduler>,
    store: Arc<JsonUserStore>,
) -> HandlerResult {
    bot.answer_callback_query(query.id).await?;

    store
        .save(&NotificationSettings {
            notifications_enabled: true,
            city: Some(city.clone()),
        })
        .await?;

    scheduler
        .schedule(ScheduleRequest::new(
            city.clone(),
            FireTime::new(firing_time),
        ))
        .await?;

    log::info!("Armed daily weather notification for {city} at {firing_time}");

    bot.send_message(
        dialogue.chat_id(),
        format!(
            "Daily weather notification for {} scheduled at {}.",
            city,
            firing_time.format("%H:%M")
        ),
    )
    .await?;

    dialogue.exit().await?;

    Ok(())
}

pub(super) fn schema() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    teloxide::filter_command::<GlobalCommand, _>().branch(
                        case![GlobalCommand::Notifications]
                            .endpoint(configure_notifications_start),
                    ),
                )
                .branch(
                    case![GlobalState::ConfiguringNotifications(x)]
                        .branch(
                            case![ConfiguringNotificationsState::WaitingForCity]
                                .endpoint(receive_city),
                        )
                        .branch(
                            case![ConfiguringNotificationsState::WaitingForFiringTime { city }]
                                .endpoint(receive_firing_time),
                        ),
                ),
        )
        .branch(
            Update::filter_callback_query().branch(
                case![GlobalState::ConfiguringNotifications(x)].branch(
                    case![ConfiguringNotificationsState::WaitingForConfirmation {
                        city,
                        firing_time
                    }]
                    .endpoint(confirm_notifications),
                ),
            ),
        )
}
