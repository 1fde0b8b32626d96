use async_trait::async_trait;
use teloxide::{prelude::*, types::ParseMode, utils::markdown};

use super::NotificationSink;

pub struct TelegramNotificationSink {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotificationSink {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl NotificationSink for TelegramNotificationSink {
    async fn present(&self, title: &str, body: &str) {
        let text = format!("*{}*\n{}", markdown::escape(title), markdown::escape(body));

        if let Err(err) = self
            .bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::MarkdownV2)
            .await
        {
            log::warn!("Could not deliver notification to chat {}: {err}", self.chat_id);
        }
    }
}
