use async_trait::async_trait;
use common::config::BotConfig;
use common::notify::{NotifyError, Notifier};
use teloxide::prelude::*;
use teloxide::types::{ChatId, Recipient};
use tracing::debug;

/// Sends plain-text messages to one Telegram chat.
pub struct TelegramNotifier {
    bot: Bot,
    recipient: Recipient,
}

impl TelegramNotifier {
    pub fn new(token: &str, chat_id: &str) -> Self {
        Self {
            bot: Bot::new(token),
            recipient: parse_recipient(chat_id),
        }
    }

    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(&config.telegram_token, &config.telegram_chat_id)
    }
}

/// Numeric ids address a chat directly, anything else is a channel username.
pub fn parse_recipient(chat_id: &str) -> Recipient {
    let chat_id = chat_id.trim();
    match chat_id.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) if chat_id.starts_with('@') => Recipient::ChannelUsername(chat_id.to_string()),
        Err(_) => Recipient::ChannelUsername(format!("@{}", chat_id)),
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        match self.bot.send_message(self.recipient.clone(), text).await {
            Ok(_) => {
                debug!("Сообщение {} успешно отправлено", text);
                Ok(())
            }
            Err(e) => Err(NotifyError::new(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_chat_id() {
        assert_eq!(parse_recipient("123456"), Recipient::Id(ChatId(123456)));
        assert_eq!(parse_recipient(" -1001234 "), Recipient::Id(ChatId(-1001234)));
    }

    #[test]
    fn test_channel_username() {
        assert_eq!(
            parse_recipient("@homework_feed"),
            Recipient::ChannelUsername("@homework_feed".to_string())
        );
        assert_eq!(
            parse_recipient("homework_feed"),
            Recipient::ChannelUsername("@homework_feed".to_string())
        );
    }
}
