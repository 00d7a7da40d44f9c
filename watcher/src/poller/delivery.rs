//! De-duplicated delivery through a `Notifier`.

use common::notify::Notifier;
use tracing::{debug, error};

/// Last text that reached the chat on one stream (statuses or diagnostics).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LastSent(Option<String>);

impl LastSent {
    pub fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_repeat(&self, text: &str) -> bool {
        self.0.as_deref() == Some(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Duplicate,
    Failed,
}

/// Send `text` unless it equals the last delivered text.
///
/// Failures are logged and swallowed; `last` only moves on success so the
/// same text is retried on the next cycle.
pub async fn deliver(notifier: &dyn Notifier, last: &mut LastSent, text: &str) -> Delivery {
    if last.is_repeat(text) {
        debug!("Сообщение не изменилось, повторная отправка пропущена");
        return Delivery::Duplicate;
    }
    match notifier.send(text).await {
        Ok(()) => {
            debug!("Сообщение {} успешно отправлено", text);
            last.0 = Some(text.to_string());
            Delivery::Sent
        }
        Err(e) => {
            error!("Не удалось отправить сообщение \"{}\". {}", text, e);
            Delivery::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::tests::RecordingNotifier;

    #[tokio::test]
    async fn test_same_text_delivered_once() {
        let notifier = RecordingNotifier::default();
        let mut last = LastSent::default();

        assert_eq!(deliver(&notifier, &mut last, "hello").await, Delivery::Sent);
        assert_eq!(deliver(&notifier, &mut last, "hello").await, Delivery::Duplicate);
        assert_eq!(notifier.sent(), vec!["hello".to_string()]);
        assert_eq!(last.get(), Some("hello"));
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_text() {
        let notifier = RecordingNotifier::failing();
        let mut last = LastSent::default();

        assert_eq!(deliver(&notifier, &mut last, "hello").await, Delivery::Failed);
        assert_eq!(last.get(), None);
        // not marked as delivered, so the next attempt goes out again
        assert_eq!(deliver(&notifier, &mut last, "hello").await, Delivery::Failed);
        assert_eq!(notifier.attempts(), 2);
    }

    #[tokio::test]
    async fn test_new_text_replaces_last() {
        let notifier = RecordingNotifier::default();
        let mut last = LastSent::default();

        deliver(&notifier, &mut last, "first").await;
        deliver(&notifier, &mut last, "second").await;
        deliver(&notifier, &mut last, "first").await;
        assert_eq!(notifier.sent(), vec!["first", "second", "first"]);
    }
}
