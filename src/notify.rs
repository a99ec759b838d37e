//! Outbound notifications: domain events go to NATS and to the staff Telegram
//! chat. Delivery is best effort and never blocks a request.

use serde::Serialize;

use crate::config::TelegramConfig;
use crate::domain::events::DomainEvent;

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Clone)]
pub struct Notifier {
    http: reqwest::Client,
    telegram: Option<TelegramConfig>,
    nats: Option<async_nats::Client>,
}

impl Notifier {
    pub fn new(telegram: Option<TelegramConfig>, nats: Option<async_nats::Client>) -> Self {
        Self { http: reqwest::Client::new(), telegram, nats }
    }

    pub fn disabled() -> Self { Self::new(None, None) }

    /// Hand `events` to a background task.
    pub fn dispatch(&self, events: Vec<DomainEvent>) {
        if events.is_empty() || (self.telegram.is_none() && self.nats.is_none()) { return; }
        let notifier = self.clone();
        tokio::spawn(async move {
            for event in events {
                notifier.deliver(&event).await;
            }
        });
    }

    async fn deliver(&self, event: &DomainEvent) {
        if let Some(nats) = &self.nats {
            match serde_json::to_vec(event) {
                Ok(payload) => {
                    if let Err(e) = nats.publish(event.subject().to_string(), payload.into()).await {
                        tracing::warn!(error = %e, subject = event.subject(), "event publish failed");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "event encoding failed"),
            }
        }
        if let Some(telegram) = &self.telegram {
            if let Err(e) = self.send_telegram(telegram, &event.telegram_text()).await {
                tracing::warn!(error = %e, subject = event.subject(), "telegram notification failed");
            }
        }
    }

    async fn send_telegram(&self, telegram: &TelegramConfig, text: &str) -> Result<(), reqwest::Error> {
        let url = format!("{TELEGRAM_API}/bot{}/sendMessage", telegram.bot_token);
        self.http
            .post(url)
            .json(&SendMessage { chat_id: &telegram.chat_id, text, parse_mode: "markdown" })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
