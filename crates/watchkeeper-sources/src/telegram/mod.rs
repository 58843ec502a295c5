//! Availability alerts through the Telegram Bot API.

use async_trait::async_trait;
use std::time::Duration;
use watchkeeper_models::ReconciledEntry;

use crate::error::SourceError;
use crate::traits::Notifier;

const TELEGRAM_BASE_URL: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Telegram returned HTTP {0}")]
    HttpStatus(u16),
}

/// Sends one message per newly available entry to a fixed chat
pub struct TelegramNotifier {
    client: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            bot_token,
            chat_id,
        })
    }

    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", TELEGRAM_BASE_URL, self.bot_token);
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
            "disable_web_page_preview": false,
        });

        let response = self.client.post(&url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

pub(crate) fn render_message(entry: &ReconciledEntry) -> String {
    let mut text = match entry.year.filter(|y| *y > 0) {
        Some(year) => format!("Now available: {} ({})", entry.title, year),
        None => format!("Now available: {}", entry.title),
    };
    text.push_str(&format!("\n{}", entry.kind));
    if !entry.locations.is_empty() {
        text.push_str(&format!(" in {}", entry.locations.join(", ")));
    }
    if entry.has_rating() {
        text.push_str(&format!("\nRating: {}", entry.rating));
    }
    text.push_str(&format!("\n{}", entry.reference_url));
    text
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, entry: &ReconciledEntry) {
        let text = render_message(entry);
        match self.send(&text).await {
            Ok(()) => tracing::info!(id = %entry.id, title = %entry.title, "Availability notification sent"),
            Err(e) => tracing::warn!(id = %entry.id, error = %e, "Availability notification failed"),
        }
    }
}
