//! Webhook poster: one JSON POST per message.
//!
//! Body shape: `{"text": "<message>"}`. Any 2xx is success.

use reqwest::blocking::Client;
use serde::Serialize;
use tracing::debug;

use crate::{DeliveryError, Poster};

#[derive(Debug, Serialize)]
struct WebhookBody<'a> {
    text: &'a str,
}

#[derive(Clone)]
pub struct WebhookPoster {
    http: Client,
    url: String,
}

// Webhook URLs carry their credential in the path.
impl std::fmt::Debug for WebhookPoster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookPoster")
            .field("url", &"<REDACTED>")
            .finish()
    }
}

impl WebhookPoster {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
        }
    }
}

impl Poster for WebhookPoster {
    fn post(&self, text: &str) -> Result<(), DeliveryError> {
        let resp = self
            .http
            .post(&self.url)
            .json(&WebhookBody { text })
            .send()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), chars = text.chars().count(), "webhook post accepted");
        Ok(())
    }
}
