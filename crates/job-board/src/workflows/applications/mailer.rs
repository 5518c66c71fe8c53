use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error};

use super::notification::{NotificationError, StatusChangeNotice, StatusNotifier};
use crate::config::NotificationConfig;

/// Transactional e-mail adapter that posts rendered notices to an HTTP mail provider.
pub struct WebhookMailer {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
    sender: String,
}

#[derive(Debug, Serialize)]
struct MailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: String,
    text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("MAIL_WEBHOOK_URL is not configured")]
    MissingEndpoint,
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl WebhookMailer {
    pub fn new(
        endpoint: impl Into<String>,
        api_token: Option<String>,
        sender: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MailerError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_token,
            sender: sender.into(),
        })
    }

    pub fn from_config(config: &NotificationConfig) -> Result<Self, MailerError> {
        let endpoint = config
            .webhook_url
            .clone()
            .ok_or(MailerError::MissingEndpoint)?;
        Self::new(
            endpoint,
            config.api_token.clone(),
            config.sender.clone(),
            config.timeout,
        )
    }
}

#[async_trait]
impl StatusNotifier for WebhookMailer {
    async fn notify(&self, notice: &StatusChangeNotice) -> Result<(), NotificationError> {
        let message = notice.compose();
        let payload = MailPayload {
            from: &self.sender,
            to: &notice.recipient,
            subject: message.subject,
            text: message.body,
        };

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        debug!(application_id = %notice.application_id, status = %notice.status, "sending status e-mail");

        let response = request
            .send()
            .await
            .map_err(|err| NotificationError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!(status, %body, "mail provider rejected status e-mail");
            return Err(NotificationError::Rejected { status, body });
        }

        Ok(())
    }
}
