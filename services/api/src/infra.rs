use async_trait::async_trait;
use job_board::config::NotificationConfig;
use job_board::workflows::applications::{
    MailerError, NotificationError, StatusChangeNotice, StatusNotifier, WebhookMailer,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Notifier used when no mail provider is configured: the rendered message is only logged.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotifier;

#[async_trait]
impl StatusNotifier for LoggingNotifier {
    async fn notify(&self, notice: &StatusChangeNotice) -> Result<(), NotificationError> {
        let message = notice.compose();
        info!(
            application_id = %notice.application_id,
            recipient = %notice.recipient,
            subject = %message.subject,
            "status e-mail (logging only)"
        );
        Ok(())
    }
}

/// Mail delivery chosen from configuration.
pub(crate) enum CandidateNotifier {
    Webhook(WebhookMailer),
    Logging(LoggingNotifier),
}

impl CandidateNotifier {
    pub(crate) fn from_config(config: &NotificationConfig) -> Result<Self, MailerError> {
        match config.webhook_url {
            Some(_) => Ok(Self::Webhook(WebhookMailer::from_config(config)?)),
            None => Ok(Self::Logging(LoggingNotifier)),
        }
    }

    pub(crate) fn describe(&self) -> &'static str {
        match self {
            CandidateNotifier::Webhook(_) => "webhook",
            CandidateNotifier::Logging(_) => "logging",
        }
    }
}

#[async_trait]
impl StatusNotifier for CandidateNotifier {
    async fn notify(&self, notice: &StatusChangeNotice) -> Result<(), NotificationError> {
        match self {
            CandidateNotifier::Webhook(mailer) => mailer.notify(notice).await,
            CandidateNotifier::Logging(logger) => logger.notify(notice).await,
        }
    }
}
