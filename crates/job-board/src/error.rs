use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::applications::MailerError;
use thiserror::Error;

/// Failures that stop the process before or while serving.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("mailer setup error: {0}")]
    Mailer(#[from] MailerError),
}
