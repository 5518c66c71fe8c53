use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, ApplicationRecord, ApplicationStatus};

/// Everything a mail adapter needs to tell a candidate their application moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangeNotice {
    pub application_id: ApplicationId,
    pub recipient: String,
    pub candidate_name: String,
    pub job_title: String,
    pub status: ApplicationStatus,
}

/// Rendered message ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationMessage {
    pub subject: String,
    pub body: String,
}

impl StatusChangeNotice {
    pub fn for_record(record: &ApplicationRecord) -> Self {
        Self {
            application_id: record.id.clone(),
            recipient: record.candidate.email.clone(),
            candidate_name: record.candidate.display_name.clone(),
            job_title: record.job_title.clone(),
            status: record.status,
        }
    }

    pub fn compose(&self) -> NotificationMessage {
        let name = &self.candidate_name;
        let title = &self.job_title;
        let (subject, body) = match self.status {
            ApplicationStatus::Submitted => (
                format!("We received your application for {title}"),
                format!(
                    "Hi {name},\n\nThanks for applying to {title}. The hiring team will review \
                     your application and get back to you."
                ),
            ),
            ApplicationStatus::Interview => (
                format!("Interview invitation: {title}"),
                format!(
                    "Hi {name},\n\nGood news! The hiring team would like to interview you for \
                     {title}. Expect a message with scheduling details soon."
                ),
            ),
            ApplicationStatus::Evaluation => (
                format!("Your application for {title} is under evaluation"),
                format!(
                    "Hi {name},\n\nYour application for {title} has moved to the final \
                     evaluation stage. We will let you know as soon as a decision is made."
                ),
            ),
            ApplicationStatus::Hired => (
                format!("Congratulations! Offer for {title}"),
                format!(
                    "Hi {name},\n\nCongratulations! You have been selected for {title}. \
                     The company will contact you with the next steps."
                ),
            ),
            ApplicationStatus::Rejected => (
                format!("Update on your application for {title}"),
                format!(
                    "Hi {name},\n\nThank you for your interest in {title}. After careful \
                     consideration the company has decided not to move forward with your \
                     application. We wish you the best in your search."
                ),
            ),
        };

        NotificationMessage { subject, body }
    }
}

/// Outbound candidate notification hook (e-mail adapters, logging sinks).
#[async_trait]
pub trait StatusNotifier: Send + Sync {
    async fn notify(&self, notice: &StatusChangeNotice) -> Result<(), NotificationError>;
}

/// Notification dispatch error. Never surfaced to callers of the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("mail provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Result of the best-effort notice sent after a committed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationDelivery {
    Sent,
    Failed,
    TimedOut,
    Skipped,
}
