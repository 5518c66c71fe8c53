use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::access::PipelineAuthority;
use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationSubmission, JobPostingId,
    StatusChangeId, StatusChangeRecord, UnknownStatus,
};
use super::notification::{NotificationDelivery, StatusChangeNotice, StatusNotifier};
use super::repository::{ApplicationRepository, RepositoryError};
use super::transition::{self, TransitionDenial, TransitionKind};

const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Service composing the repository, the transition rules, and candidate notifications.
pub struct ApplicationPipelineService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
    notify_timeout: Duration,
}

/// Result of a status change request.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChangeOutcome {
    pub application_id: ApplicationId,
    pub status: ApplicationStatus,
    pub changed: bool,
    #[serde(skip)]
    pub notification: NotificationDelivery,
}

impl StatusChangeOutcome {
    fn unchanged(record: &ApplicationRecord) -> Self {
        Self {
            application_id: record.id.clone(),
            status: record.status,
            changed: false,
            notification: NotificationDelivery::Skipped,
        }
    }
}

impl<R, N> ApplicationPipelineService<R, N>
where
    R: ApplicationRepository + 'static,
    N: StatusNotifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>) -> Self {
        Self {
            repository,
            notifier,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }

    /// Bound how long a committed change waits on the notifier.
    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }

    /// Record a candidate's application against a posting in the `SUBMITTED` stage.
    pub fn submit(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        validate_submission(&submission)?;

        let now = Utc::now();
        let record = ApplicationRecord {
            id: ApplicationId::generate(),
            job_posting_id: JobPostingId::from(submission.job_posting_id.0.trim()),
            job_title: submission.job_title.trim().to_string(),
            candidate: submission.candidate,
            status: ApplicationStatus::Submitted,
            internal_notes: submission.internal_notes,
            submitted_at: now,
            updated_at: now,
        };

        let stored = self
            .repository
            .insert(record)
            .map_err(ApplicationServiceError::Persistence)?;
        info!(application_id = %stored.id, job_posting_id = %stored.job_posting_id, "application submitted");
        Ok(stored)
    }

    pub fn get(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        self.repository
            .fetch(application_id)
            .map_err(ApplicationServiceError::Persistence)?
            .ok_or_else(|| ApplicationServiceError::NotFound(application_id.clone()))
    }

    /// Audit trail for an application, oldest first.
    pub fn history(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<StatusChangeRecord>, ApplicationServiceError> {
        self.repository
            .history(application_id)
            .map_err(|err| not_found_or_persistence(application_id, err))
    }

    /// Replace the internal notes that later status changes snapshot.
    pub fn annotate(
        &self,
        application_id: &ApplicationId,
        notes: Option<String>,
        authority: &PipelineAuthority,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let notes = notes
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        let updated = self
            .repository
            .update_notes(application_id, notes, Utc::now())
            .map_err(|err| not_found_or_persistence(application_id, err))?;
        info!(application_id = %application_id, actor = %authority.actor(), "internal notes updated");
        Ok(updated)
    }

    /// Applications received for a posting, optionally narrowed to one stage.
    pub fn pipeline(
        &self,
        job_posting_id: &JobPostingId,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationRecord>, ApplicationServiceError> {
        let records = self
            .repository
            .for_posting(job_posting_id)
            .map_err(ApplicationServiceError::Persistence)?;
        Ok(records
            .into_iter()
            .filter(|record| status.map_or(true, |wanted| record.status == wanted))
            .collect())
    }

    /// Move an application to `requested`, recording the change and notifying the candidate.
    ///
    /// The status write is guarded on the status that was validated. If another writer got there
    /// first, the request is re-validated once against the fresh state before giving up.
    pub async fn change_status(
        &self,
        application_id: &ApplicationId,
        requested: ApplicationStatus,
        authority: &PipelineAuthority,
    ) -> Result<StatusChangeOutcome, ApplicationServiceError> {
        let mut record = self.get(application_id)?;
        let mut retried = false;

        let updated = loop {
            let kind = transition::check(record.status, requested).map_err(|reason| {
                ApplicationServiceError::InvalidTransition {
                    application_id: application_id.clone(),
                    current: record.status,
                    attempted: requested,
                    reason,
                }
            })?;
            if kind == TransitionKind::Unchanged {
                return Ok(StatusChangeOutcome::unchanged(&record));
            }

            let change = StatusChangeRecord {
                id: StatusChangeId::generate(),
                application_id: application_id.clone(),
                previous_status: record.status,
                new_status: requested,
                notes_snapshot: record.internal_notes.clone(),
                actor: authority.actor().clone(),
                created_at: Utc::now(),
            };

            match self.repository.apply_status_change(record.status, change) {
                Ok(updated) => break updated,
                Err(RepositoryError::StaleStatus { stored }) if !retried => {
                    warn!(
                        application_id = %application_id,
                        read = %record.status,
                        stored = %stored,
                        "status changed concurrently; re-validating"
                    );
                    retried = true;
                    record = self.get(application_id)?;
                }
                Err(RepositoryError::StaleStatus { stored }) => {
                    return Err(ApplicationServiceError::ConcurrentModification {
                        application_id: application_id.clone(),
                        stored,
                        attempted: requested,
                    });
                }
                Err(err) => return Err(not_found_or_persistence(application_id, err)),
            }
        };

        info!(
            application_id = %application_id,
            actor = %authority.actor(),
            to = %updated.status,
            "application status changed"
        );

        let notification = self.dispatch(&updated).await;
        Ok(StatusChangeOutcome {
            application_id: updated.id,
            status: updated.status,
            changed: true,
            notification,
        })
    }

    async fn dispatch(&self, record: &ApplicationRecord) -> NotificationDelivery {
        let notice = StatusChangeNotice::for_record(record);
        match tokio::time::timeout(self.notify_timeout, self.notifier.notify(&notice)).await {
            Ok(Ok(())) => NotificationDelivery::Sent,
            Ok(Err(err)) => {
                warn!(application_id = %record.id, error = %err, "status notification failed");
                NotificationDelivery::Failed
            }
            Err(_) => {
                warn!(
                    application_id = %record.id,
                    timeout_ms = self.notify_timeout.as_millis() as u64,
                    "status notification timed out"
                );
                NotificationDelivery::TimedOut
            }
        }
    }
}

fn validate_submission(submission: &ApplicationSubmission) -> Result<(), ApplicationServiceError> {
    if submission.job_posting_id.0.trim().is_empty() {
        return Err(ApplicationServiceError::MalformedInput(
            "job_posting_id must not be empty".to_string(),
        ));
    }
    if submission.job_title.trim().is_empty() {
        return Err(ApplicationServiceError::MalformedInput(
            "job_title must not be empty".to_string(),
        ));
    }
    if submission.candidate.display_name.trim().is_empty() {
        return Err(ApplicationServiceError::MalformedInput(
            "candidate display_name must not be empty".to_string(),
        ));
    }
    let email = submission.candidate.email.trim();
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(ApplicationServiceError::MalformedInput(format!(
            "candidate email '{email}' is not a valid address"
        )));
    }
    Ok(())
}

fn not_found_or_persistence(
    application_id: &ApplicationId,
    err: RepositoryError,
) -> ApplicationServiceError {
    match err {
        RepositoryError::NotFound => ApplicationServiceError::NotFound(application_id.clone()),
        other => ApplicationServiceError::Persistence(other),
    }
}

/// Error raised by the application pipeline service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error("cannot move application {application_id} from {current} to {attempted}: {reason}")]
    InvalidTransition {
        application_id: ApplicationId,
        current: ApplicationStatus,
        attempted: ApplicationStatus,
        reason: TransitionDenial,
    },
    #[error("application {application_id} changed concurrently (now {stored}) while moving to {attempted}")]
    ConcurrentModification {
        application_id: ApplicationId,
        stored: ApplicationStatus,
        attempted: ApplicationStatus,
    },
    #[error("persistence failure: {0}")]
    Persistence(#[source] RepositoryError),
}

impl From<UnknownStatus> for ApplicationServiceError {
    fn from(value: UnknownStatus) -> Self {
        Self::MalformedInput(value.to_string())
    }
}
