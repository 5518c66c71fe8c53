use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::workflows::applications::access::{ActorClaims, ActorRole, PipelineAuthority};
use crate::workflows::applications::domain::{
    ActorId, ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationSubmission,
    CandidateContact, CandidateId, JobPostingId, StatusChangeId, StatusChangeRecord,
};
use crate::workflows::applications::notification::{
    NotificationError, StatusChangeNotice, StatusNotifier,
};
use crate::workflows::applications::repository::{
    ApplicationRepository, InMemoryApplicationRepository, RepositoryError,
};
use crate::workflows::applications::service::ApplicationPipelineService;

pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        job_posting_id: JobPostingId::from("posting-42"),
        job_title: "Backend Engineer".to_string(),
        candidate: CandidateContact {
            candidate_id: CandidateId::from("cand-7"),
            display_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        },
        internal_notes: Some("referred by platform team".to_string()),
    }
}

pub(super) fn authority() -> PipelineAuthority {
    ActorClaims::new("recruiter-1", ActorRole::Company)
        .pipeline_authority()
        .expect("company claims carry authority")
}

/// Insert an application already sitting in `status`, bypassing the pipeline.
pub(super) fn seed(
    repository: &InMemoryApplicationRepository,
    status: ApplicationStatus,
) -> ApplicationRecord {
    let now = Utc::now();
    let submission = submission();
    repository
        .insert(ApplicationRecord {
            id: ApplicationId::generate(),
            job_posting_id: submission.job_posting_id,
            job_title: submission.job_title,
            candidate: submission.candidate,
            status,
            internal_notes: submission.internal_notes,
            submitted_at: now,
            updated_at: now,
        })
        .expect("seed insert")
}

pub(super) type TestService =
    ApplicationPipelineService<InMemoryApplicationRepository, RecordingNotifier>;

pub(super) fn build_service() -> (
    TestService,
    Arc<InMemoryApplicationRepository>,
    Arc<RecordingNotifier>,
) {
    let repository = Arc::new(InMemoryApplicationRepository::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let service = ApplicationPipelineService::new(repository.clone(), notifier.clone());
    (service, repository, notifier)
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    notices: Mutex<Vec<StatusChangeNotice>>,
}

impl RecordingNotifier {
    pub(super) fn notices(&self) -> Vec<StatusChangeNotice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }
}

#[async_trait]
impl StatusNotifier for RecordingNotifier {
    async fn notify(&self, notice: &StatusChangeNotice) -> Result<(), NotificationError> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice.clone());
        Ok(())
    }
}

pub(super) struct FailingNotifier;

#[async_trait]
impl StatusNotifier for FailingNotifier {
    async fn notify(&self, _notice: &StatusChangeNotice) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay down".to_string()))
    }
}

pub(super) struct SlowNotifier(pub(super) Duration);

#[async_trait]
impl StatusNotifier for SlowNotifier {
    async fn notify(&self, _notice: &StatusChangeNotice) -> Result<(), NotificationError> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn apply_status_change(
        &self,
        _expected: ApplicationStatus,
        _change: StatusChangeRecord,
    ) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_notes(
        &self,
        _id: &ApplicationId,
        _notes: Option<String>,
        _at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn history(&self, _id: &ApplicationId) -> Result<Vec<StatusChangeRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_posting(
        &self,
        _posting: &JobPostingId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Lets a competing writer commit `competing` right before the first guarded write lands,
/// reproducing two requests that both read the same pre-state.
pub(super) struct RacingRepository {
    pub(super) inner: InMemoryApplicationRepository,
    competing: Vec<ApplicationStatus>,
    raced: AtomicBool,
    always: bool,
}

impl RacingRepository {
    /// Race only the first write.
    pub(super) fn once(inner: InMemoryApplicationRepository, competing: ApplicationStatus) -> Self {
        Self {
            inner,
            competing: vec![competing],
            raced: AtomicBool::new(false),
            always: false,
        }
    }

    /// Race every write, walking through `competing` one step per write.
    pub(super) fn every_write(
        inner: InMemoryApplicationRepository,
        competing: Vec<ApplicationStatus>,
    ) -> Self {
        Self {
            inner,
            competing,
            raced: AtomicBool::new(false),
            always: true,
        }
    }

    fn competing_write(&self, application_id: &ApplicationId) {
        let current = self
            .inner
            .fetch(application_id)
            .expect("fetch succeeds")
            .expect("record present");
        let next = self
            .competing
            .iter()
            .copied()
            .find(|status| status.rank() > current.status.rank())
            .unwrap_or(ApplicationStatus::Rejected);
        self.inner
            .apply_status_change(
                current.status,
                StatusChangeRecord {
                    id: StatusChangeId::generate(),
                    application_id: application_id.clone(),
                    previous_status: current.status,
                    new_status: next,
                    notes_snapshot: current.internal_notes.clone(),
                    actor: ActorId::from("recruiter-2"),
                    created_at: Utc::now(),
                },
            )
            .expect("competing write succeeds");
    }
}

impl ApplicationRepository for RacingRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn apply_status_change(
        &self,
        expected: ApplicationStatus,
        change: StatusChangeRecord,
    ) -> Result<ApplicationRecord, RepositoryError> {
        if self.always || !self.raced.swap(true, Ordering::SeqCst) {
            self.competing_write(&change.application_id);
        }
        self.inner.apply_status_change(expected, change)
    }

    fn update_notes(
        &self,
        id: &ApplicationId,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError> {
        self.inner.update_notes(id, notes, at)
    }

    fn history(&self, id: &ApplicationId) -> Result<Vec<StatusChangeRecord>, RepositoryError> {
        self.inner.history(id)
    }

    fn for_posting(
        &self,
        posting: &JobPostingId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        self.inner.for_posting(posting)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
