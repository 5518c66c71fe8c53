use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, JobPostingId, StatusChangeRecord,
};

/// Storage abstraction so the service module can be exercised in isolation.
///
/// `apply_status_change` must update the status and append the audit record as one unit, and only
/// when the stored status still equals `expected`.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn apply_status_change(
        &self,
        expected: ApplicationStatus,
        change: StatusChangeRecord,
    ) -> Result<ApplicationRecord, RepositoryError>;
    fn update_notes(
        &self,
        id: &ApplicationId,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError>;
    fn history(&self, id: &ApplicationId) -> Result<Vec<StatusChangeRecord>, RepositoryError>;
    fn for_posting(
        &self,
        posting: &JobPostingId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("stored status changed to {stored} before the write")]
    StaleStatus { stored: ApplicationStatus },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Default)]
struct Tables {
    applications: HashMap<ApplicationId, ApplicationRecord>,
    history: HashMap<ApplicationId, Vec<StatusChangeRecord>>,
}

/// Process-local repository; one lock covers applications and their audit trails.
#[derive(Default, Clone)]
pub struct InMemoryApplicationRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryApplicationRepository {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.applications.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        tables
            .applications
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(self.lock()?.applications.get(id).cloned())
    }

    fn apply_status_change(
        &self,
        expected: ApplicationStatus,
        change: StatusChangeRecord,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut tables = self.lock()?;
        let record = tables
            .applications
            .get_mut(&change.application_id)
            .ok_or(RepositoryError::NotFound)?;
        if record.status != expected {
            return Err(RepositoryError::StaleStatus {
                stored: record.status,
            });
        }

        record.status = change.new_status;
        record.updated_at = change.created_at;
        let updated = record.clone();
        tables
            .history
            .entry(change.application_id.clone())
            .or_default()
            .push(change);
        Ok(updated)
    }

    fn update_notes(
        &self,
        id: &ApplicationId,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut tables = self.lock()?;
        let record = tables
            .applications
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        record.internal_notes = notes;
        record.updated_at = at;
        Ok(record.clone())
    }

    fn history(&self, id: &ApplicationId) -> Result<Vec<StatusChangeRecord>, RepositoryError> {
        let tables = self.lock()?;
        if !tables.applications.contains_key(id) {
            return Err(RepositoryError::NotFound);
        }
        Ok(tables.history.get(id).cloned().unwrap_or_default())
    }

    fn for_posting(
        &self,
        posting: &JobPostingId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let tables = self.lock()?;
        let mut records: Vec<_> = tables
            .applications
            .values()
            .filter(|record| &record.job_posting_id == posting)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(records)
    }
}
