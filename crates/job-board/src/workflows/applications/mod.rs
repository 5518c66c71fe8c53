//! Application pipeline: status transitions, audit trail, and candidate notices.

pub mod access;
pub mod audit;
pub mod domain;
pub mod mailer;
pub mod notification;
pub mod repository;
pub mod router;
pub mod service;
pub mod transition;

#[cfg(test)]
mod tests;

pub use access::{ActorClaims, ActorRole, PipelineAuthority};
pub use audit::{history_csv, write_history_csv, AuditExportError};
pub use domain::{
    ActorId, ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationSubmission,
    ApplicationSummary, CandidateContact, CandidateId, JobPostingId, StatusChangeId,
    StatusChangeRecord, UnknownStatus,
};
pub use mailer::{MailerError, WebhookMailer};
pub use notification::{
    NotificationDelivery, NotificationError, NotificationMessage, StatusChangeNotice,
    StatusNotifier,
};
pub use repository::{ApplicationRepository, InMemoryApplicationRepository, RepositoryError};
pub use router::{application_router, ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};
pub use service::{ApplicationPipelineService, ApplicationServiceError, StatusChangeOutcome};
pub use transition::{TransitionDenial, TransitionKind};
