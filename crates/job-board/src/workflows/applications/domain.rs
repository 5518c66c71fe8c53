use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier wrapper for submitted applications.
    ApplicationId
);
string_id!(
    /// Job posting an application belongs to.
    JobPostingId
);
string_id!(CandidateId);
string_id!(
    /// Who performed a pipeline change, as asserted by the session provider.
    ActorId
);
string_id!(StatusChangeId);

impl ApplicationId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl StatusChangeId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Pipeline stage of an application.
///
/// `Submitted` through `Hired` form an ordered progression; `Rejected` sits outside it and
/// absorbs every non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Submitted,
    Interview,
    Evaluation,
    Hired,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Submitted,
        ApplicationStatus::Interview,
        ApplicationStatus::Evaluation,
        ApplicationStatus::Hired,
        ApplicationStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "SUBMITTED",
            ApplicationStatus::Interview => "INTERVIEW",
            ApplicationStatus::Evaluation => "EVALUATION",
            ApplicationStatus::Hired => "HIRED",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }

    /// Position in the forward progression; `None` for `Rejected`.
    pub const fn rank(self) -> Option<u8> {
        match self {
            ApplicationStatus::Submitted => Some(0),
            ApplicationStatus::Interview => Some(1),
            ApplicationStatus::Evaluation => Some(2),
            ApplicationStatus::Hired => Some(3),
            ApplicationStatus::Rejected => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Hired | ApplicationStatus::Rejected)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown application status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

/// Contact details copied onto the application so notices can be sent without a profile lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateContact {
    pub candidate_id: CandidateId,
    pub display_name: String,
    pub email: String,
}

/// Payload a candidate sends when applying to a posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub job_posting_id: JobPostingId,
    pub job_title: String,
    pub candidate: CandidateContact,
    #[serde(default)]
    pub internal_notes: Option<String>,
}

/// Stored application and its current pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub job_posting_id: JobPostingId,
    pub job_title: String,
    pub candidate: CandidateContact,
    pub status: ApplicationStatus,
    pub internal_notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationRecord {
    /// Candidate-safe view without internal notes.
    pub fn summary(&self) -> ApplicationSummary {
        ApplicationSummary {
            application_id: self.id.clone(),
            job_posting_id: self.job_posting_id.clone(),
            job_title: self.job_title.clone(),
            candidate_name: self.candidate.display_name.clone(),
            status: self.status,
            submitted_at: self.submitted_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationSummary {
    pub application_id: ApplicationId,
    pub job_posting_id: JobPostingId,
    pub job_title: String,
    pub candidate_name: String,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable audit entry written alongside every accepted status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangeRecord {
    pub id: StatusChangeId,
    pub application_id: ApplicationId,
    pub previous_status: ApplicationStatus,
    pub new_status: ApplicationStatus,
    pub notes_snapshot: Option<String>,
    pub actor: ActorId,
    pub created_at: DateTime<Utc>,
}
