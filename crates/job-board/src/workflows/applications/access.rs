use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::domain::ActorId;

/// Role asserted by the session provider for the current caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Candidate,
    Company,
    Admin,
}

impl FromStr for ActorRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "candidate" => Ok(Self::Candidate),
            "company" => Ok(Self::Company),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown actor role '{other}'")),
        }
    }
}

/// Identity claims handed over by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorClaims {
    pub actor_id: ActorId,
    pub role: ActorRole,
}

impl ActorClaims {
    pub fn new(actor_id: impl Into<String>, role: ActorRole) -> Self {
        Self {
            actor_id: ActorId(actor_id.into()),
            role,
        }
    }

    /// Companies and admins may manage application pipelines; candidates may not.
    pub fn pipeline_authority(&self) -> Option<PipelineAuthority> {
        match self.role {
            ActorRole::Company | ActorRole::Admin => Some(PipelineAuthority {
                actor: self.actor_id.clone(),
            }),
            ActorRole::Candidate => None,
        }
    }
}

/// Capability required to change an application's status or internal notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineAuthority {
    actor: ActorId,
}

impl PipelineAuthority {
    pub fn actor(&self) -> &ActorId {
        &self.actor
    }
}
