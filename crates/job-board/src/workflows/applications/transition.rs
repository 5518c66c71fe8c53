//! Pipeline transition rules.
//!
//! Rules, in order:
//! 1. re-applying the current status is always accepted as a no-op;
//! 2. nothing leaves `Hired` or `Rejected`;
//! 3. any other stage may be rejected;
//! 4. ranked stages may move forward or stay put, never backward. Skipping ranks is allowed.

use serde::Serialize;

use super::domain::ApplicationStatus;

/// What an accepted transition does to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Unchanged,
    Advance,
    Reject,
}

/// Why a transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum TransitionDenial {
    #[error("application is in a terminal state")]
    TerminalState,
    #[error("applications cannot move backward in the pipeline")]
    BackwardMove,
}

impl TransitionDenial {
    pub const fn code(self) -> &'static str {
        match self {
            TransitionDenial::TerminalState => "terminal_state",
            TransitionDenial::BackwardMove => "backward_move",
        }
    }
}

pub fn check(
    current: ApplicationStatus,
    requested: ApplicationStatus,
) -> Result<TransitionKind, TransitionDenial> {
    if requested == current {
        return Ok(TransitionKind::Unchanged);
    }
    if current.is_terminal() {
        return Err(TransitionDenial::TerminalState);
    }
    if requested == ApplicationStatus::Rejected {
        return Ok(TransitionKind::Reject);
    }

    match (current.rank(), requested.rank()) {
        (Some(from), Some(to)) if to > from => Ok(TransitionKind::Advance),
        (Some(from), Some(to)) if to == from => Ok(TransitionKind::Unchanged),
        _ => Err(TransitionDenial::BackwardMove),
    }
}

pub fn is_allowed(current: ApplicationStatus, requested: ApplicationStatus) -> bool {
    check(current, requested).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    #[test]
    fn matrix_matches_pipeline_rules() {
        for current in ApplicationStatus::ALL {
            for requested in ApplicationStatus::ALL {
                let expected = if requested == current {
                    true
                } else if current.is_terminal() {
                    false
                } else if requested == Rejected {
                    true
                } else {
                    requested.rank() >= current.rank()
                };
                assert_eq!(
                    is_allowed(current, requested),
                    expected,
                    "{current} -> {requested}"
                );
            }
        }
    }

    #[test]
    fn reports_reason_for_denials() {
        assert_eq!(check(Hired, Interview), Err(TransitionDenial::TerminalState));
        assert_eq!(check(Rejected, Submitted), Err(TransitionDenial::TerminalState));
        assert_eq!(check(Evaluation, Interview), Err(TransitionDenial::BackwardMove));
        assert_eq!(TransitionDenial::BackwardMove.code(), "backward_move");
    }

    #[test]
    fn allows_skipping_ranks_and_rejection() {
        assert_eq!(check(Submitted, Hired), Ok(TransitionKind::Advance));
        assert_eq!(check(Interview, Rejected), Ok(TransitionKind::Reject));
        assert_eq!(check(Evaluation, Evaluation), Ok(TransitionKind::Unchanged));
        assert_eq!(check(Rejected, Rejected), Ok(TransitionKind::Unchanged));
    }
}
