use super::domain::{ApplicationStatus, DecisionSource};

/// Outcome of a validated status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Changed {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    Unchanged(ApplicationStatus),
}

impl StatusChange {
    pub const fn target(self) -> ApplicationStatus {
        match self {
            StatusChange::Changed { to, .. } => to,
            StatusChange::Unchanged(status) => status,
        }
    }

    /// True when a previously approved application is being rejected.
    pub const fn revokes_approval(self) -> bool {
        matches!(
            self,
            StatusChange::Changed {
                from: ApplicationStatus::Approved,
                to: ApplicationStatus::Rejected,
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move application from {} to {}", .from.label(), .to.label())]
pub struct StatusTransitionError {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
}

/// Central transition table for application statuses.
///
/// `draft -> pending -> under_review -> {approved, rejected}`. Re-applying a terminal
/// status is accepted unchanged; flipping between terminal statuses requires an override.
pub fn validate_transition(
    from: ApplicationStatus,
    to: ApplicationStatus,
    source: Option<DecisionSource>,
) -> Result<StatusChange, StatusTransitionError> {
    use ApplicationStatus::*;

    if from == to && from.is_terminal() {
        return Ok(StatusChange::Unchanged(from));
    }

    let allowed = match (from, to) {
        (Draft, Pending) | (Pending, UnderReview) => true,
        (UnderReview, Approved) | (UnderReview, Rejected) => source.is_some(),
        (Approved, Rejected) | (Rejected, Approved) => source == Some(DecisionSource::Override),
        _ => false,
    };

    if allowed {
        Ok(StatusChange::Changed { from, to })
    } else {
        Err(StatusTransitionError { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    #[test]
    fn intake_path_moves_forward_only() {
        assert!(validate_transition(Draft, Pending, None).is_ok());
        assert!(validate_transition(Pending, UnderReview, None).is_ok());
        assert_eq!(
            validate_transition(UnderReview, Pending, None),
            Err(StatusTransitionError {
                from: UnderReview,
                to: Pending
            })
        );
        assert!(validate_transition(Draft, UnderReview, None).is_err());
    }

    #[test]
    fn terminal_statuses_require_a_decision() {
        assert!(validate_transition(UnderReview, Approved, None).is_err());
        assert!(validate_transition(UnderReview, Approved, Some(DecisionSource::Manual)).is_ok());
        assert!(validate_transition(Draft, Approved, Some(DecisionSource::Override)).is_err());
        assert!(validate_transition(Pending, Rejected, Some(DecisionSource::Manual)).is_err());
    }

    #[test]
    fn reapplying_terminal_status_is_unchanged() {
        let change = validate_transition(Approved, Approved, Some(DecisionSource::Manual))
            .expect("same verdict accepted");
        assert_eq!(change, StatusChange::Unchanged(Approved));
        assert!(!change.revokes_approval());
    }

    #[test]
    fn reversal_is_reserved_for_overrides() {
        assert!(validate_transition(Approved, Rejected, Some(DecisionSource::Manual)).is_err());
        let change = validate_transition(Approved, Rejected, Some(DecisionSource::Override))
            .expect("override reverses");
        assert!(change.revokes_approval());
        assert_eq!(change.target(), Rejected);
    }

    #[test]
    fn error_message_uses_status_labels() {
        let err = validate_transition(Draft, Approved, None).expect_err("invalid");
        assert_eq!(
            err.to_string(),
            "cannot move application from draft to approved"
        );
    }
}
