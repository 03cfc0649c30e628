use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use super::domain::{
    ActorId, ApplicationId, ApplicationRecord, ApplicationStatus, DecisionSource, Evaluation,
    EvaluatorId, StartupId, StartupStatus, Verdict,
};
use super::outbox::{NotificationEvent, NotificationOutbox, OutboxEntryId};
use super::repository::{
    ApplicationStatusUpdate, CommitteeRepository, RepositoryError, VotingDecisionRecord,
};
use super::stats::CommitteeStats;
use super::status::{validate_transition, StatusTransitionError};
use super::voting::{VotingConfig, VotingEngine, VotingSnapshot};

/// Statuses that take part in committee voting.
const VOTING_PIPELINE: [ApplicationStatus; 3] = [
    ApplicationStatus::UnderReview,
    ApplicationStatus::Approved,
    ApplicationStatus::Rejected,
];

/// A committee member's request to record a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRequest {
    pub verdict: Verdict,
    pub source: DecisionSource,
    pub notes: Option<String>,
}

/// What a successful decision wrote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionReceipt {
    pub decision: VotingDecisionRecord,
    pub application_status: ApplicationStatus,
    pub startup_status: Option<StartupStatus>,
    /// `None` when the notification could not be queued.
    pub notification: Option<OutboxEntryId>,
}

/// Service composing the voting engine, the committee repository, and the outbox.
pub struct CommitteeDecisionService<R, O> {
    repository: Arc<R>,
    outbox: Arc<O>,
    engine: Arc<VotingEngine>,
}

impl<R, O> CommitteeDecisionService<R, O>
where
    R: CommitteeRepository + 'static,
    O: NotificationOutbox + 'static,
{
    pub fn new(repository: Arc<R>, outbox: Arc<O>, config: VotingConfig) -> Self {
        Self {
            repository,
            outbox,
            engine: Arc::new(VotingEngine::new(config)),
        }
    }

    pub fn voting_config(&self) -> &VotingConfig {
        self.engine.config()
    }

    fn application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, CommitteeServiceError> {
        let record = self
            .repository
            .get_application(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Aggregate the current vote for one application.
    pub fn voting_snapshot(
        &self,
        application_id: &ApplicationId,
    ) -> Result<VotingSnapshot, CommitteeServiceError> {
        self.application(application_id)?;
        self.snapshot_unchecked(application_id)
    }

    fn snapshot_unchecked(
        &self,
        application_id: &ApplicationId,
    ) -> Result<VotingSnapshot, CommitteeServiceError> {
        let evaluations = self.repository.get_evaluations(application_id)?;
        let existing = self.repository.get_decision(application_id)?;
        Ok(self
            .engine
            .snapshot(application_id, &evaluations, existing.as_ref()))
    }

    /// Store an evaluator's review, refusing edits once it has been submitted.
    pub fn record_evaluation(
        &self,
        evaluation: Evaluation,
    ) -> Result<VotingSnapshot, CommitteeServiceError> {
        if let Some(score) = evaluation.total_score {
            if !(0.0..=100.0).contains(&score) {
                return Err(CommitteeServiceError::ScoreOutOfRange(score));
            }
        }

        let application = self.application(&evaluation.application_id)?;
        let existing = self.repository.get_evaluations(&application.application_id)?;
        if existing
            .iter()
            .any(|row| row.evaluator_id == evaluation.evaluator_id && row.is_submitted)
        {
            return Err(CommitteeServiceError::EvaluationLocked {
                evaluator_id: evaluation.evaluator_id,
            });
        }

        if matches!(
            application.status,
            ApplicationStatus::Draft | ApplicationStatus::Pending
        ) {
            // Drafts have not been filed yet and fail here.
            validate_transition(application.status, ApplicationStatus::UnderReview, None)?;
            self.repository.update_application_status(
                &application.application_id,
                ApplicationStatusUpdate {
                    status: ApplicationStatus::UnderReview,
                    reviewed_by: application.reviewed_by.clone(),
                    reviewed_at: application.reviewed_at,
                },
            )?;
            info!(
                application = %application.application_id.0,
                "application moved under review"
            );
        }

        self.repository.save_evaluation(evaluation)?;
        self.snapshot_unchecked(&application.application_id)
    }

    /// File a new application as a `draft` for the given startup.
    pub fn register_application(
        &self,
        application_id: ApplicationId,
        startup_id: StartupId,
    ) -> Result<ApplicationRecord, CommitteeServiceError> {
        if application_id.0.trim().is_empty() {
            return Err(CommitteeServiceError::BlankIdentifier("application_id"));
        }
        if startup_id.0.trim().is_empty() {
            return Err(CommitteeServiceError::BlankIdentifier("startup_id"));
        }

        let record = self
            .repository
            .create_application(ApplicationRecord::new(application_id, startup_id))?;
        info!(
            application = %record.application_id.0,
            startup = %record.startup_id.0,
            "application registered"
        );
        Ok(record)
    }

    /// Move an application along the intake path (`draft -> pending -> under_review`).
    pub fn transition_application(
        &self,
        application_id: &ApplicationId,
        target: ApplicationStatus,
    ) -> Result<ApplicationRecord, CommitteeServiceError> {
        let mut application = self.application(application_id)?;
        let change = validate_transition(application.status, target, None)?;

        self.repository.update_application_status(
            application_id,
            ApplicationStatusUpdate {
                status: change.target(),
                reviewed_by: application.reviewed_by.clone(),
                reviewed_at: application.reviewed_at,
            },
        )?;
        application.status = change.target();
        Ok(application)
    }

    /// Persist the committee's decision and queue the notification.
    ///
    /// The writes are sequential and not rolled back: a failure after the decision
    /// upsert leaves the decision in place.
    pub fn apply_decision(
        &self,
        application_id: &ApplicationId,
        actor: Option<&ActorId>,
        request: DecisionRequest,
    ) -> Result<DecisionReceipt, CommitteeServiceError> {
        let actor = match actor {
            Some(actor) if !actor.is_blank() => actor.clone(),
            _ => return Err(CommitteeServiceError::Unauthenticated),
        };

        let DecisionRequest {
            verdict,
            source,
            notes,
        } = request;
        let notes = notes
            .map(|notes| notes.trim().to_string())
            .filter(|notes| !notes.is_empty());
        if source == DecisionSource::Override && notes.is_none() {
            return Err(CommitteeServiceError::MissingJustification);
        }

        let application = self.application(application_id)?;
        let change =
            validate_transition(application.status, verdict.application_status(), Some(source))?;

        let snapshot = self.snapshot_unchecked(application_id)?;
        let decided_at = Utc::now();
        let record = VotingDecisionRecord::decided(
            &snapshot,
            verdict,
            actor.clone(),
            source,
            notes.clone(),
            decided_at,
        );

        let decision = self
            .repository
            .upsert_decision(record)
            .map_err(|err| log_write_failure(application_id, "upsert decision", err))?;

        self.repository
            .update_application_status(
                application_id,
                ApplicationStatusUpdate {
                    status: change.target(),
                    reviewed_by: Some(actor.clone()),
                    reviewed_at: Some(decided_at),
                },
            )
            .map_err(|err| {
                log_write_failure(application_id, "update application status", err)
            })?;

        let startup_status = if verdict == Verdict::Approved {
            Some(StartupStatus::Labeled)
        } else if change.revokes_approval() {
            Some(StartupStatus::Pending)
        } else {
            None
        };
        if let Some(status) = startup_status {
            self.repository
                .update_startup_status(&application.startup_id, status)
                .map_err(|err| log_write_failure(application_id, "update startup status", err))?;
        }

        let event =
            NotificationEvent::decision_applied(application_id.clone(), verdict, source, notes);
        let notification = match self.outbox.enqueue(event) {
            Ok(id) => Some(id),
            Err(err) => {
                warn!(
                    application = %application_id.0,
                    error = %err,
                    "decision notification could not be queued"
                );
                None
            }
        };

        info!(
            application = %application_id.0,
            decision = verdict.label(),
            source = source.label(),
            decided_by = %actor.0,
            suggested = snapshot.suggestion.action.label(),
            "committee decision applied"
        );

        Ok(DecisionReceipt {
            decision,
            application_status: change.target(),
            startup_status,
            notification,
        })
    }

    /// Record a decision that goes against or ignores the suggestion.
    pub fn override_decision(
        &self,
        application_id: &ApplicationId,
        actor: Option<&ActorId>,
        verdict: Verdict,
        notes: &str,
    ) -> Result<DecisionReceipt, CommitteeServiceError> {
        if notes.trim().is_empty() {
            return Err(CommitteeServiceError::MissingJustification);
        }

        self.apply_decision(
            application_id,
            actor,
            DecisionRequest {
                verdict,
                source: DecisionSource::Override,
                notes: Some(notes.to_string()),
            },
        )
    }

    /// Roll up every application currently in the voting pipeline.
    pub fn committee_stats(&self) -> Result<CommitteeStats, CommitteeServiceError> {
        let applications = self.repository.list_applications(&VOTING_PIPELINE)?;
        let snapshots = applications
            .iter()
            .map(|application| self.snapshot_unchecked(&application.application_id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CommitteeStats::from_snapshots(&snapshots))
    }
}

fn log_write_failure(
    application_id: &ApplicationId,
    step: &'static str,
    err: RepositoryError,
) -> RepositoryError {
    error!(application = %application_id.0, step, error = %err, "committee decision write failed");
    err
}

/// Error raised by the committee service.
#[derive(Debug, thiserror::Error)]
pub enum CommitteeServiceError {
    #[error("an authenticated committee member is required")]
    Unauthenticated,
    #[error("an override requires a written justification")]
    MissingJustification,
    #[error("{0} must not be blank")]
    BlankIdentifier(&'static str),
    #[error("evaluation by {} is already submitted", .evaluator_id.0)]
    EvaluationLocked { evaluator_id: EvaluatorId },
    #[error("score {0} is outside 0-100")]
    ScoreOutOfRange(f64),
    #[error(transparent)]
    Transition(#[from] StatusTransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
