use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ActorId, ApplicationId, ApplicationRecord, ApplicationStatus, DecisionSource, Evaluation,
    FinalDecision, StartupId, StartupStatus, Verdict,
};
use super::voting::{CalculatedDecision, VotingSnapshot};

/// Persisted committee decision, one per application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotingDecisionRecord {
    pub application_id: ApplicationId,
    pub quorum_required: u32,
    pub quorum_reached: bool,
    pub approve_count: u32,
    pub reject_count: u32,
    pub pending_count: u32,
    pub total_votes: u32,
    pub calculated_decision: Option<CalculatedDecision>,
    pub decision_confidence: u8,
    pub average_score: Option<u32>,
    pub final_decision: Option<FinalDecision>,
    pub decided_by: Option<ActorId>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decision_source: Option<DecisionSource>,
    pub decision_notes: Option<String>,
}

impl VotingDecisionRecord {
    /// Freeze the current vote alongside the committee's decision.
    pub fn decided(
        snapshot: &VotingSnapshot,
        verdict: Verdict,
        decided_by: ActorId,
        source: DecisionSource,
        notes: Option<String>,
        decided_at: DateTime<Utc>,
    ) -> Self {
        Self {
            application_id: snapshot.application_id.clone(),
            quorum_required: snapshot.quorum_required,
            quorum_reached: snapshot.quorum_reached,
            approve_count: snapshot.approve_count,
            reject_count: snapshot.reject_count,
            pending_count: snapshot.pending_count,
            total_votes: snapshot.total_votes,
            calculated_decision: snapshot.calculated_decision,
            decision_confidence: snapshot.decision_confidence,
            average_score: snapshot.average_score,
            final_decision: Some(verdict.into()),
            decided_by: Some(decided_by),
            decided_at: Some(decided_at),
            decision_source: Some(source),
            decision_notes: notes,
        }
    }
}

/// Status columns written when an application moves.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationStatusUpdate {
    pub status: ApplicationStatus,
    pub reviewed_by: Option<ActorId>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Storage abstraction over the evaluation, decision, application and startup tables.
pub trait CommitteeRepository: Send + Sync {
    fn get_evaluations(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<Evaluation>, RepositoryError>;
    fn save_evaluation(&self, evaluation: Evaluation) -> Result<(), RepositoryError>;
    fn get_decision(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Option<VotingDecisionRecord>, RepositoryError>;
    /// Insert or replace the decision keyed on `application_id`.
    fn upsert_decision(
        &self,
        record: VotingDecisionRecord,
    ) -> Result<VotingDecisionRecord, RepositoryError>;
    /// Insert a new application; `Conflict` when the id is taken. Registers the
    /// startup as `pending` unless it is already known.
    fn create_application(
        &self,
        record: ApplicationRecord,
    ) -> Result<ApplicationRecord, RepositoryError>;
    fn get_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn list_applications(
        &self,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<ApplicationRecord>, RepositoryError>;
    fn update_application_status(
        &self,
        application_id: &ApplicationId,
        update: ApplicationStatusUpdate,
    ) -> Result<(), RepositoryError>;
    fn update_startup_status(
        &self,
        startup_id: &StartupId,
        status: StartupStatus,
    ) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
