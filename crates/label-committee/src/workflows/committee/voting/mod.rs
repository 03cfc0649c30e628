mod config;
mod policy;
mod tally;

pub use config::{VotingConfig, VotingConfigError};
pub use policy::{CalculatedDecision, SuggestedAction, Suggestion};
pub use tally::VoteTally;

use super::domain::{ApplicationId, DecisionSource, Evaluation, FinalDecision};
use super::repository::VotingDecisionRecord;
use policy::{calculate_decision, score_passes_threshold, suggest_action};
use serde::{Deserialize, Serialize};

/// Stateless aggregator that applies the voting rules to an application's evaluations.
#[derive(Debug, Clone, Default)]
pub struct VotingEngine {
    config: VotingConfig,
}

impl VotingEngine {
    pub fn new(config: VotingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VotingConfig {
        &self.config
    }

    pub fn snapshot(
        &self,
        application_id: &ApplicationId,
        evaluations: &[Evaluation],
        existing: Option<&VotingDecisionRecord>,
    ) -> VotingSnapshot {
        let tally = VoteTally::from_evaluations(evaluations);
        let calculated = calculate_decision(&tally, &self.config);
        let calculated_decision = calculated.map(|(decision, _)| decision);
        let decision_confidence = calculated.map(|(_, confidence)| confidence).unwrap_or(0);
        let suggestion = suggest_action(&tally, &self.config, calculated_decision);

        let final_decision = existing.and_then(|record| record.final_decision);
        let decision_source = existing.and_then(|record| record.decision_source);

        VotingSnapshot {
            application_id: application_id.clone(),
            quorum_required: self.config.quorum_required,
            quorum_reached: tally.quorum_reached(self.config.quorum_required),
            votes_remaining: tally.votes_remaining(self.config.quorum_required),
            approve_count: tally.approve_count,
            reject_count: tally.reject_count,
            pending_count: tally.pending_count,
            total_votes: tally.total_votes,
            average_score: tally.average_score,
            calculated_decision,
            decision_confidence,
            score_passes_threshold: score_passes_threshold(&tally, &self.config),
            suggestion,
            final_decision,
            decision_source,
            is_final: final_decision.is_some(),
        }
    }
}

/// Read-only view of the vote for one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotingSnapshot {
    pub application_id: ApplicationId,
    pub quorum_required: u32,
    pub quorum_reached: bool,
    pub votes_remaining: u32,
    pub approve_count: u32,
    pub reject_count: u32,
    pub pending_count: u32,
    pub total_votes: u32,
    pub average_score: Option<u32>,
    pub calculated_decision: Option<CalculatedDecision>,
    pub decision_confidence: u8,
    pub score_passes_threshold: bool,
    pub suggestion: Suggestion,
    pub final_decision: Option<FinalDecision>,
    pub decision_source: Option<DecisionSource>,
    pub is_final: bool,
}

impl VotingSnapshot {
    pub fn suggested_action(&self) -> SuggestedAction {
        self.suggestion.action
    }
}
