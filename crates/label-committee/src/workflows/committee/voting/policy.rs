use serde::{Deserialize, Serialize};

use super::config::VotingConfig;
use super::tally::VoteTally;

/// Raw majority outcome, ignoring the score threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculatedDecision {
    Approve,
    Reject,
    Tie,
    Pending,
}

impl CalculatedDecision {
    pub const fn label(self) -> &'static str {
        match self {
            CalculatedDecision::Approve => "approve",
            CalculatedDecision::Reject => "reject",
            CalculatedDecision::Tie => "tie",
            CalculatedDecision::Pending => "pending",
        }
    }
}

/// Recommendation handed to the committee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    WaitForQuorum,
    Approve,
    Reject,
    NeedsReview,
}

impl SuggestedAction {
    pub const fn label(self) -> &'static str {
        match self {
            SuggestedAction::WaitForQuorum => "wait_for_quorum",
            SuggestedAction::Approve => "approve",
            SuggestedAction::Reject => "reject",
            SuggestedAction::NeedsReview => "needs_review",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub action: SuggestedAction,
    pub justification: String,
}

/// Majority outcome plus confidence percentage, or `None` before quorum.
pub(crate) fn calculate_decision(
    tally: &VoteTally,
    config: &VotingConfig,
) -> Option<(CalculatedDecision, u8)> {
    if !tally.quorum_reached(config.quorum_required) {
        return None;
    }

    let VoteTally {
        approve_count: approve,
        reject_count: reject,
        pending_count: pending,
        ..
    } = *tally;

    let outcome = if approve > reject && approve > pending {
        (CalculatedDecision::Approve, tally.share_of_votes(approve))
    } else if reject > approve && reject > pending {
        (CalculatedDecision::Reject, tally.share_of_votes(reject))
    } else if approve == reject && approve > 0 && pending <= approve {
        (CalculatedDecision::Tie, 50)
    } else {
        (CalculatedDecision::Pending, tally.share_of_votes(pending))
    };

    Some(outcome)
}

pub(crate) fn score_passes_threshold(tally: &VoteTally, config: &VotingConfig) -> bool {
    tally
        .average_score
        .map(|score| score >= config.min_score_for_approval)
        .unwrap_or(false)
}

/// First matching rule wins; a reject majority is never held back by the score.
pub(crate) fn suggest_action(
    tally: &VoteTally,
    config: &VotingConfig,
    decision: Option<CalculatedDecision>,
) -> Suggestion {
    let score_passes = score_passes_threshold(tally, config);
    let average = tally
        .average_score
        .map(|score| score.to_string())
        .unwrap_or_else(|| "n/a".to_string());

    let (action, justification) = match decision {
        None => (
            SuggestedAction::WaitForQuorum,
            format!(
                "Quorum not reached: {}/{} votes submitted, {} remaining",
                tally.total_votes,
                config.quorum_required,
                tally.votes_remaining(config.quorum_required)
            ),
        ),
        Some(CalculatedDecision::Approve) if score_passes => (
            SuggestedAction::Approve,
            format!(
                "Majority approves ({}/{}) with average score {} meeting the {} threshold",
                tally.approve_count, tally.total_votes, average, config.min_score_for_approval
            ),
        ),
        Some(CalculatedDecision::Reject) => (
            SuggestedAction::Reject,
            format!(
                "Majority rejects ({}/{}), average score {}",
                tally.reject_count, tally.total_votes, average
            ),
        ),
        Some(CalculatedDecision::Approve) => (
            SuggestedAction::NeedsReview,
            format!(
                "Majority approves ({}/{}) but average score {} is below the {} threshold",
                tally.approve_count, tally.total_votes, average, config.min_score_for_approval
            ),
        ),
        Some(CalculatedDecision::Tie) => (
            SuggestedAction::NeedsReview,
            format!(
                "Tie between approve and reject ({} each); committee deliberation required",
                tally.approve_count
            ),
        ),
        Some(CalculatedDecision::Pending) => (
            SuggestedAction::NeedsReview,
            format!(
                "No clear majority: {} of {} votes are pending",
                tally.pending_count, tally.total_votes
            ),
        ),
    };

    Suggestion {
        action,
        justification,
    }
}
