use serde::{Deserialize, Serialize};

use super::domain::FinalDecision;
use super::voting::{SuggestedAction, VotingSnapshot};

/// Committee-wide roll-up of the voting pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitteeStats {
    pub applications: usize,
    pub awaiting_quorum: usize,
    pub ready_for_decision: usize,
    pub needs_review: usize,
    pub approved: usize,
    pub rejected: usize,
    /// Mean submitted votes per application, one decimal.
    pub average_participation: f64,
}

impl CommitteeStats {
    pub fn from_snapshots(snapshots: &[VotingSnapshot]) -> Self {
        let mut stats = CommitteeStats {
            applications: snapshots.len(),
            ..CommitteeStats::default()
        };

        for snapshot in snapshots {
            match snapshot.final_decision {
                Some(FinalDecision::Approved) => stats.approved += 1,
                Some(FinalDecision::Rejected) => stats.rejected += 1,
                Some(FinalDecision::Pending) | None => match snapshot.suggested_action() {
                    SuggestedAction::WaitForQuorum => stats.awaiting_quorum += 1,
                    SuggestedAction::Approve | SuggestedAction::Reject => {
                        stats.ready_for_decision += 1
                    }
                    SuggestedAction::NeedsReview => stats.needs_review += 1,
                },
            }
        }

        if !snapshots.is_empty() {
            let votes: u64 = snapshots
                .iter()
                .map(|snapshot| u64::from(snapshot.total_votes))
                .sum();
            let mean = votes as f64 / snapshots.len() as f64;
            stats.average_participation = (mean * 10.0).round() / 10.0;
        }

        stats
    }
}
