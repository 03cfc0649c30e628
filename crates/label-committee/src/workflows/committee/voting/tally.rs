use serde::{Deserialize, Serialize};

use super::super::domain::{Evaluation, Recommendation};

/// Vote counts over the submitted evaluations of one application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoteTally {
    pub approve_count: u32,
    pub reject_count: u32,
    pub pending_count: u32,
    pub total_votes: u32,
    pub average_score: Option<u32>,
}

impl VoteTally {
    pub fn from_evaluations(evaluations: &[Evaluation]) -> Self {
        let mut tally = VoteTally::default();
        let mut score_sum = 0.0_f64;
        let mut scored = 0_u32;

        for evaluation in evaluations.iter().filter(|evaluation| evaluation.is_submitted) {
            match evaluation.effective_recommendation() {
                Recommendation::Approve => tally.approve_count += 1,
                Recommendation::Reject => tally.reject_count += 1,
                Recommendation::Pending => tally.pending_count += 1,
            }
            tally.total_votes += 1;

            if let Some(score) = evaluation.total_score {
                score_sum += score;
                scored += 1;
            }
        }

        if scored > 0 {
            tally.average_score = Some((score_sum / f64::from(scored)).round().max(0.0) as u32);
        }

        tally
    }

    pub fn quorum_reached(&self, quorum_required: u32) -> bool {
        self.total_votes >= quorum_required
    }

    pub fn votes_remaining(&self, quorum_required: u32) -> u32 {
        quorum_required.saturating_sub(self.total_votes)
    }

    /// Percentage of all votes held by `count`, rounded to a whole number.
    pub fn share_of_votes(&self, count: u32) -> u8 {
        if self.total_votes == 0 {
            return 0;
        }
        (f64::from(count) / f64::from(self.total_votes) * 100.0).round() as u8
    }
}
