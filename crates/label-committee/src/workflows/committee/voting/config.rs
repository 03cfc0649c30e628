use serde::{Deserialize, Serialize};

/// Committee voting rules.
///
/// `majority_threshold` is carried for parity with the stored configuration but the
/// tally compares raw counts and never consults it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotingConfig {
    pub quorum_required: u32,
    pub majority_threshold: f64,
    pub min_score_for_approval: u32,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            quorum_required: 3,
            majority_threshold: 0.5,
            min_score_for_approval: 60,
        }
    }
}

impl VotingConfig {
    pub fn validate(&self) -> Result<(), VotingConfigError> {
        if self.quorum_required == 0 {
            return Err(VotingConfigError::ZeroQuorum);
        }
        if !(0.0..=1.0).contains(&self.majority_threshold) {
            return Err(VotingConfigError::ThresholdOutOfRange(self.majority_threshold));
        }
        if self.min_score_for_approval > 100 {
            return Err(VotingConfigError::MinScoreOutOfRange(
                self.min_score_for_approval,
            ));
        }
        Ok(())
    }

    /// True when `majority_threshold` differs from the default, which the tally ignores.
    pub fn unused_threshold_overridden(&self) -> bool {
        (self.majority_threshold - Self::default().majority_threshold).abs() > f64::EPSILON
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VotingConfigError {
    #[error("quorum must be at least 1")]
    ZeroQuorum,
    #[error("majority threshold {0} must be between 0 and 1")]
    ThresholdOutOfRange(f64),
    #[error("minimum approval score {0} must be within 0-100")]
    MinScoreOutOfRange(u32),
}

impl VotingConfigError {
    /// Environment variable carrying the offending setting.
    pub fn env_key(&self) -> &'static str {
        match self {
            VotingConfigError::ZeroQuorum => "VOTING_QUORUM_REQUIRED",
            VotingConfigError::ThresholdOutOfRange(_) => "VOTING_MAJORITY_THRESHOLD",
            VotingConfigError::MinScoreOutOfRange(_) => "VOTING_MIN_SCORE_FOR_APPROVAL",
        }
    }
}
