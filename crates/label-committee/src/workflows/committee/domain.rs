use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for label applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier of the startup a dossier was filed for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StartupId(pub String);

/// Committee evaluator identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EvaluatorId(pub String);

/// Authenticated committee member recording a decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// An evaluator's individual vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Approve,
    Reject,
    Pending,
}

impl Recommendation {
    pub const fn label(self) -> &'static str {
        match self {
            Recommendation::Approve => "approve",
            Recommendation::Reject => "reject",
            Recommendation::Pending => "pending",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approve" | "approved" => Some(Self::Approve),
            "reject" | "rejected" => Some(Self::Reject),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }
}

/// One evaluator's review of one application.
///
/// A missing recommendation counts as pending once the evaluation is submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub evaluator_id: EvaluatorId,
    pub application_id: ApplicationId,
    #[serde(default)]
    pub recommendation: Option<Recommendation>,
    #[serde(default)]
    pub total_score: Option<f64>,
    #[serde(default)]
    pub is_submitted: bool,
}

impl Evaluation {
    pub fn effective_recommendation(&self) -> Recommendation {
        self.recommendation.unwrap_or(Recommendation::Pending)
    }
}

/// Decision a committee member can apply to an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approved,
    Rejected,
}

impl Verdict {
    pub const fn label(self) -> &'static str {
        match self {
            Verdict::Approved => "approved",
            Verdict::Rejected => "rejected",
        }
    }

    pub const fn application_status(self) -> ApplicationStatus {
        match self {
            Verdict::Approved => ApplicationStatus::Approved,
            Verdict::Rejected => ApplicationStatus::Rejected,
        }
    }
}

/// Value stored in the `final_decision` column of a decision record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalDecision {
    Approved,
    Rejected,
    Pending,
}

impl From<Verdict> for FinalDecision {
    fn from(value: Verdict) -> Self {
        match value {
            Verdict::Approved => FinalDecision::Approved,
            Verdict::Rejected => FinalDecision::Rejected,
        }
    }
}

/// Provenance of a recorded decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Automatic,
    Manual,
    Override,
}

impl DecisionSource {
    pub const fn label(self) -> &'static str {
        match self {
            DecisionSource::Automatic => "automatic",
            DecisionSource::Manual => "manual",
            DecisionSource::Override => "override",
        }
    }
}

/// Lifecycle status of a label application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Approved | ApplicationStatus::Rejected)
    }
}

/// Status of the startup behind an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupStatus {
    Pending,
    Labeled,
}

impl StartupStatus {
    pub const fn label(self) -> &'static str {
        match self {
            StartupStatus::Pending => "pending",
            StartupStatus::Labeled => "labeled",
        }
    }
}

/// Application row as seen by the committee workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub application_id: ApplicationId,
    pub startup_id: StartupId,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub reviewed_by: Option<ActorId>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl ApplicationRecord {
    pub fn new(application_id: ApplicationId, startup_id: StartupId) -> Self {
        Self {
            application_id,
            startup_id,
            status: ApplicationStatus::Draft,
            reviewed_by: None,
            reviewed_at: None,
        }
    }
}
