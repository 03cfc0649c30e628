//! Committee voting and decision workflow for label applications.
//!
//! Evaluators submit recommendations and scores, the voting engine aggregates them into
//! a suggested action, and a committee member records the final decision. Storage and
//! notification delivery sit behind traits so the workflow runs without a database.

pub mod domain;
pub mod outbox;
pub mod repository;
pub mod router;
pub mod service;
pub mod stats;
pub mod status;
pub mod voting;

#[cfg(test)]
mod tests;

pub use domain::{
    ActorId, ApplicationId, ApplicationRecord, ApplicationStatus, DecisionSource, Evaluation,
    EvaluatorId, FinalDecision, Recommendation, StartupId, StartupStatus, Verdict,
};
pub use outbox::{
    DispatchReport, NotificationDispatcher, NotificationError, NotificationEvent,
    NotificationEventType, NotificationOutbox, OutboxEntry, OutboxEntryId, OutboxRelay,
    OutboxStatus,
};
pub use repository::{
    ApplicationStatusUpdate, CommitteeRepository, RepositoryError, VotingDecisionRecord,
};
pub use router::{committee_router, ACTOR_HEADER};
pub use service::{
    CommitteeDecisionService, CommitteeServiceError, DecisionReceipt, DecisionRequest,
};
pub use stats::CommitteeStats;
pub use status::{validate_transition, StatusChange, StatusTransitionError};
pub use voting::{
    CalculatedDecision, SuggestedAction, Suggestion, VoteTally, VotingConfig, VotingConfigError,
    VotingEngine, VotingSnapshot,
};
