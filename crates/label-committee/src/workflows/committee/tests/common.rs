use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::workflows::committee::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, Evaluation, EvaluatorId, Recommendation,
    StartupId, StartupStatus,
};
use crate::workflows::committee::outbox::{
    NotificationDispatcher, NotificationError, NotificationEvent, NotificationOutbox, OutboxEntry,
    OutboxEntryId, OutboxStatus,
};
use crate::workflows::committee::repository::{
    ApplicationStatusUpdate, CommitteeRepository, RepositoryError, VotingDecisionRecord,
};
use crate::workflows::committee::{CommitteeDecisionService, VotingConfig};

pub(super) fn voting_config() -> VotingConfig {
    VotingConfig {
        quorum_required: 3,
        majority_threshold: 0.5,
        min_score_for_approval: 60,
    }
}

pub(super) fn app_id(suffix: &str) -> ApplicationId {
    ApplicationId(format!("app-{suffix}"))
}

pub(super) fn vote(
    evaluator: &str,
    application: &ApplicationId,
    recommendation: Option<Recommendation>,
    score: Option<f64>,
) -> Evaluation {
    Evaluation {
        evaluator_id: EvaluatorId(evaluator.to_string()),
        application_id: application.clone(),
        recommendation,
        total_score: score,
        is_submitted: true,
    }
}

pub(super) fn approve(evaluator: &str, application: &ApplicationId, score: f64) -> Evaluation {
    vote(
        evaluator,
        application,
        Some(Recommendation::Approve),
        Some(score),
    )
}

pub(super) fn reject(evaluator: &str, application: &ApplicationId, score: f64) -> Evaluation {
    vote(evaluator, application, Some(Recommendation::Reject), Some(score))
}

pub(super) fn pending(evaluator: &str, application: &ApplicationId, score: f64) -> Evaluation {
    vote(
        evaluator,
        application,
        Some(Recommendation::Pending),
        Some(score),
    )
}

pub(super) type TestService = CommitteeDecisionService<MemoryRepository, MemoryOutbox>;

pub(super) fn build_service() -> (TestService, Arc<MemoryRepository>, Arc<MemoryOutbox>) {
    let repository = Arc::new(MemoryRepository::default());
    let outbox = Arc::new(MemoryOutbox::default());
    let service =
        CommitteeDecisionService::new(repository.clone(), outbox.clone(), voting_config());
    (service, repository, outbox)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) applications: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
    pub(super) evaluations: Arc<Mutex<Vec<Evaluation>>>,
    pub(super) decisions: Arc<Mutex<HashMap<ApplicationId, VotingDecisionRecord>>>,
    pub(super) startups: Arc<Mutex<HashMap<StartupId, StartupStatus>>>,
    pub(super) fail_status_updates: Arc<AtomicBool>,
}

impl MemoryRepository {
    pub(super) fn seed_application(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> ApplicationRecord {
        let startup_id = StartupId(format!("startup-{}", id.0));
        let mut record = ApplicationRecord::new(id.clone(), startup_id.clone());
        record.status = status;
        self.applications
            .lock()
            .expect("repository mutex poisoned")
            .insert(id.clone(), record.clone());
        self.startups
            .lock()
            .expect("repository mutex poisoned")
            .insert(startup_id, StartupStatus::Pending);
        record
    }

    pub(super) fn seed_votes(&self, votes: Vec<Evaluation>) {
        self.evaluations
            .lock()
            .expect("repository mutex poisoned")
            .extend(votes);
    }

    pub(super) fn application(&self, id: &ApplicationId) -> ApplicationRecord {
        self.applications
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned()
            .expect("application seeded")
    }

    pub(super) fn startup_status(&self, id: &ApplicationId) -> StartupStatus {
        let startup_id = self.application(id).startup_id;
        *self
            .startups
            .lock()
            .expect("repository mutex poisoned")
            .get(&startup_id)
            .expect("startup seeded")
    }

    pub(super) fn decision_rows(&self) -> Vec<VotingDecisionRecord> {
        self.decisions
            .lock()
            .expect("repository mutex poisoned")
            .values()
            .cloned()
            .collect()
    }
}

impl CommitteeRepository for MemoryRepository {
    fn get_evaluations(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<Evaluation>, RepositoryError> {
        let guard = self.evaluations.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .filter(|evaluation| &evaluation.application_id == application_id)
            .cloned()
            .collect())
    }

    fn save_evaluation(&self, evaluation: Evaluation) -> Result<(), RepositoryError> {
        let mut guard = self.evaluations.lock().expect("repository mutex poisoned");
        guard.retain(|row| {
            !(row.application_id == evaluation.application_id
                && row.evaluator_id == evaluation.evaluator_id)
        });
        guard.push(evaluation);
        Ok(())
    }

    fn get_decision(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Option<VotingDecisionRecord>, RepositoryError> {
        let guard = self.decisions.lock().expect("repository mutex poisoned");
        Ok(guard.get(application_id).cloned())
    }

    fn upsert_decision(
        &self,
        record: VotingDecisionRecord,
    ) -> Result<VotingDecisionRecord, RepositoryError> {
        let mut guard = self.decisions.lock().expect("repository mutex poisoned");
        guard.insert(record.application_id.clone(), record.clone());
        Ok(record)
    }

    fn create_application(
        &self,
        record: ApplicationRecord,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.applications.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.application_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.application_id.clone(), record.clone());
        self.startups
            .lock()
            .expect("repository mutex poisoned")
            .entry(record.startup_id.clone())
            .or_insert(StartupStatus::Pending);
        Ok(record)
    }

    fn get_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.applications.lock().expect("repository mutex poisoned");
        Ok(guard.get(application_id).cloned())
    }

    fn list_applications(
        &self,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.applications.lock().expect("repository mutex poisoned");
        let mut records: Vec<_> = guard
            .values()
            .filter(|record| statuses.contains(&record.status))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.application_id.cmp(&b.application_id));
        Ok(records)
    }

    fn update_application_status(
        &self,
        application_id: &ApplicationId,
        update: ApplicationStatusUpdate,
    ) -> Result<(), RepositoryError> {
        if self.fail_status_updates.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("applications table locked".to_string()));
        }
        let mut guard = self.applications.lock().expect("repository mutex poisoned");
        let record = guard
            .get_mut(application_id)
            .ok_or(RepositoryError::NotFound)?;
        record.status = update.status;
        record.reviewed_by = update.reviewed_by;
        record.reviewed_at = update.reviewed_at;
        Ok(())
    }

    fn update_startup_status(
        &self,
        startup_id: &StartupId,
        status: StartupStatus,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.startups.lock().expect("repository mutex poisoned");
        guard.insert(startup_id.clone(), status);
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl CommitteeRepository for UnavailableRepository {
    fn get_evaluations(&self, _id: &ApplicationId) -> Result<Vec<Evaluation>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn save_evaluation(&self, _evaluation: Evaluation) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn get_decision(
        &self,
        _id: &ApplicationId,
    ) -> Result<Option<VotingDecisionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn upsert_decision(
        &self,
        _record: VotingDecisionRecord,
    ) -> Result<VotingDecisionRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn create_application(
        &self,
        _record: ApplicationRecord,
    ) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn get_application(
        &self,
        _id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_applications(
        &self,
        _statuses: &[ApplicationStatus],
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_application_status(
        &self,
        _id: &ApplicationId,
        _update: ApplicationStatusUpdate,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_startup_status(
        &self,
        _id: &StartupId,
        _status: StartupStatus,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryOutbox {
    entries: Arc<Mutex<Vec<OutboxEntry>>>,
    sequence: Arc<AtomicU64>,
}

impl MemoryOutbox {
    pub(super) fn entries(&self) -> Vec<OutboxEntry> {
        self.entries.lock().expect("outbox mutex poisoned").clone()
    }
}

impl NotificationOutbox for MemoryOutbox {
    fn enqueue(&self, event: NotificationEvent) -> Result<OutboxEntryId, NotificationError> {
        let id = OutboxEntryId(self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
        self.entries
            .lock()
            .expect("outbox mutex poisoned")
            .push(OutboxEntry {
                id,
                event,
                attempts: 0,
                status: OutboxStatus::Pending,
                last_error: None,
                enqueued_at: Utc::now(),
            });
        Ok(id)
    }

    fn pending(&self, limit: usize) -> Result<Vec<OutboxEntry>, NotificationError> {
        let guard = self.entries.lock().expect("outbox mutex poisoned");
        Ok(guard
            .iter()
            .filter(|entry| entry.status == OutboxStatus::Pending)
            .take(limit)
            .cloned()
            .collect())
    }

    fn mark_delivered(&self, id: OutboxEntryId) -> Result<(), NotificationError> {
        let mut guard = self.entries.lock().expect("outbox mutex poisoned");
        let entry = guard
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(NotificationError::UnknownEntry(id))?;
        entry.attempts += 1;
        entry.status = OutboxStatus::Delivered;
        entry.last_error = None;
        Ok(())
    }

    fn mark_failed(
        &self,
        id: OutboxEntryId,
        error: &str,
        dead_letter: bool,
    ) -> Result<(), NotificationError> {
        let mut guard = self.entries.lock().expect("outbox mutex poisoned");
        let entry = guard
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(NotificationError::UnknownEntry(id))?;
        entry.attempts += 1;
        entry.last_error = Some(error.to_string());
        if dead_letter {
            entry.status = OutboxStatus::DeadLettered;
        }
        Ok(())
    }
}

pub(super) struct BrokenOutbox;

impl NotificationOutbox for BrokenOutbox {
    fn enqueue(&self, _event: NotificationEvent) -> Result<OutboxEntryId, NotificationError> {
        Err(NotificationError::Store("outbox table missing".to_string()))
    }

    fn pending(&self, _limit: usize) -> Result<Vec<OutboxEntry>, NotificationError> {
        Err(NotificationError::Store("outbox table missing".to_string()))
    }

    fn mark_delivered(&self, _id: OutboxEntryId) -> Result<(), NotificationError> {
        Err(NotificationError::Store("outbox table missing".to_string()))
    }

    fn mark_failed(
        &self,
        _id: OutboxEntryId,
        _error: &str,
        _dead_letter: bool,
    ) -> Result<(), NotificationError> {
        Err(NotificationError::Store("outbox table missing".to_string()))
    }
}

/// Fails the first `failures` deliveries, then succeeds.
#[derive(Default)]
pub(super) struct FlakyDispatcher {
    pub(super) failures: AtomicU32,
    pub(super) delivered: Mutex<Vec<NotificationEvent>>,
}

impl FlakyDispatcher {
    pub(super) fn failing(failures: u32) -> Self {
        Self {
            failures: AtomicU32::new(failures),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn delivered(&self) -> Vec<NotificationEvent> {
        self.delivered.lock().expect("dispatcher mutex poisoned").clone()
    }
}

impl NotificationDispatcher for FlakyDispatcher {
    fn dispatch(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(NotificationError::Transport("smtp timeout".to_string()));
        }
        self.delivered
            .lock()
            .expect("dispatcher mutex poisoned")
            .push(event.clone());
        Ok(())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
