use chrono::Utc;
use label_committee::workflows::committee::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationStatusUpdate,
    CommitteeRepository, Evaluation, NotificationDispatcher, NotificationError, NotificationEvent,
    NotificationOutbox, OutboxEntry, OutboxEntryId, OutboxStatus, RepositoryError, StartupId,
    StartupStatus, VotingDecisionRecord,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store poisoned".to_string()))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryCommitteeRepository {
    applications: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
    evaluations: Arc<Mutex<Vec<Evaluation>>>,
    decisions: Arc<Mutex<HashMap<ApplicationId, VotingDecisionRecord>>>,
    startups: Arc<Mutex<HashMap<StartupId, StartupStatus>>>,
}

impl InMemoryCommitteeRepository {
    #[cfg(test)]
    pub(crate) fn startup_status(
        &self,
        startup_id: &StartupId,
    ) -> Result<Option<StartupStatus>, RepositoryError> {
        Ok(lock(&self.startups)?.get(startup_id).copied())
    }
}

impl CommitteeRepository for InMemoryCommitteeRepository {
    fn get_evaluations(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<Evaluation>, RepositoryError> {
        Ok(lock(&self.evaluations)?
            .iter()
            .filter(|evaluation| &evaluation.application_id == application_id)
            .cloned()
            .collect())
    }

    fn save_evaluation(&self, evaluation: Evaluation) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.evaluations)?;
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
        Ok(lock(&self.decisions)?.get(application_id).cloned())
    }

    fn upsert_decision(
        &self,
        record: VotingDecisionRecord,
    ) -> Result<VotingDecisionRecord, RepositoryError> {
        lock(&self.decisions)?.insert(record.application_id.clone(), record.clone());
        Ok(record)
    }

    fn create_application(
        &self,
        record: ApplicationRecord,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut applications = lock(&self.applications)?;
        if applications.contains_key(&record.application_id) {
            return Err(RepositoryError::Conflict);
        }
        lock(&self.startups)?
            .entry(record.startup_id.clone())
            .or_insert(StartupStatus::Pending);
        applications.insert(record.application_id.clone(), record.clone());
        Ok(record)
    }

    fn get_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(lock(&self.applications)?.get(application_id).cloned())
    }

    fn list_applications(
        &self,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let mut records: Vec<_> = lock(&self.applications)?
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
        let mut guard = lock(&self.applications)?;
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
        lock(&self.startups)?.insert(startup_id.clone(), status);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationOutbox {
    entries: Arc<Mutex<Vec<OutboxEntry>>>,
}

impl InMemoryNotificationOutbox {
    fn entries(&self) -> Result<MutexGuard<'_, Vec<OutboxEntry>>, NotificationError> {
        self.entries
            .lock()
            .map_err(|_| NotificationError::Store("in-memory outbox poisoned".to_string()))
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> Result<Vec<OutboxEntry>, NotificationError> {
        Ok(self.entries()?.clone())
    }

    fn update(
        &self,
        id: OutboxEntryId,
        apply: impl FnOnce(&mut OutboxEntry),
    ) -> Result<(), NotificationError> {
        let mut guard = self.entries()?;
        let entry = guard
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(NotificationError::UnknownEntry(id))?;
        apply(entry);
        Ok(())
    }
}

impl NotificationOutbox for InMemoryNotificationOutbox {
    fn enqueue(&self, event: NotificationEvent) -> Result<OutboxEntryId, NotificationError> {
        let mut guard = self.entries()?;
        let id = OutboxEntryId(guard.len() as u64 + 1);
        guard.push(OutboxEntry {
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
        Ok(self
            .entries()?
            .iter()
            .filter(|entry| entry.status == OutboxStatus::Pending)
            .take(limit)
            .cloned()
            .collect())
    }

    fn mark_delivered(&self, id: OutboxEntryId) -> Result<(), NotificationError> {
        self.update(id, |entry| {
            entry.attempts += 1;
            entry.status = OutboxStatus::Delivered;
            entry.last_error = None;
        })
    }

    fn mark_failed(
        &self,
        id: OutboxEntryId,
        error: &str,
        dead_letter: bool,
    ) -> Result<(), NotificationError> {
        self.update(id, |entry| {
            entry.attempts += 1;
            entry.last_error = Some(error.to_string());
            if dead_letter {
                entry.status = OutboxStatus::DeadLettered;
            }
        })
    }
}

/// Stands in for the e-mail and in-app channels by logging each event.
#[derive(Default, Clone, Copy)]
pub(crate) struct LoggingNotificationDispatcher;

impl NotificationDispatcher for LoggingNotificationDispatcher {
    fn dispatch(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        info!(
            application = %event.application_id.0,
            decision = event.decision.label(),
            source = event.decision_source.label(),
            "committee decision notification sent"
        );
        Ok(())
    }
}
