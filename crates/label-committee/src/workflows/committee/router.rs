use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    ActorId, ApplicationId, ApplicationStatus, DecisionSource, Evaluation, EvaluatorId,
    Recommendation, StartupId, Verdict,
};
use super::outbox::NotificationOutbox;
use super::repository::{CommitteeRepository, RepositoryError};
use super::service::{CommitteeDecisionService, CommitteeServiceError, DecisionRequest};

/// Header carrying the committee member id resolved by the upstream auth layer.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Router builder exposing the voting, evaluation, and decision endpoints.
pub fn committee_router<R, O>(service: Arc<CommitteeDecisionService<R, O>>) -> Router
where
    R: CommitteeRepository + 'static,
    O: NotificationOutbox + 'static,
{
    Router::new()
        .route("/api/v1/applications", post(register_handler::<R, O>))
        .route(
            "/api/v1/applications/:application_id/voting",
            get(snapshot_handler::<R, O>),
        )
        .route(
            "/api/v1/applications/:application_id/evaluations",
            put(evaluation_handler::<R, O>),
        )
        .route(
            "/api/v1/applications/:application_id/decision",
            post(decision_handler::<R, O>),
        )
        .route(
            "/api/v1/applications/:application_id/override",
            post(override_handler::<R, O>),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            post(status_handler::<R, O>),
        )
        .route("/api/v1/committee/stats", get(stats_handler::<R, O>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegistrationPayload {
    pub(crate) application_id: String,
    pub(crate) startup_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EvaluationPayload {
    pub(crate) evaluator_id: String,
    #[serde(default)]
    pub(crate) recommendation: Option<Recommendation>,
    #[serde(default)]
    pub(crate) total_score: Option<f64>,
    #[serde(default)]
    pub(crate) is_submitted: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionPayload {
    pub(crate) decision: Verdict,
    #[serde(default)]
    pub(crate) source: Option<DecisionSource>,
    #[serde(default)]
    pub(crate) notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverridePayload {
    pub(crate) decision: Verdict,
    #[serde(default)]
    pub(crate) notes: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusPayload {
    pub(crate) status: ApplicationStatus,
}

fn actor_from(headers: &HeaderMap) -> Option<ActorId> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| ActorId(value.trim().to_string()))
}

fn error_response(error: CommitteeServiceError) -> Response {
    let status = match &error {
        CommitteeServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
        CommitteeServiceError::MissingJustification
        | CommitteeServiceError::BlankIdentifier(_)
        | CommitteeServiceError::ScoreOutOfRange(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CommitteeServiceError::EvaluationLocked { .. }
        | CommitteeServiceError::Transition(_)
        | CommitteeServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        CommitteeServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        CommitteeServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn register_handler<R, O>(
    State(service): State<Arc<CommitteeDecisionService<R, O>>>,
    axum::Json(payload): axum::Json<RegistrationPayload>,
) -> Response
where
    R: CommitteeRepository + 'static,
    O: NotificationOutbox + 'static,
{
    match service.register_application(
        ApplicationId(payload.application_id),
        StartupId(payload.startup_id),
    ) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn snapshot_handler<R, O>(
    State(service): State<Arc<CommitteeDecisionService<R, O>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: CommitteeRepository + 'static,
    O: NotificationOutbox + 'static,
{
    match service.voting_snapshot(&ApplicationId(application_id)) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn evaluation_handler<R, O>(
    State(service): State<Arc<CommitteeDecisionService<R, O>>>,
    Path(application_id): Path<String>,
    axum::Json(payload): axum::Json<EvaluationPayload>,
) -> Response
where
    R: CommitteeRepository + 'static,
    O: NotificationOutbox + 'static,
{
    let evaluation = Evaluation {
        evaluator_id: EvaluatorId(payload.evaluator_id),
        application_id: ApplicationId(application_id),
        recommendation: payload.recommendation,
        total_score: payload.total_score,
        is_submitted: payload.is_submitted,
    };

    match service.record_evaluation(evaluation) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn decision_handler<R, O>(
    State(service): State<Arc<CommitteeDecisionService<R, O>>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    axum::Json(payload): axum::Json<DecisionPayload>,
) -> Response
where
    R: CommitteeRepository + 'static,
    O: NotificationOutbox + 'static,
{
    let actor = actor_from(&headers);
    let request = DecisionRequest {
        verdict: payload.decision,
        source: payload.source.unwrap_or(DecisionSource::Manual),
        notes: payload.notes,
    };

    match service.apply_decision(&ApplicationId(application_id), actor.as_ref(), request) {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn override_handler<R, O>(
    State(service): State<Arc<CommitteeDecisionService<R, O>>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    axum::Json(payload): axum::Json<OverridePayload>,
) -> Response
where
    R: CommitteeRepository + 'static,
    O: NotificationOutbox + 'static,
{
    let actor = actor_from(&headers);

    match service.override_decision(
        &ApplicationId(application_id),
        actor.as_ref(),
        payload.decision,
        &payload.notes,
    ) {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, O>(
    State(service): State<Arc<CommitteeDecisionService<R, O>>>,
    Path(application_id): Path<String>,
    axum::Json(payload): axum::Json<StatusPayload>,
) -> Response
where
    R: CommitteeRepository + 'static,
    O: NotificationOutbox + 'static,
{
    match service.transition_application(&ApplicationId(application_id), payload.status) {
        Ok(record) => {
            let body = json!({
                "application_id": record.application_id.0,
                "status": record.status.label(),
            });
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn stats_handler<R, O>(
    State(service): State<Arc<CommitteeDecisionService<R, O>>>,
) -> Response
where
    R: CommitteeRepository + 'static,
    O: NotificationOutbox + 'static,
{
    match service.committee_stats() {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(error) => error_response(error),
    }
}
