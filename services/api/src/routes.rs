use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use label_committee::error::AppError;
use label_committee::workflows::committee::{
    committee_router, ApplicationId, CommitteeDecisionService, CommitteeRepository,
    NotificationOutbox, VotingConfig, VotingEngine, VotingSnapshot,
};
use label_committee::workflows::import::EvaluationImporter;
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

/// Ad-hoc tally of an evaluation export, without touching stored applications.
#[derive(Debug, Deserialize)]
pub(crate) struct TallyRequest {
    pub(crate) application_id: String,
    pub(crate) evaluations_csv: String,
    #[serde(default)]
    pub(crate) quorum_required: Option<u32>,
    #[serde(default)]
    pub(crate) min_score_for_approval: Option<u32>,
}

pub(crate) fn with_committee_routes<R, O>(
    service: Arc<CommitteeDecisionService<R, O>>,
) -> axum::Router
where
    R: CommitteeRepository + 'static,
    O: NotificationOutbox + 'static,
{
    let voting = service.voting_config().clone();
    committee_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/committee/tally",
            axum::routing::post(tally_endpoint),
        )
        .layer(Extension(voting))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn tally_endpoint(
    Extension(defaults): Extension<VotingConfig>,
    Json(payload): Json<TallyRequest>,
) -> Result<Json<VotingSnapshot>, AppError> {
    let TallyRequest {
        application_id,
        evaluations_csv,
        quorum_required,
        min_score_for_approval,
    } = payload;

    let config = VotingConfig {
        quorum_required: quorum_required.unwrap_or(defaults.quorum_required),
        min_score_for_approval: min_score_for_approval
            .unwrap_or(defaults.min_score_for_approval),
        ..defaults
    };
    config.validate()?;

    let application_id = ApplicationId(application_id);
    let rows = EvaluationImporter::from_reader(Cursor::new(evaluations_csv.into_bytes()))?;
    let evaluations = EvaluationImporter::for_application(rows, &application_id);
    let snapshot = VotingEngine::new(config).snapshot(&application_id, &evaluations, None);

    Ok(Json(snapshot))
}
