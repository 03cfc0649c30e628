use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryCommitteeRepository, InMemoryNotificationOutbox,
    LoggingNotificationDispatcher,
};
use crate::routes::with_committee_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use label_committee::config::{AppConfig, OutboxConfig};
use label_committee::error::AppError;
use label_committee::telemetry;
use label_committee::workflows::committee::{CommitteeDecisionService, OutboxRelay};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{error, info};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;
    config.warn_ignored_settings();

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryCommitteeRepository::default());
    let outbox = Arc::new(InMemoryNotificationOutbox::default());
    let committee_service = Arc::new(CommitteeDecisionService::new(
        repository,
        outbox.clone(),
        config.voting.clone(),
    ));

    spawn_outbox_relay(
        OutboxRelay::new(
            outbox,
            Arc::new(LoggingNotificationDispatcher),
            config.outbox.max_attempts,
            config.outbox.batch_size,
        ),
        &config.outbox,
    );

    let app = with_committee_routes(committee_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        quorum = config.voting.quorum_required,
        "label committee service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

fn spawn_outbox_relay(
    relay: OutboxRelay<InMemoryNotificationOutbox, LoggingNotificationDispatcher>,
    config: &OutboxConfig,
) {
    let mut interval = tokio::time::interval(config.poll_interval);
    tokio::spawn(async move {
        loop {
            interval.tick().await;
            match relay.run_once() {
                Ok(report) if !report.is_idle() => info!(
                    delivered = report.delivered,
                    retried = report.retried,
                    dead_lettered = report.dead_lettered,
                    "outbox relay pass"
                ),
                Ok(_) => {}
                Err(err) => error!(error = %err, "outbox relay pass failed"),
            }
        }
    });
}
