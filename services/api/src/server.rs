use crate::cli::ServeArgs;
use crate::infra::{load_roster, AppState, InMemoryIntakeRepository, InMemorySeekerNotifier};
use crate::routes::with_intake_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use care_match::config::AppConfig;
use care_match::error::AppError;
use care_match::telemetry;
use care_match::workflows::intake::AssessmentIntakeService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let roster = load_roster(args.providers.as_deref())?;
    info!(providers = roster.len(), "provider directory loaded");

    let intake_service = Arc::new(AssessmentIntakeService::new(
        Arc::new(InMemoryIntakeRepository::default()),
        Arc::new(roster),
        Arc::new(InMemorySeekerNotifier::default()),
        config.matching.clone(),
    ));

    let app = with_intake_routes(intake_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        threshold = config.matching.assessments_before_matching,
        minimum_score = config.matching.minimum_score,
        "care match service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
