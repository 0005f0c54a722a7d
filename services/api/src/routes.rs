use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use care_match::error::AppError;
use care_match::workflows::directory::ProviderCsvImporter;
use care_match::workflows::intake::{
    intake_router, AssessmentIntakeService, IntakeRepository, NeedCategory, Provider,
    ProviderDirectory, ProviderId, SeekerNotifier,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Result of checking a provider export before it is loaded into the directory.
#[derive(Debug, Serialize)]
pub(crate) struct DirectoryValidationResponse {
    pub(crate) total: usize,
    pub(crate) matchable: usize,
    pub(crate) emergency_capable: usize,
    pub(crate) providers: Vec<ProviderSummary>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProviderSummary {
    pub(crate) id: ProviderId,
    pub(crate) name: String,
    pub(crate) services: Vec<NeedCategory>,
    pub(crate) matchable: bool,
    pub(crate) emergency_services: bool,
}

impl DirectoryValidationResponse {
    pub(crate) fn from_providers(providers: &[Provider]) -> Self {
        let summaries: Vec<ProviderSummary> = providers
            .iter()
            .map(|provider| ProviderSummary {
                id: provider.id.clone(),
                name: provider.name.clone(),
                services: provider.service_types.iter().copied().collect(),
                matchable: provider.is_matchable(),
                emergency_services: provider.emergency_services,
            })
            .collect();

        Self {
            total: summaries.len(),
            matchable: summaries.iter().filter(|summary| summary.matchable).count(),
            emergency_capable: summaries
                .iter()
                .filter(|summary| summary.matchable && summary.emergency_services)
                .count(),
            providers: summaries,
        }
    }
}

pub(crate) fn with_intake_routes<R, D, N>(
    service: Arc<AssessmentIntakeService<R, D, N>>,
) -> axum::Router
where
    R: IntakeRepository + 'static,
    D: ProviderDirectory + 'static,
    N: SeekerNotifier + 'static,
{
    intake_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/providers/validate",
            axum::routing::post(validate_directory_endpoint),
        )
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

/// Accepts a raw CSV export as the request body.
pub(crate) async fn validate_directory_endpoint(
    body: String,
) -> Result<Json<DirectoryValidationResponse>, AppError> {
    let providers = ProviderCsvImporter::from_reader(body.as_bytes())?;
    Ok(Json(DirectoryValidationResponse::from_providers(&providers)))
}
