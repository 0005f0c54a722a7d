use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::domain::{AssessmentId, AssessmentSubmission, MatchId, ProviderId, SeekerId};
use super::emergency::{inspect_emergency, EmergencySignal};
use super::progression::Progression;
use super::repository::{
    IntakeRepository, MatchView, ProviderDirectory, RepositoryError, SeekerNotifier,
};
use super::selector::MatchCandidate;
use super::service::{AssessmentIntakeService, IntakeServiceError, SubmissionOutcome};
use super::validation::IntakeValidationError;

/// Router builder exposing the engine's call contracts over HTTP.
pub fn intake_router<R, D, N>(service: Arc<AssessmentIntakeService<R, D, N>>) -> Router
where
    R: IntakeRepository + 'static,
    D: ProviderDirectory + 'static,
    N: SeekerNotifier + 'static,
{
    Router::new()
        .route("/api/v1/assessments", post(submit_handler::<R, D, N>))
        .route(
            "/api/v1/assessments/:assessment_id/candidates",
            get(candidates_handler::<R, D, N>),
        )
        .route(
            "/api/v1/assessments/:assessment_id/matches",
            get(matches_handler::<R, D, N>),
        )
        .route(
            "/api/v1/seekers/:seeker_id/status",
            get(status_handler::<R, D, N>),
        )
        .route(
            "/api/v1/matches/:match_id/response",
            post(provider_response_handler::<R, D, N>),
        )
        .route(
            "/api/v1/matches/:match_id/feedback",
            post(feedback_handler::<R, D, N>),
        )
        .route("/api/v1/emergency/detect", post(detect_handler))
        .with_state(service)
}

/// Public summary of a submission.
#[derive(Debug, Serialize)]
pub struct SubmissionView {
    pub assessment_id: AssessmentId,
    pub seeker_id: SeekerId,
    pub sequence_number: u32,
    pub is_emergency: bool,
    pub state: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    pub matches: Vec<MatchView>,
}

impl From<&SubmissionOutcome> for SubmissionView {
    fn from(outcome: &SubmissionOutcome) -> Self {
        let (state, remaining, matches) = match &outcome.progression {
            Progression::Collecting { remaining } => ("collecting", Some(*remaining), Vec::new()),
            Progression::Matched { matches } => (
                "matched",
                None,
                matches.iter().map(|record| record.view()).collect(),
            ),
            Progression::NoSuitableProviders => ("no_suitable_providers", None, Vec::new()),
        };

        Self {
            assessment_id: outcome.assessment.id.clone(),
            seeker_id: outcome.assessment.seeker_id.clone(),
            sequence_number: outcome.assessment.sequence_number,
            is_emergency: outcome.assessment.is_emergency(),
            state,
            message: outcome.progression.summary(),
            remaining,
            matches,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CandidateView {
    pub provider_id: ProviderId,
    pub provider_name: String,
    pub score: f64,
    pub explanation: Vec<String>,
}

impl From<&MatchCandidate> for CandidateView {
    fn from(candidate: &MatchCandidate) -> Self {
        Self {
            provider_id: candidate.provider.id.clone(),
            provider_name: candidate.provider.name.clone(),
            score: candidate.score,
            explanation: candidate.breakdown.explain(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidateQuery {
    #[serde(default)]
    max: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetectRequest {
    #[serde(default)]
    responses: Value,
    #[serde(default)]
    message_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DetectResponse {
    is_emergency: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    signal: Option<EmergencySignal>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderResponseRequest {
    accepted: bool,
    #[serde(default)]
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeedbackRequest {
    #[serde(default)]
    feedback: Option<String>,
}

pub(crate) async fn submit_handler<R, D, N>(
    State(service): State<Arc<AssessmentIntakeService<R, D, N>>>,
    Json(submission): Json<AssessmentSubmission>,
) -> Response
where
    R: IntakeRepository + 'static,
    D: ProviderDirectory + 'static,
    N: SeekerNotifier + 'static,
{
    match service.submit_assessment(submission) {
        Ok(outcome) => {
            let view = SubmissionView::from(&outcome);
            (StatusCode::CREATED, Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<R, D, N>(
    State(service): State<Arc<AssessmentIntakeService<R, D, N>>>,
    Path(seeker_id): Path<String>,
) -> Response
where
    R: IntakeRepository + 'static,
    D: ProviderDirectory + 'static,
    N: SeekerNotifier + 'static,
{
    match service.get_assessment_status(&SeekerId(seeker_id)) {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn candidates_handler<R, D, N>(
    State(service): State<Arc<AssessmentIntakeService<R, D, N>>>,
    Path(assessment_id): Path<String>,
    Query(query): Query<CandidateQuery>,
) -> Response
where
    R: IntakeRepository + 'static,
    D: ProviderDirectory + 'static,
    N: SeekerNotifier + 'static,
{
    match service.preview_matches(&AssessmentId(assessment_id), query.max) {
        Ok(candidates) => {
            let views: Vec<CandidateView> = candidates.iter().map(CandidateView::from).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn matches_handler<R, D, N>(
    State(service): State<Arc<AssessmentIntakeService<R, D, N>>>,
    Path(assessment_id): Path<String>,
) -> Response
where
    R: IntakeRepository + 'static,
    D: ProviderDirectory + 'static,
    N: SeekerNotifier + 'static,
{
    match service.matches_for(&AssessmentId(assessment_id)) {
        Ok(records) => {
            let views: Vec<MatchView> = records.iter().map(|record| record.view()).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn provider_response_handler<R, D, N>(
    State(service): State<Arc<AssessmentIntakeService<R, D, N>>>,
    Path(match_id): Path<String>,
    Json(request): Json<ProviderResponseRequest>,
) -> Response
where
    R: IntakeRepository + 'static,
    D: ProviderDirectory + 'static,
    N: SeekerNotifier + 'static,
{
    match service.record_provider_response(&MatchId(match_id), request.accepted, request.response)
    {
        Ok(record) => (StatusCode::OK, Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn feedback_handler<R, D, N>(
    State(service): State<Arc<AssessmentIntakeService<R, D, N>>>,
    Path(match_id): Path<String>,
    Json(request): Json<FeedbackRequest>,
) -> Response
where
    R: IntakeRepository + 'static,
    D: ProviderDirectory + 'static,
    N: SeekerNotifier + 'static,
{
    match service.record_feedback(&MatchId(match_id), request.feedback) {
        Ok(record) => (StatusCode::OK, Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn detect_handler(Json(request): Json<DetectRequest>) -> Response {
    let responses = match request.responses {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        _ => {
            let payload = json!({ "error": "responses must be a JSON object" });
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
        }
    };

    let signal = inspect_emergency(&responses, request.message_text.as_deref());
    let body = DetectResponse {
        is_emergency: signal.is_some(),
        signal,
    };
    (StatusCode::OK, Json(body)).into_response()
}

fn error_response(err: IntakeServiceError) -> Response {
    let status = match &err {
        IntakeServiceError::Validation(IntakeValidationError::MissingSeekerId)
        | IntakeServiceError::Validation(IntakeValidationError::ResponsesNotAnObject { .. }) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        IntakeServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        IntakeServiceError::Repository(RepositoryError::Conflict)
        | IntakeServiceError::Lifecycle(_) => StatusCode::CONFLICT,
        IntakeServiceError::Repository(RepositoryError::Unavailable(_))
        | IntakeServiceError::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
