use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::{json, Map, Value};

use crate::workflows::directory::ProviderRoster;
use crate::workflows::intake::domain::{
    Assessment, AssessmentId, AssessmentSubmission, Coordinates, LocationData, MatchId,
    NeedCategory, Provider, ProviderId, SeekerId, UrgencyLevel, VerificationStatus,
};
use crate::workflows::intake::repository::{
    DirectoryError, IntakeRepository, MatchRecord, NotifyError, ProviderDirectory,
    RepositoryError, SeekerNotice, SeekerNotifier,
};
use crate::workflows::intake::{detect_emergency, AssessmentIntakeService, MatchingPolicy};

pub(super) fn responses(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object fixture")
}

pub(super) fn emergency_answers() -> Value {
    json!({ "feels_safe_tonight": false })
}

pub(super) fn submission(seeker: &str) -> AssessmentSubmission {
    AssessmentSubmission {
        seeker_id: SeekerId(seeker.to_string()),
        need_types: BTreeSet::from([NeedCategory::Shelter]),
        urgency_level: UrgencyLevel::Medium,
        language_preference: "en".to_string(),
        location_data: None,
        vulnerability_tags: BTreeSet::new(),
        literacy_mode: None,
        assessment_responses: json!({ "housing_situation": "staying with friends" }),
    }
}

pub(super) fn emergency_submission(seeker: &str) -> AssessmentSubmission {
    let mut submission = submission(seeker);
    submission.assessment_responses = emergency_answers();
    submission
}

/// Assessment equivalent to a stored first submission.
pub(super) fn assessment(answers: Value) -> Assessment {
    let submission = submission("seeker-1");
    let answers = responses(answers);
    let is_emergency = detect_emergency(&answers, None);
    Assessment::record(
        AssessmentId("asm-test".to_string()),
        1,
        submission,
        answers,
        is_emergency,
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).single().expect("valid"),
    )
}

pub(super) fn calm_assessment() -> Assessment {
    assessment(json!({}))
}

pub(super) fn emergency_assessment() -> Assessment {
    assessment(emergency_answers())
}

pub(super) fn located(mut assessment: Assessment, lat: f64, lng: f64) -> Assessment {
    assessment.location = Some(LocationData {
        address: None,
        coordinates: Some(Coordinates::new(lat, lng)),
        region: None,
    });
    assessment
}

pub(super) fn provider(id: &str) -> Provider {
    Provider {
        id: ProviderId(id.to_string()),
        name: format!("Provider {id}"),
        service_types: BTreeSet::from([NeedCategory::Shelter, NeedCategory::LegalAid]),
        location: None,
        languages_supported: BTreeSet::from(["en".to_string()]),
        vulnerability_specializations: BTreeSet::new(),
        contact: Default::default(),
        emergency_services: false,
        verification_status: VerificationStatus::Verified,
        is_active: true,
    }
}

pub(super) fn emergency_provider(id: &str) -> Provider {
    let mut provider = provider(id);
    provider.emergency_services = true;
    provider
}

pub(super) fn provider_at(id: &str, lat: f64, lng: f64) -> Provider {
    let mut provider = provider(id);
    provider.location = Some(LocationData {
        address: Some("1 Main St".to_string()),
        coordinates: Some(Coordinates::new(lat, lng)),
        region: None,
    });
    provider
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) assessments: Arc<Mutex<Vec<Assessment>>>,
    pub(super) matches: Arc<Mutex<HashMap<MatchId, MatchRecord>>>,
}

impl MemoryRepository {
    pub(super) fn match_count(&self) -> usize {
        self.matches.lock().expect("repository mutex poisoned").len()
    }
}

impl IntakeRepository for MemoryRepository {
    fn insert_assessment(&self, assessment: Assessment) -> Result<Assessment, RepositoryError> {
        let mut guard = self.assessments.lock().expect("repository mutex poisoned");
        if guard.iter().any(|stored| {
            stored.seeker_id == assessment.seeker_id
                && stored.sequence_number == assessment.sequence_number
        }) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(assessment.clone());
        Ok(assessment)
    }

    fn fetch_assessment(&self, id: &AssessmentId) -> Result<Option<Assessment>, RepositoryError> {
        let guard = self.assessments.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|stored| &stored.id == id).cloned())
    }

    fn remove_assessment(&self, id: &AssessmentId) -> Result<(), RepositoryError> {
        let mut guard = self.assessments.lock().expect("repository mutex poisoned");
        guard.retain(|stored| &stored.id != id);
        Ok(())
    }

    fn assessments_for(&self, seeker: &SeekerId) -> Result<Vec<Assessment>, RepositoryError> {
        let guard = self.assessments.lock().expect("repository mutex poisoned");
        let mut found: Vec<Assessment> = guard
            .iter()
            .filter(|stored| &stored.seeker_id == seeker)
            .cloned()
            .collect();
        found.sort_by_key(|stored| stored.sequence_number);
        Ok(found)
    }

    fn insert_matches(
        &self,
        records: Vec<MatchRecord>,
    ) -> Result<Vec<MatchRecord>, RepositoryError> {
        let mut guard = self.matches.lock().expect("repository mutex poisoned");
        if records.iter().any(|record| guard.contains_key(&record.id)) {
            return Err(RepositoryError::Conflict);
        }
        for record in &records {
            guard.insert(record.id.clone(), record.clone());
        }
        Ok(records)
    }

    fn matches_for(&self, assessment: &AssessmentId) -> Result<Vec<MatchRecord>, RepositoryError> {
        let guard = self.matches.lock().expect("repository mutex poisoned");
        let mut found: Vec<MatchRecord> = guard
            .values()
            .filter(|record| &record.assessment_id == assessment)
            .cloned()
            .collect();
        found.sort_by(|left, right| right.score.total_cmp(&left.score));
        Ok(found)
    }

    fn fetch_match(&self, id: &MatchId) -> Result<Option<MatchRecord>, RepositoryError> {
        let guard = self.matches.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update_match(&self, record: MatchRecord) -> Result<(), RepositoryError> {
        let mut guard = self.matches.lock().expect("repository mutex poisoned");
        guard.insert(record.id.clone(), record);
        Ok(())
    }
}

/// Accepts assessments but refuses to store matches.
#[derive(Default)]
pub(super) struct MatchWriteFailure {
    pub(super) inner: MemoryRepository,
}

impl IntakeRepository for MatchWriteFailure {
    fn insert_assessment(&self, assessment: Assessment) -> Result<Assessment, RepositoryError> {
        self.inner.insert_assessment(assessment)
    }

    fn fetch_assessment(&self, id: &AssessmentId) -> Result<Option<Assessment>, RepositoryError> {
        self.inner.fetch_assessment(id)
    }

    fn remove_assessment(&self, id: &AssessmentId) -> Result<(), RepositoryError> {
        self.inner.remove_assessment(id)
    }

    fn assessments_for(&self, seeker: &SeekerId) -> Result<Vec<Assessment>, RepositoryError> {
        self.inner.assessments_for(seeker)
    }

    fn insert_matches(
        &self,
        _records: Vec<MatchRecord>,
    ) -> Result<Vec<MatchRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn matches_for(&self, assessment: &AssessmentId) -> Result<Vec<MatchRecord>, RepositoryError> {
        self.inner.matches_for(assessment)
    }

    fn fetch_match(&self, id: &MatchId) -> Result<Option<MatchRecord>, RepositoryError> {
        self.inner.fetch_match(id)
    }

    fn update_match(&self, record: MatchRecord) -> Result<(), RepositoryError> {
        self.inner.update_match(record)
    }
}

pub(super) struct UnavailableDirectory;

impl ProviderDirectory for UnavailableDirectory {
    fn list_active_verified(&self) -> Result<Vec<Provider>, DirectoryError> {
        Err(DirectoryError::Unavailable("directory timeout".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    notices: Arc<Mutex<Vec<SeekerNotice>>>,
}

impl MemoryNotifier {
    pub(super) fn notices(&self) -> Vec<SeekerNotice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }
}

impl SeekerNotifier for MemoryNotifier {
    fn notify(&self, notice: SeekerNotice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct OfflineNotifier;

impl SeekerNotifier for OfflineNotifier {
    fn notify(&self, _notice: SeekerNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("sms gateway down".to_string()))
    }
}

pub(super) type TestService =
    AssessmentIntakeService<MemoryRepository, ProviderRoster, MemoryNotifier>;

pub(super) fn build_service(
    providers: Vec<Provider>,
) -> (TestService, Arc<MemoryRepository>, Arc<MemoryNotifier>) {
    let repository = Arc::new(MemoryRepository::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = AssessmentIntakeService::new(
        repository.clone(),
        Arc::new(ProviderRoster::new(providers)),
        notifier.clone(),
        MatchingPolicy::default(),
    );
    (service, repository, notifier)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
