use care_match::error::AppError;
use care_match::workflows::directory::{ProviderCsvImporter, ProviderRoster};
use care_match::workflows::intake::{
    Assessment, AssessmentId, ContactDetails, Coordinates, IntakeRepository, LocationData,
    MatchId, MatchRecord, NeedCategory, NotifyError, Provider, ProviderId, RepositoryError,
    SeekerId, SeekerNotice, SeekerNotifier, VerificationStatus,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryIntakeRepository {
    assessments: Arc<Mutex<Vec<Assessment>>>,
    matches: Arc<Mutex<HashMap<MatchId, MatchRecord>>>,
}

impl IntakeRepository for InMemoryIntakeRepository {
    fn insert_assessment(&self, assessment: Assessment) -> Result<Assessment, RepositoryError> {
        let mut guard = self.assessments.lock().unwrap_or_else(PoisonError::into_inner);
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
        let guard = self.assessments.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.iter().find(|stored| &stored.id == id).cloned())
    }

    fn remove_assessment(&self, id: &AssessmentId) -> Result<(), RepositoryError> {
        let mut guard = self.assessments.lock().unwrap_or_else(PoisonError::into_inner);
        guard.retain(|stored| &stored.id != id);
        Ok(())
    }

    fn assessments_for(&self, seeker: &SeekerId) -> Result<Vec<Assessment>, RepositoryError> {
        let guard = self.assessments.lock().unwrap_or_else(PoisonError::into_inner);
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
        let mut guard = self.matches.lock().unwrap_or_else(PoisonError::into_inner);
        if records.iter().any(|record| guard.contains_key(&record.id)) {
            return Err(RepositoryError::Conflict);
        }
        for record in &records {
            guard.insert(record.id.clone(), record.clone());
        }
        Ok(records)
    }

    fn matches_for(&self, assessment: &AssessmentId) -> Result<Vec<MatchRecord>, RepositoryError> {
        let guard = self.matches.lock().unwrap_or_else(PoisonError::into_inner);
        let mut found: Vec<MatchRecord> = guard
            .values()
            .filter(|record| &record.assessment_id == assessment)
            .cloned()
            .collect();
        found.sort_by(|left, right| {
            right
                .score
                .total_cmp(&left.score)
                .then_with(|| left.provider_id.cmp(&right.provider_id))
        });
        Ok(found)
    }

    fn fetch_match(&self, id: &MatchId) -> Result<Option<MatchRecord>, RepositoryError> {
        let guard = self.matches.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(id).cloned())
    }

    fn update_match(&self, record: MatchRecord) -> Result<(), RepositoryError> {
        let mut guard = self.matches.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }
}

/// Keeps notices in memory and logs them; stands in for the SMS/email gateway.
#[derive(Default, Clone)]
pub(crate) struct InMemorySeekerNotifier {
    notices: Arc<Mutex<Vec<SeekerNotice>>>,
}

impl SeekerNotifier for InMemorySeekerNotifier {
    fn notify(&self, notice: SeekerNotice) -> Result<(), NotifyError> {
        info!(
            seeker_id = %notice.seeker_id.0,
            assessment_id = %notice.assessment_id.0,
            message = %notice.message,
            "seeker notice queued"
        );
        let mut guard = self.notices.lock().unwrap_or_else(PoisonError::into_inner);
        guard.push(notice);
        Ok(())
    }
}

impl InMemorySeekerNotifier {
    pub(crate) fn notices(&self) -> Vec<SeekerNotice> {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

pub(crate) fn load_roster(path: Option<&Path>) -> Result<ProviderRoster, AppError> {
    let providers = match path {
        Some(path) => ProviderCsvImporter::from_path(path)?,
        None => sample_providers(),
    };
    Ok(ProviderRoster::new(providers))
}

/// Small Nairobi roster used when no directory export is supplied.
pub(crate) fn sample_providers() -> Vec<Provider> {
    vec![
        sample_provider(
            "prv-tumaini",
            "Tumaini Women's Shelter",
            &[NeedCategory::Shelter, NeedCategory::MentalHealth],
            (-1.2833, 36.8167),
            &["en", "sw"],
            &["women", "domestic_violence"],
            true,
        ),
        sample_provider(
            "prv-haki",
            "Haki Legal Aid Centre",
            &[NeedCategory::LegalAid],
            (-1.2921, 36.8219),
            &["en", "sw", "fr"],
            &["refugee"],
            false,
        ),
        sample_provider(
            "prv-jamii",
            "Jamii Housing Cooperative",
            &[NeedCategory::Shelter, NeedCategory::Employment],
            (-1.3200, 36.8900),
            &["en"],
            &[],
            false,
        ),
        sample_provider(
            "prv-afya",
            "Afya Community Clinic",
            &[NeedCategory::Health, NeedCategory::MentalHealth, NeedCategory::Food],
            (-1.2500, 36.8600),
            &["sw", "so"],
            &["children"],
            true,
        ),
    ]
}

fn sample_provider(
    id: &str,
    name: &str,
    services: &[NeedCategory],
    (lat, lng): (f64, f64),
    languages: &[&str],
    specializations: &[&str],
    emergency_services: bool,
) -> Provider {
    Provider {
        id: ProviderId(id.to_string()),
        name: name.to_string(),
        service_types: services.iter().copied().collect(),
        location: Some(LocationData {
            address: None,
            coordinates: Some(Coordinates::new(lat, lng)),
            region: Some("Nairobi".to_string()),
        }),
        languages_supported: languages.iter().map(|code| code.to_string()).collect(),
        vulnerability_specializations: specializations
            .iter()
            .map(|tag| tag.to_string())
            .collect::<BTreeSet<_>>(),
        contact: ContactDetails::default(),
        emergency_services,
        verification_status: VerificationStatus::Verified,
        is_active: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use care_match::workflows::intake::{AssessmentSubmission, NoticeKind, UrgencyLevel};
    use chrono::Utc;

    fn poison<T: Send + 'static>(mutex: Arc<Mutex<T>>) {
        let _ = std::thread::spawn(move || {
            let _guard = mutex.lock().unwrap();
            panic!("writer crashed while holding the lock");
        })
        .join();
    }

    fn stored_assessment(seeker: &str) -> Assessment {
        let submission = AssessmentSubmission {
            seeker_id: SeekerId(seeker.to_string()),
            need_types: BTreeSet::from([NeedCategory::Shelter]),
            urgency_level: UrgencyLevel::Low,
            language_preference: "en".to_string(),
            location_data: None,
            vulnerability_tags: BTreeSet::new(),
            literacy_mode: None,
            assessment_responses: serde_json::Value::Null,
        };
        Assessment::record(
            AssessmentId(format!("asm-{seeker}")),
            1,
            submission,
            serde_json::Map::new(),
            false,
            Utc::now(),
        )
    }

    #[test]
    fn repository_recovers_from_poisoned_lock() {
        let repository = InMemoryIntakeRepository::default();
        poison(repository.assessments.clone());
        assert!(repository.assessments.is_poisoned());

        let stored = repository
            .insert_assessment(stored_assessment("amani"))
            .expect("insert after poisoning");
        let found = repository
            .assessments_for(&SeekerId("amani".to_string()))
            .expect("read after poisoning");
        assert_eq!(found.len(), 1);

        repository
            .remove_assessment(&stored.id)
            .expect("remove after poisoning");
        assert!(repository
            .fetch_assessment(&stored.id)
            .expect("lookup")
            .is_none());
    }

    #[test]
    fn notifier_recovers_from_poisoned_lock() {
        let notifier = InMemorySeekerNotifier::default();
        poison(notifier.notices.clone());

        notifier
            .notify(SeekerNotice {
                seeker_id: SeekerId("amani".to_string()),
                assessment_id: AssessmentId("asm-amani".to_string()),
                kind: NoticeKind::NoSuitableProviders { emergency: false },
                message: "no suitable providers found".to_string(),
            })
            .expect("notify after poisoning");

        assert_eq!(notifier.notices().len(), 1);
    }
}
