use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tracing::{error, info, warn};

use super::domain::{
    Assessment, AssessmentId, AssessmentSubmission, MatchId, MatchStatus, MatchType, SeekerId,
};
use super::emergency::inspect_emergency;
use super::progression::{seeker_status, MatchingPolicy, Progression, SeekerStatus};
use super::repository::{
    DirectoryError, IntakeRepository, MatchLifecycleError, MatchRecord, NoticeKind,
    ProviderDirectory, RepositoryError, SeekerNotice, SeekerNotifier,
};
use super::scoring::ScoringEngine;
use super::selector::{MatchCandidate, MatchSelector};
use super::validation::{validate_submission, IntakeValidationError, ValidatedSubmission};

/// Service composing emergency detection, progression, selection, and persistence.
pub struct AssessmentIntakeService<R, D, N> {
    repository: Arc<R>,
    directory: Arc<D>,
    notifier: Arc<N>,
    selector: MatchSelector,
    policy: MatchingPolicy,
    seeker_locks: Mutex<HashMap<SeekerId, Arc<Mutex<()>>>>,
}

/// Recorded assessment plus what the progression controller did with it.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SubmissionOutcome {
    pub assessment: Assessment,
    pub progression: Progression,
}

static ASSESSMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static MATCH_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_assessment_id() -> AssessmentId {
    let id = ASSESSMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AssessmentId(format!("asm-{id:06}"))
}

fn next_match_id() -> MatchId {
    let id = MATCH_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    MatchId(format!("match-{id:06}"))
}

impl<R, D, N> AssessmentIntakeService<R, D, N>
where
    R: IntakeRepository + 'static,
    D: ProviderDirectory + 'static,
    N: SeekerNotifier + 'static,
{
    pub fn new(
        repository: Arc<R>,
        directory: Arc<D>,
        notifier: Arc<N>,
        policy: MatchingPolicy,
    ) -> Self {
        let selector = MatchSelector::new(ScoringEngine::default(), policy.minimum_score);

        Self {
            repository,
            directory,
            notifier,
            selector,
            policy,
            seeker_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &MatchingPolicy {
        &self.policy
    }

    /// Record an assessment and, when the seeker is ready or in danger, match it.
    ///
    /// Submissions from the same seeker are serialized so sequence numbers never repeat
    /// and a threshold crossing triggers matching exactly once. A submission that fails
    /// while matching leaves nothing stored.
    pub fn submit_assessment(
        &self,
        submission: AssessmentSubmission,
    ) -> Result<SubmissionOutcome, IntakeServiceError> {
        let validated = validate_submission(submission)?;
        let seeker_id = validated.submission.seeker_id.clone();

        let lock = self.seeker_lock(&seeker_id);
        let outcome = {
            let _serialized = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.record_and_match(validated)
        };
        self.release_seeker_lock(&seeker_id, lock);

        outcome
    }

    fn record_and_match(
        &self,
        validated: ValidatedSubmission,
    ) -> Result<SubmissionOutcome, IntakeServiceError> {
        let seeker_id = validated.submission.seeker_id.clone();
        let sequence_number = self
            .repository
            .assessments_for(&seeker_id)?
            .iter()
            .map(|assessment| assessment.sequence_number)
            .max()
            .unwrap_or(0)
            + 1;

        let signal = inspect_emergency(&validated.responses, None);
        if let Some(signal) = &signal {
            warn!(
                seeker_id = %seeker_id.0,
                sequence_number,
                signal = signal.label(),
                "emergency signal detected in assessment"
            );
        }

        let assessment = Assessment::record(
            next_assessment_id(),
            sequence_number,
            validated.submission,
            validated.responses,
            signal.is_some(),
            Utc::now(),
        );

        if !self.policy.should_trigger(&assessment) {
            let assessment = self.repository.insert_assessment(assessment)?;
            let remaining = self.policy.remaining_after(sequence_number);
            info!(
                seeker_id = %seeker_id.0,
                sequence_number,
                remaining,
                "matching deferred until more assessments are completed"
            );
            return Ok(SubmissionOutcome {
                assessment,
                progression: Progression::Collecting { remaining },
            });
        }

        info!(
            seeker_id = %seeker_id.0,
            sequence_number,
            emergency = assessment.is_emergency(),
            "matching triggered"
        );

        // Selection runs before anything is stored so a directory outage commits nothing.
        let providers = self.directory.list_active_verified()?;
        let candidates = self
            .selector
            .find_matches(&assessment, &providers, self.policy.max_matches);
        let assessment = self.repository.insert_assessment(assessment)?;

        if candidates.is_empty() {
            warn!(
                seeker_id = %seeker_id.0,
                assessment_id = %assessment.id.0,
                emergency = assessment.is_emergency(),
                "no suitable providers found"
            );
            self.publish(SeekerNotice {
                seeker_id,
                assessment_id: assessment.id.clone(),
                kind: NoticeKind::NoSuitableProviders {
                    emergency: assessment.is_emergency(),
                },
                message: Progression::NoSuitableProviders.summary(),
            });
            return Ok(SubmissionOutcome {
                assessment,
                progression: Progression::NoSuitableProviders,
            });
        }

        let records = match_records(&assessment, candidates);
        let matches = match self.repository.insert_matches(records) {
            Ok(matches) => matches,
            Err(err) => {
                self.discard_assessment(&assessment);
                return Err(err.into());
            }
        };
        info!(
            seeker_id = %seeker_id.0,
            assessment_id = %assessment.id.0,
            matches = matches.len(),
            "persisted provider matches"
        );

        self.publish(SeekerNotice {
            seeker_id,
            assessment_id: assessment.id.clone(),
            kind: NoticeKind::MatchesFound {
                match_ids: matches.iter().map(|record| record.id.clone()).collect(),
                emergency: assessment.is_emergency(),
            },
            message: format!("{} provider match(es) found", matches.len()),
        });

        Ok(SubmissionOutcome {
            assessment,
            progression: Progression::Matched { matches },
        })
    }

    fn discard_assessment(&self, assessment: &Assessment) {
        if let Err(err) = self.repository.remove_assessment(&assessment.id) {
            error!(
                assessment_id = %assessment.id.0,
                error = %err,
                "failed to roll back assessment after match persistence failed"
            );
        }
    }

    /// Emergency, ready, or pending, derived from the seeker's stored assessments.
    pub fn get_assessment_status(
        &self,
        seeker_id: &SeekerId,
    ) -> Result<SeekerStatus, IntakeServiceError> {
        let assessments = self.repository.assessments_for(seeker_id)?;
        Ok(seeker_status(seeker_id, &assessments, &self.policy))
    }

    /// Rank current providers for a stored assessment without persisting anything.
    pub fn preview_matches(
        &self,
        assessment_id: &AssessmentId,
        max_matches: Option<usize>,
    ) -> Result<Vec<MatchCandidate>, IntakeServiceError> {
        let assessment = self
            .repository
            .fetch_assessment(assessment_id)?
            .ok_or(RepositoryError::NotFound)?;
        let providers = self.directory.list_active_verified()?;
        let max_matches = max_matches.unwrap_or(self.policy.max_matches);

        Ok(self
            .selector
            .find_matches(&assessment, &providers, max_matches))
    }

    pub fn matches_for(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<Vec<MatchRecord>, IntakeServiceError> {
        Ok(self.repository.matches_for(assessment_id)?)
    }

    /// Apply a provider's accept/decline reply to a pending match.
    pub fn record_provider_response(
        &self,
        match_id: &MatchId,
        accepted: bool,
        response: Option<String>,
    ) -> Result<MatchRecord, IntakeServiceError> {
        let mut record = self.fetch_match(match_id)?;
        record.respond(accepted, response, Utc::now())?;
        self.repository.update_match(record.clone())?;
        info!(match_id = %match_id.0, status = record.status.label(), "provider responded");
        Ok(record)
    }

    /// Close an accepted match with the seeker's feedback.
    pub fn record_feedback(
        &self,
        match_id: &MatchId,
        feedback: Option<String>,
    ) -> Result<MatchRecord, IntakeServiceError> {
        let mut record = self.fetch_match(match_id)?;
        record.complete(feedback, Utc::now())?;
        self.repository.update_match(record.clone())?;
        info!(match_id = %match_id.0, "match completed");
        Ok(record)
    }

    fn fetch_match(&self, match_id: &MatchId) -> Result<MatchRecord, IntakeServiceError> {
        let record = self
            .repository
            .fetch_match(match_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    fn seeker_lock(&self, seeker_id: &SeekerId) -> Arc<Mutex<()>> {
        let mut locks = self
            .seeker_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.entry(seeker_id.clone()).or_default().clone()
    }

    /// Drop the seeker's lock entry unless another submission already holds a clone.
    fn release_seeker_lock(&self, seeker_id: &SeekerId, lock: Arc<Mutex<()>>) {
        let mut locks = self
            .seeker_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Clones are only taken under the map lock, so the count here is stable.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(seeker_id);
        }
    }

    /// Seekers with a submission in flight.
    pub(crate) fn tracked_seekers(&self) -> usize {
        self.seeker_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn publish(&self, notice: SeekerNotice) {
        let seeker_id = notice.seeker_id.0.clone();
        if let Err(err) = self.notifier.notify(notice) {
            warn!(seeker_id = %seeker_id, error = %err, "failed to deliver seeker notice");
        }
    }
}

fn match_records(assessment: &Assessment, candidates: Vec<MatchCandidate>) -> Vec<MatchRecord> {
    let match_type = if assessment.is_emergency() {
        MatchType::Emergency
    } else {
        MatchType::Standard
    };
    let matched_at = Utc::now();

    candidates
        .into_iter()
        .map(|candidate| MatchRecord {
            id: next_match_id(),
            seeker_id: assessment.seeker_id.clone(),
            provider_id: candidate.provider.id,
            assessment_id: assessment.id.clone(),
            score: candidate.score,
            criteria: candidate.breakdown,
            match_type,
            status: MatchStatus::Pending,
            provider_response: None,
            feedback: None,
            matched_at,
            responded_at: None,
            completed_at: None,
        })
        .collect()
}

/// Error raised by the intake service.
#[derive(Debug, thiserror::Error)]
pub enum IntakeServiceError {
    #[error(transparent)]
    Validation(#[from] IntakeValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Lifecycle(#[from] MatchLifecycleError),
}
