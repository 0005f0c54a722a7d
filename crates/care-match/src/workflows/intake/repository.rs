use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Assessment, AssessmentId, MatchId, MatchStatus, MatchType, Provider, ProviderId, SeekerId,
};
use super::scoring::ScoreBreakdown;

/// Persisted pairing of one assessment with one provider.
///
/// Score and criteria are frozen at creation; only the status and response fields move
/// afterwards, driven by provider replies and seeker feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub seeker_id: SeekerId,
    pub provider_id: ProviderId,
    pub assessment_id: AssessmentId,
    pub score: f64,
    pub criteria: ScoreBreakdown,
    pub match_type: MatchType,
    pub status: MatchStatus,
    pub provider_response: Option<String>,
    pub feedback: Option<String>,
    pub matched_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl MatchRecord {
    /// Record the provider's answer to a pending match.
    pub fn respond(
        &mut self,
        accepted: bool,
        response: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), MatchLifecycleError> {
        let next = if accepted {
            MatchStatus::Accepted
        } else {
            MatchStatus::Declined
        };
        if self.status != MatchStatus::Pending {
            return Err(MatchLifecycleError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        self.provider_response = response;
        self.responded_at = Some(at);
        Ok(())
    }

    /// Close an accepted match once the service was delivered.
    pub fn complete(
        &mut self,
        feedback: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), MatchLifecycleError> {
        if self.status != MatchStatus::Accepted {
            return Err(MatchLifecycleError::InvalidTransition {
                from: self.status,
                to: MatchStatus::Completed,
            });
        }

        self.status = MatchStatus::Completed;
        self.feedback = feedback;
        self.completed_at = Some(at);
        Ok(())
    }

    pub fn view(&self) -> MatchView {
        MatchView {
            match_id: self.id.clone(),
            provider_id: self.provider_id.clone(),
            score: self.score,
            match_type: self.match_type.label(),
            status: self.status.label(),
            explanation: self.criteria.explain(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MatchLifecycleError {
    #[error("match cannot move from {} to {}", .from.label(), .to.label())]
    InvalidTransition { from: MatchStatus, to: MatchStatus },
}

/// Storage for assessments and matches so the engine can be exercised in isolation.
pub trait IntakeRepository: Send + Sync {
    /// Store a new assessment; a second record for the same seeker and sequence number
    /// is a `Conflict`.
    fn insert_assessment(&self, assessment: Assessment) -> Result<Assessment, RepositoryError>;
    fn fetch_assessment(&self, id: &AssessmentId) -> Result<Option<Assessment>, RepositoryError>;
    /// Undo `insert_assessment` when the rest of the submission could not be stored.
    fn remove_assessment(&self, id: &AssessmentId) -> Result<(), RepositoryError>;
    /// All assessments of a seeker in sequence order.
    fn assessments_for(&self, seeker: &SeekerId) -> Result<Vec<Assessment>, RepositoryError>;
    /// Persist every record or none of them.
    fn insert_matches(&self, records: Vec<MatchRecord>)
        -> Result<Vec<MatchRecord>, RepositoryError>;
    fn matches_for(&self, assessment: &AssessmentId) -> Result<Vec<MatchRecord>, RepositoryError>;
    fn fetch_match(&self, id: &MatchId) -> Result<Option<MatchRecord>, RepositoryError>;
    fn update_match(&self, record: MatchRecord) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of the verified provider directory.
pub trait ProviderDirectory: Send + Sync {
    fn list_active_verified(&self) -> Result<Vec<Provider>, DirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("provider directory unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook for the UI or messaging layer that informs the seeker.
pub trait SeekerNotifier: Send + Sync {
    fn notify(&self, notice: SeekerNotice) -> Result<(), NotifyError>;
}

/// Message handed to the notification collaborator after a triggering submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeekerNotice {
    pub seeker_id: SeekerId,
    pub assessment_id: AssessmentId,
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoticeKind {
    MatchesFound {
        match_ids: Vec<MatchId>,
        emergency: bool,
    },
    NoSuitableProviders {
        emergency: bool,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Sanitized representation of a match for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct MatchView {
    pub match_id: MatchId,
    pub provider_id: ProviderId,
    pub score: f64,
    pub match_type: &'static str,
    pub status: &'static str,
    pub explanation: Vec<String>,
}
