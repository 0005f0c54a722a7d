//! Assessment intake, emergency detection, provider scoring, and match persistence.

pub mod domain;
pub mod emergency;
pub mod progression;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod selector;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    Assessment, AssessmentId, AssessmentSubmission, ContactDetails, Coordinates, LiteracyMode,
    LocationData, MatchId, MatchStatus, MatchType, NeedCategory, Provider, ProviderId, SeekerId,
    UrgencyLevel, VerificationStatus,
};
pub use emergency::{detect_emergency, inspect_emergency, EmergencySignal, SignalCategory};
pub use progression::{MatchingPolicy, Progression, SeekerStatus, SeekerStatusKind};
pub use repository::{
    DirectoryError, IntakeRepository, MatchLifecycleError, MatchRecord, MatchView, NoticeKind,
    NotifyError, ProviderDirectory, RepositoryError, SeekerNotice, SeekerNotifier,
};
pub use router::intake_router;
pub use scoring::{ScoreBreakdown, ScoreCard, ScoringEngine, ScoringWeights};
pub use selector::{find_matches, MatchCandidate, MatchSelector};
pub use service::{AssessmentIntakeService, IntakeServiceError, SubmissionOutcome};
pub use validation::IntakeValidationError;
