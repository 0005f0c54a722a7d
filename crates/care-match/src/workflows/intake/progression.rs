//! Per-seeker progression from collecting assessments to being ready for matching.

use serde::{Deserialize, Serialize};

use super::domain::{Assessment, SeekerId};
use super::repository::MatchRecord;
use super::selector::{DEFAULT_MAX_MATCHES, MINIMUM_MATCH_SCORE};

pub const DEFAULT_ASSESSMENTS_BEFORE_MATCHING: u32 = 3;

/// Accurate whether or not an emergency-capable provider was matched.
pub const EMERGENCY_STATUS_MESSAGE: &str = "Emergency detected. Only emergency-capable \
providers are considered for your matches. If none are listed, contact the emergency \
support line directly.";

/// Knobs governing when matching runs and how much it returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingPolicy {
    pub assessments_before_matching: u32,
    pub minimum_score: f64,
    pub max_matches: usize,
}

impl Default for MatchingPolicy {
    fn default() -> Self {
        Self {
            assessments_before_matching: DEFAULT_ASSESSMENTS_BEFORE_MATCHING,
            minimum_score: MINIMUM_MATCH_SCORE,
            max_matches: DEFAULT_MAX_MATCHES,
        }
    }
}

impl MatchingPolicy {
    /// Emergencies match immediately; everything else waits for the threshold.
    pub fn should_trigger(&self, assessment: &Assessment) -> bool {
        assessment.is_emergency()
            || assessment.sequence_number >= self.assessments_before_matching
    }

    pub fn remaining_after(&self, completed: u32) -> u32 {
        self.assessments_before_matching.saturating_sub(completed)
    }
}

/// What happened to a submission after it was recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Progression {
    Collecting { remaining: u32 },
    Matched { matches: Vec<MatchRecord> },
    NoSuitableProviders,
}

impl Progression {
    pub fn summary(&self) -> String {
        match self {
            Progression::Collecting { remaining } => assessments_needed_message(*remaining),
            Progression::Matched { matches } => {
                format!("{} provider match(es) found", matches.len())
            }
            Progression::NoSuitableProviders => {
                "no suitable providers found; please contact support".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekerStatusKind {
    Emergency,
    Ready,
    Pending,
}

impl SeekerStatusKind {
    pub const fn label(self) -> &'static str {
        match self {
            SeekerStatusKind::Emergency => "emergency",
            SeekerStatusKind::Ready => "ready",
            SeekerStatusKind::Pending => "pending",
        }
    }
}

/// Status snapshot rendered by the UI collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeekerStatus {
    pub seeker_id: SeekerId,
    pub status: SeekerStatusKind,
    pub message: String,
    pub completed: u32,
    pub remaining: u32,
}

/// Derive the status from stored assessments: any emergency wins, then the threshold.
pub fn seeker_status(
    seeker_id: &SeekerId,
    assessments: &[Assessment],
    policy: &MatchingPolicy,
) -> SeekerStatus {
    let completed = u32::try_from(assessments.len()).unwrap_or(u32::MAX);
    let remaining = policy.remaining_after(completed);

    let (status, message) = if assessments.iter().any(Assessment::is_emergency) {
        (
            SeekerStatusKind::Emergency,
            EMERGENCY_STATUS_MESSAGE.to_string(),
        )
    } else if remaining == 0 {
        (
            SeekerStatusKind::Ready,
            "Assessments complete. You are ready to be matched with providers.".to_string(),
        )
    } else {
        (
            SeekerStatusKind::Pending,
            assessments_needed_message(remaining),
        )
    };

    SeekerStatus {
        seeker_id: seeker_id.clone(),
        status,
        message,
        completed,
        remaining,
    }
}

fn assessments_needed_message(remaining: u32) -> String {
    if remaining == 1 {
        "1 more assessment needed before matching".to_string()
    } else {
        format!("{remaining} more assessments needed before matching")
    }
}
