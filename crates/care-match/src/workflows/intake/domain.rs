use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier wrapper for the person submitting assessments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeekerId(pub String);

/// Identifier wrapper for stored assessments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssessmentId(pub String);

/// Identifier wrapper for directory providers. Ordered so ranking ties resolve by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderId(pub String);

/// Identifier wrapper for persisted matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchId(pub String);

/// Closed vocabulary of needs a seeker can report and a provider can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedCategory {
    Shelter,
    LegalAid,
    Health,
    MentalHealth,
    Employment,
    Education,
    Food,
    Childcare,
    Financial,
    Transportation,
}

impl NeedCategory {
    pub const fn label(self) -> &'static str {
        match self {
            NeedCategory::Shelter => "shelter",
            NeedCategory::LegalAid => "legal_aid",
            NeedCategory::Health => "health",
            NeedCategory::MentalHealth => "mental_health",
            NeedCategory::Employment => "employment",
            NeedCategory::Education => "education",
            NeedCategory::Food => "food",
            NeedCategory::Childcare => "childcare",
            NeedCategory::Financial => "financial",
            NeedCategory::Transportation => "transportation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        let category = match normalized.as_str() {
            "shelter" | "housing" => NeedCategory::Shelter,
            "legal_aid" | "legal" => NeedCategory::LegalAid,
            "health" | "medical" => NeedCategory::Health,
            "mental_health" | "counseling" => NeedCategory::MentalHealth,
            "employment" | "jobs" => NeedCategory::Employment,
            "education" => NeedCategory::Education,
            "food" => NeedCategory::Food,
            "childcare" => NeedCategory::Childcare,
            "financial" => NeedCategory::Financial,
            "transportation" => NeedCategory::Transportation,
            _ => return None,
        };
        Some(category)
    }
}

/// Self-reported urgency attached to every assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    High,
    Medium,
    Low,
}

/// How the seeker prefers to interact with the intake flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteracyMode {
    Text,
    Voice,
    Assisted,
}

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Structured location shared by seekers and providers. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub region: Option<String>,
}

impl LocationData {
    /// Coordinates usable for distance math; out-of-range pairs count as absent.
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates.filter(Coordinates::is_valid)
    }
}

/// Payload accepted by `submit_assessment` before sequencing and emergency detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSubmission {
    pub seeker_id: SeekerId,
    #[serde(default)]
    pub need_types: BTreeSet<NeedCategory>,
    pub urgency_level: UrgencyLevel,
    pub language_preference: String,
    #[serde(default)]
    pub location_data: Option<LocationData>,
    #[serde(default)]
    pub vulnerability_tags: BTreeSet<String>,
    #[serde(default)]
    pub literacy_mode: Option<LiteracyMode>,
    #[serde(default = "empty_responses")]
    pub assessment_responses: Value,
}

fn empty_responses() -> Value {
    Value::Object(Map::new())
}

/// Stored assessment. The emergency flag is fixed when the record is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub seeker_id: SeekerId,
    pub sequence_number: u32,
    pub need_types: BTreeSet<NeedCategory>,
    pub urgency_level: UrgencyLevel,
    pub language_preference: String,
    pub location: Option<LocationData>,
    pub vulnerability_tags: BTreeSet<String>,
    pub literacy_mode: Option<LiteracyMode>,
    pub responses: Map<String, Value>,
    is_emergency: bool,
    pub completed_at: DateTime<Utc>,
}

impl Assessment {
    /// Build the record of a submission whose responses already passed validation.
    /// `is_emergency` is the detector's verdict on `responses`.
    pub fn record(
        id: AssessmentId,
        sequence_number: u32,
        submission: AssessmentSubmission,
        responses: Map<String, Value>,
        is_emergency: bool,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            seeker_id: submission.seeker_id,
            sequence_number,
            need_types: submission.need_types,
            urgency_level: submission.urgency_level,
            language_preference: submission.language_preference,
            location: submission.location_data,
            vulnerability_tags: submission.vulnerability_tags,
            literacy_mode: submission.literacy_mode,
            responses,
            is_emergency,
            completed_at,
        }
    }

    pub fn is_emergency(&self) -> bool {
        self.is_emergency
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.location.as_ref().and_then(LocationData::coordinates)
    }
}

/// Outcome of the external verification workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    Pending,
    Rejected,
}

impl VerificationStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "verified" => Some(Self::Verified),
            "pending" => Some(Self::Pending),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// Directory entry for an organization offering services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    pub service_types: BTreeSet<NeedCategory>,
    #[serde(default)]
    pub location: Option<LocationData>,
    pub languages_supported: BTreeSet<String>,
    #[serde(default)]
    pub vulnerability_specializations: BTreeSet<String>,
    #[serde(default)]
    pub contact: ContactDetails,
    pub emergency_services: bool,
    pub verification_status: VerificationStatus,
    pub is_active: bool,
}

impl Provider {
    /// Only verified, active providers may ever be offered to a seeker.
    pub fn is_matchable(&self) -> bool {
        self.verification_status == VerificationStatus::Verified && self.is_active
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.location.as_ref().and_then(LocationData::coordinates)
    }

    pub fn supports_language(&self, code: &str) -> bool {
        let wanted = code.trim();
        !wanted.is_empty()
            && self
                .languages_supported
                .iter()
                .any(|language| language.trim().eq_ignore_ascii_case(wanted))
    }
}

/// Why a match was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Emergency,
    Standard,
    FollowUp,
}

impl MatchType {
    pub const fn label(self) -> &'static str {
        match self {
            MatchType::Emergency => "emergency",
            MatchType::Standard => "standard",
            MatchType::FollowUp => "follow_up",
        }
    }
}

/// Lifecycle of a persisted match: pending, then accepted or declined, then completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Accepted,
    Declined,
    Completed,
}

impl MatchStatus {
    pub const fn label(self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Accepted => "accepted",
            MatchStatus::Declined => "declined",
            MatchStatus::Completed => "completed",
        }
    }
}
