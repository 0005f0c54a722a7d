mod config;
pub(crate) mod geo;
mod rules;

pub use config::ScoringWeights;
pub use geo::haversine_km;

use serde::{Deserialize, Serialize};

use super::domain::{Assessment, NeedCategory, Provider};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Stateless scorer pairing one assessment with one provider.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    weights: ScoringWeights,
}

impl ScoringEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn score(&self, assessment: &Assessment, provider: &Provider) -> ScoreCard {
        let breakdown = ScoreBreakdown {
            service_types: rules::service_type_factor(assessment, provider, &self.weights),
            language: rules::language_factor(assessment, provider, &self.weights),
            location: rules::location_factor(assessment, provider, &self.weights),
            vulnerability: rules::vulnerability_factor(assessment, provider, &self.weights),
            emergency: rules::emergency_factor(assessment, provider, &self.weights),
        };

        ScoreCard {
            score: breakdown.raw_total().clamp(MIN_SCORE, MAX_SCORE),
            breakdown,
        }
    }
}

/// Clamped total alongside the per-dimension evidence that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Audit trail for a score, one entry per dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub service_types: ServiceTypeFactor,
    pub language: LanguageFactor,
    pub location: LocationFactor,
    pub vulnerability: VulnerabilityFactor,
    pub emergency: EmergencyFactor,
}

impl ScoreBreakdown {
    /// Unclamped sum; negative when the emergency penalty outweighs everything else.
    pub fn raw_total(&self) -> f64 {
        self.service_types.score
            + self.language.score
            + self.location.score
            + self.vulnerability.score
            + self.emergency.score
    }

    /// One reviewer-facing line per dimension.
    pub fn explain(&self) -> Vec<String> {
        let service = if self.service_types.requested == 0 {
            "services: no needs listed".to_string()
        } else {
            let matched: Vec<&str> = self
                .service_types
                .matched
                .iter()
                .map(|category| category.label())
                .collect();
            format!(
                "services: {}/{} needs covered [{}] (+{:.1})",
                matched.len(),
                self.service_types.requested,
                matched.join(", "),
                self.service_types.score
            )
        };

        let language = if self.language.supported {
            format!(
                "language: '{}' supported (+{:.0})",
                self.language.preferred, self.language.score
            )
        } else {
            format!("language: '{}' not supported", self.language.preferred)
        };

        let location = match self.location.distance_km {
            Some(distance) => format!(
                "location: {:.1} km away (+{:.0})",
                distance, self.location.score
            ),
            None => "location: coordinates unavailable".to_string(),
        };

        let vulnerability = if self.vulnerability.requested == 0 {
            "vulnerability: no tags listed".to_string()
        } else {
            format!(
                "vulnerability: {}/{} specializations [{}] (+{:.1})",
                self.vulnerability.matched.len(),
                self.vulnerability.requested,
                self.vulnerability.matched.join(", "),
                self.vulnerability.score
            )
        };

        let emergency = match (
            self.emergency.assessment_emergency,
            self.emergency.provider_capable,
        ) {
            (true, true) => format!(
                "emergency: provider handles emergencies (+{:.0})",
                self.emergency.score
            ),
            (true, false) => format!(
                "emergency: provider lacks emergency services ({:.0})",
                self.emergency.score
            ),
            (false, _) => "emergency: not applicable".to_string(),
        };

        vec![service, language, location, vulnerability, emergency]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceTypeFactor {
    pub score: f64,
    pub requested: usize,
    pub matched: Vec<NeedCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageFactor {
    pub score: f64,
    pub preferred: String,
    pub supported: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFactor {
    pub score: f64,
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityFactor {
    pub score: f64,
    pub requested: usize,
    pub matched: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyFactor {
    pub score: f64,
    pub assessment_emergency: bool,
    pub provider_capable: bool,
}
