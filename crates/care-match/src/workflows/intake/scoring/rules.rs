use std::collections::BTreeSet;

use super::super::domain::{Assessment, NeedCategory, Provider};
use super::config::ScoringWeights;
use super::geo::{haversine_km, proximity_points};
use super::{
    EmergencyFactor, LanguageFactor, LocationFactor, ServiceTypeFactor, VulnerabilityFactor,
};

pub(crate) fn service_type_factor(
    assessment: &Assessment,
    provider: &Provider,
    weights: &ScoringWeights,
) -> ServiceTypeFactor {
    let requested = assessment.need_types.len();
    let matched: Vec<NeedCategory> = assessment
        .need_types
        .intersection(&provider.service_types)
        .copied()
        .collect();

    // Empty need sets contribute nothing rather than dividing by zero.
    let score = if requested == 0 {
        0.0
    } else {
        matched.len() as f64 / requested as f64 * weights.service_types
    };

    ServiceTypeFactor {
        score,
        requested,
        matched,
    }
}

pub(crate) fn language_factor(
    assessment: &Assessment,
    provider: &Provider,
    weights: &ScoringWeights,
) -> LanguageFactor {
    let supported = provider.supports_language(&assessment.language_preference);

    LanguageFactor {
        score: if supported { weights.language } else { 0.0 },
        preferred: assessment.language_preference.clone(),
        supported,
    }
}

pub(crate) fn location_factor(
    assessment: &Assessment,
    provider: &Provider,
    weights: &ScoringWeights,
) -> LocationFactor {
    match (assessment.coordinates(), provider.coordinates()) {
        (Some(seeker), Some(office)) => {
            let distance_km = haversine_km(seeker, office);
            LocationFactor {
                score: proximity_points(distance_km, &weights.proximity_bands),
                distance_km: Some(distance_km),
            }
        }
        _ => LocationFactor {
            score: 0.0,
            distance_km: None,
        },
    }
}

pub(crate) fn vulnerability_factor(
    assessment: &Assessment,
    provider: &Provider,
    weights: &ScoringWeights,
) -> VulnerabilityFactor {
    let tags = normalized(&assessment.vulnerability_tags);
    let specializations = normalized(&provider.vulnerability_specializations);
    let requested = tags.len();
    let matched: Vec<String> = tags.intersection(&specializations).cloned().collect();

    let score = if requested == 0 {
        0.0
    } else {
        matched.len() as f64 / requested as f64 * weights.vulnerability
    };

    VulnerabilityFactor {
        score,
        requested,
        matched,
    }
}

pub(crate) fn emergency_factor(
    assessment: &Assessment,
    provider: &Provider,
    weights: &ScoringWeights,
) -> EmergencyFactor {
    let assessment_emergency = assessment.is_emergency();
    let provider_capable = provider.emergency_services;

    let score = match (assessment_emergency, provider_capable) {
        (true, true) => weights.emergency_capable,
        (true, false) => -weights.emergency_penalty,
        (false, _) => 0.0,
    };

    EmergencyFactor {
        score,
        assessment_emergency,
        provider_capable,
    }
}

fn normalized(tags: &BTreeSet<String>) -> BTreeSet<String> {
    tags.iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}
