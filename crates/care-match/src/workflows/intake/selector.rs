use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{Assessment, Provider};
use super::scoring::{ScoreBreakdown, ScoringEngine};

pub const DEFAULT_MAX_MATCHES: usize = 3;
pub const MINIMUM_MATCH_SCORE: f64 = 30.0;

/// Provider that cleared the selector, with the evidence for its rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub provider: Provider,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Filters, scores, and ranks providers for a single assessment.
#[derive(Debug, Clone)]
pub struct MatchSelector {
    engine: ScoringEngine,
    minimum_score: f64,
}

impl Default for MatchSelector {
    fn default() -> Self {
        Self::new(ScoringEngine::default(), MINIMUM_MATCH_SCORE)
    }
}

impl MatchSelector {
    pub fn new(engine: ScoringEngine, minimum_score: f64) -> Self {
        Self {
            engine,
            minimum_score,
        }
    }

    pub fn minimum_score(&self) -> f64 {
        self.minimum_score
    }

    /// Rank eligible providers best first. An empty result means nobody cleared the bar.
    ///
    /// Unverified or inactive providers never qualify, and emergencies only ever reach
    /// providers offering emergency services, whatever their score. Equal scores are
    /// ordered by provider id.
    pub fn find_matches(
        &self,
        assessment: &Assessment,
        providers: &[Provider],
        max_matches: usize,
    ) -> Vec<MatchCandidate> {
        let mut candidates: Vec<MatchCandidate> = providers
            .iter()
            .filter(|provider| provider.is_matchable())
            .filter(|provider| !assessment.is_emergency() || provider.emergency_services)
            .map(|provider| {
                let card = self.engine.score(assessment, provider);
                MatchCandidate {
                    provider: provider.clone(),
                    score: card.score,
                    breakdown: card.breakdown,
                }
            })
            .collect();

        candidates.sort_by(rank_order);

        let eligible = candidates.len();
        candidates.retain(|candidate| candidate.score >= self.minimum_score);
        candidates.truncate(max_matches);

        debug!(
            assessment_id = %assessment.id.0,
            eligible,
            selected = candidates.len(),
            "ranked provider candidates"
        );

        candidates
    }
}

/// Convenience entry point using the default weights and threshold.
pub fn find_matches(
    assessment: &Assessment,
    providers: &[Provider],
    max_matches: usize,
) -> Vec<MatchCandidate> {
    MatchSelector::default().find_matches(assessment, providers, max_matches)
}

fn rank_order(left: &MatchCandidate, right: &MatchCandidate) -> Ordering {
    right
        .score
        .total_cmp(&left.score)
        .then_with(|| left.provider.id.cmp(&right.provider.id))
}
