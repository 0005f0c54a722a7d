use serde::{Deserialize, Serialize};

/// Weights for the five scoring dimensions. The maximum attainable total is 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub service_types: f64,
    pub language: f64,
    pub vulnerability: f64,
    pub emergency_capable: f64,
    /// Applied (as a negative contribution) when an emergency meets a provider without
    /// emergency services.
    pub emergency_penalty: f64,
    /// Distance bands as (upper bound in km, points), ordered by increasing distance.
    pub proximity_bands: Vec<(f64, f64)>,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            service_types: 40.0,
            language: 20.0,
            vulnerability: 15.0,
            emergency_capable: 5.0,
            emergency_penalty: 10.0,
            proximity_bands: vec![(5.0, 20.0), (15.0, 15.0), (30.0, 10.0), (50.0, 5.0)],
        }
    }
}
