use super::common::{
    calm_assessment, emergency_assessment, emergency_provider, located, provider, provider_at,
};
use crate::workflows::intake::domain::{ProviderId, VerificationStatus};
use crate::workflows::intake::scoring::ScoringEngine;
use crate::workflows::intake::selector::{find_matches, MatchSelector};

fn ids(candidates: &[crate::workflows::intake::MatchCandidate]) -> Vec<&str> {
    candidates
        .iter()
        .map(|candidate| candidate.provider.id.0.as_str())
        .collect()
}

#[test]
fn emergency_excludes_providers_without_emergency_services() {
    let providers = vec![provider("prov-plain"), emergency_provider("prov-crisis")];

    let candidates = find_matches(&emergency_assessment(), &providers, 3);

    assert_eq!(ids(&candidates), vec!["prov-crisis"]);
    assert_eq!(candidates[0].score, 65.0);
}

#[test]
fn emergency_with_no_capable_provider_returns_nothing() {
    let providers = vec![provider("prov-a"), provider("prov-b")];

    assert!(find_matches(&emergency_assessment(), &providers, 3).is_empty());
}

#[test]
fn unverified_and_inactive_providers_never_match() {
    let mut pending = provider("prov-pending");
    pending.verification_status = VerificationStatus::Pending;
    let mut closed = provider("prov-closed");
    closed.is_active = false;
    let providers = vec![pending, closed, provider("prov-open")];

    let candidates = find_matches(&calm_assessment(), &providers, 3);

    assert_eq!(ids(&candidates), vec!["prov-open"]);
}

#[test]
fn results_are_sorted_and_truncated() {
    let assessment = located(calm_assessment(), 0.0, 0.0);
    let providers = vec![
        provider_at("prov-far", 0.36, 0.0),
        provider_at("prov-near", 0.027, 0.0),
        provider_at("prov-mid", 0.18, 0.0),
        provider("prov-none"),
    ];

    let candidates = find_matches(&assessment, &providers, 3);

    assert_eq!(ids(&candidates), vec!["prov-near", "prov-mid", "prov-far"]);
    assert!(candidates
        .windows(2)
        .all(|pair| pair[0].score >= pair[1].score));
}

#[test]
fn equal_scores_are_ordered_by_provider_id() {
    let providers = vec![provider("prov-c"), provider("prov-a"), provider("prov-b")];

    let first = find_matches(&calm_assessment(), &providers, 2);
    let reversed: Vec<_> = providers.into_iter().rev().collect();
    let second = find_matches(&calm_assessment(), &reversed, 2);

    assert_eq!(ids(&first), vec!["prov-a", "prov-b"]);
    assert_eq!(ids(&first), ids(&second));
}

#[test]
fn candidates_below_minimum_score_are_dropped() {
    let mut assessment = calm_assessment();
    assessment.language_preference = "fr".to_string();
    let providers = vec![provider("prov-a")];

    // 40 points from services alone clears the default bar of 30.
    assert_eq!(find_matches(&assessment, &providers, 3).len(), 1);

    let strict = MatchSelector::new(ScoringEngine::default(), 45.0);
    assert!(strict.find_matches(&assessment, &providers, 3).is_empty());
}

#[test]
fn zero_max_matches_yields_empty_result() {
    assert!(find_matches(&calm_assessment(), &[provider("prov-a")], 0).is_empty());
}

#[test]
fn selection_is_deterministic() {
    let providers: Vec<_> = (0..6).map(|n| provider(&format!("prov-{n}"))).collect();

    let first = find_matches(&calm_assessment(), &providers, 3);
    let second = find_matches(&calm_assessment(), &providers, 3);

    assert_eq!(first, second);
    assert_eq!(first[0].provider.id, ProviderId("prov-0".to_string()));
}
