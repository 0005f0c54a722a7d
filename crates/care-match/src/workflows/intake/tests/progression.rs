use serde_json::json;

use super::common::{assessment, calm_assessment, emergency_assessment};
use crate::workflows::intake::domain::SeekerId;
use crate::workflows::intake::progression::{seeker_status, Progression};
use crate::workflows::intake::{MatchingPolicy, SeekerStatusKind};

fn nth(sequence_number: u32) -> crate::workflows::intake::Assessment {
    let mut stored = calm_assessment();
    stored.sequence_number = sequence_number;
    stored
}

#[test]
fn calm_assessments_wait_for_threshold() {
    let policy = MatchingPolicy::default();

    assert!(!policy.should_trigger(&nth(1)));
    assert!(!policy.should_trigger(&nth(2)));
    assert!(policy.should_trigger(&nth(3)));
    assert!(policy.should_trigger(&nth(4)));
}

#[test]
fn emergency_triggers_on_first_assessment() {
    let policy = MatchingPolicy::default();

    assert!(policy.should_trigger(&emergency_assessment()));
}

#[test]
fn remaining_never_underflows() {
    let policy = MatchingPolicy::default();

    assert_eq!(policy.remaining_after(0), 3);
    assert_eq!(policy.remaining_after(2), 1);
    assert_eq!(policy.remaining_after(7), 0);
}

#[test]
fn status_counts_down_to_ready() {
    let policy = MatchingPolicy::default();
    let seeker = SeekerId("seeker-1".to_string());

    let empty = seeker_status(&seeker, &[], &policy);
    assert_eq!(empty.status, SeekerStatusKind::Pending);
    assert_eq!(empty.message, "3 more assessments needed before matching");

    let two = seeker_status(&seeker, &[nth(1), nth(2)], &policy);
    assert_eq!(two.status, SeekerStatusKind::Pending);
    assert_eq!(two.remaining, 1);
    assert!(two.message.contains("1 more assessment needed"));

    let three = seeker_status(&seeker, &[nth(1), nth(2), nth(3)], &policy);
    assert_eq!(three.status, SeekerStatusKind::Ready);
    assert_eq!(three.completed, 3);
    assert_eq!(three.remaining, 0);
}

#[test]
fn any_emergency_overrides_the_count() {
    let policy = MatchingPolicy::default();
    let seeker = SeekerId("seeker-1".to_string());
    let mut second = assessment(json!({ "current_situation": "immediate_danger" }));
    second.sequence_number = 2;

    let status = seeker_status(&seeker, &[nth(1), second], &policy);

    assert_eq!(status.status, SeekerStatusKind::Emergency);
    assert_eq!(status.status.label(), "emergency");
}

#[test]
fn custom_threshold_changes_the_trigger() {
    let policy = MatchingPolicy {
        assessments_before_matching: 1,
        ..MatchingPolicy::default()
    };

    assert!(policy.should_trigger(&nth(1)));
    assert_eq!(
        Progression::Collecting { remaining: 2 }.summary(),
        "2 more assessments needed before matching"
    );
}

#[test]
fn recorded_emergency_flag_is_taken_from_the_caller() {
    use super::common::{responses, submission};
    use crate::workflows::intake::domain::{Assessment, AssessmentId};

    let flagged = Assessment::record(
        AssessmentId("asm-flagged".to_string()),
        1,
        submission("seeker-1"),
        responses(json!({ "housing_situation": "staying with friends" })),
        true,
        chrono::Utc::now(),
    );

    assert!(flagged.is_emergency());
    assert!(MatchingPolicy::default().should_trigger(&flagged));
}
