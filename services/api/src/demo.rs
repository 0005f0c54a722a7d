use crate::infra::{load_roster, InMemoryIntakeRepository, InMemorySeekerNotifier};
use crate::routes::DirectoryValidationResponse;
use care_match::error::AppError;
use care_match::workflows::directory::{ProviderCsvImporter, ProviderRoster};
use care_match::workflows::intake::{
    detect_emergency, AssessmentIntakeService, AssessmentSubmission, Coordinates,
    IntakeServiceError, LiteracyMode, LocationData, MatchRecord, MatchingPolicy, NeedCategory,
    NoticeKind, Progression, SeekerId, UrgencyLevel,
};
use chrono::Local;
use clap::Args;
use serde_json::json;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

type DemoService =
    AssessmentIntakeService<InMemoryIntakeRepository, ProviderRoster, InMemorySeekerNotifier>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Provider directory CSV export. Defaults to the built-in sample roster.
    #[arg(long)]
    pub(crate) providers: Option<PathBuf>,
    /// Skip the emergency portion of the walkthrough.
    #[arg(long)]
    pub(crate) skip_emergency: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DirectoryCheckArgs {
    /// Provider directory CSV export to inspect
    #[arg(long)]
    pub(crate) path: PathBuf,
}

pub(crate) fn run_directory_check(args: DirectoryCheckArgs) -> Result<(), AppError> {
    let providers = ProviderCsvImporter::from_path(&args.path)?;
    let summary = DirectoryValidationResponse::from_providers(&providers);

    println!("Provider directory: {}", args.path.display());
    println!(
        "- {} providers | {} matchable | {} emergency capable",
        summary.total, summary.matchable, summary.emergency_capable
    );
    for provider in &summary.providers {
        let services: Vec<&str> = provider
            .services
            .iter()
            .map(|category| category.label())
            .collect();
        println!(
            "  - {} ({}) [{}]{}{}",
            provider.name,
            provider.id.0,
            services.join(", "),
            if provider.emergency_services { " emergency" } else { "" },
            if provider.matchable { "" } else { " (not matchable)" }
        );
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let roster = load_roster(args.providers.as_deref())?;
    let policy = MatchingPolicy::default();
    let notifier = Arc::new(InMemorySeekerNotifier::default());
    let service = AssessmentIntakeService::new(
        Arc::new(InMemoryIntakeRepository::default()),
        Arc::new(roster),
        notifier.clone(),
        policy.clone(),
    );

    println!("Care match demo ({})", Local::now().format("%Y-%m-%d %H:%M"));
    println!(
        "- matching after {} assessments | minimum score {} | up to {} providers",
        policy.assessments_before_matching, policy.minimum_score, policy.max_matches
    );

    println!("\nStandard intake");
    let mut matched = Vec::new();
    for round in 1..=policy.assessments_before_matching {
        let outcome = match service.submit_assessment(standard_submission(round)) {
            Ok(outcome) => outcome,
            Err(err) => {
                println!("  Submission rejected: {}", err);
                return Ok(());
            }
        };
        println!(
            "- assessment {} recorded -> {}",
            outcome.assessment.sequence_number,
            outcome.progression.summary()
        );
        if let Progression::Matched { matches } = outcome.progression {
            matched = matches;
        }
    }
    print_status(&service, "wanjiru");
    print_matches(&matched);

    if let Some(first) = matched.first() {
        walk_lifecycle(&service, first);
    }

    if args.skip_emergency {
        return Ok(());
    }

    println!("\nEmergency intake");
    let text = "Please help me, he threatened to kill me";
    println!(
        "- free text \"{}\" flagged as emergency: {}",
        text,
        detect_emergency(&serde_json::Map::new(), Some(text))
    );
    match service.submit_assessment(emergency_submission()) {
        Ok(outcome) => {
            println!(
                "- assessment {} (emergency: {}) -> {}",
                outcome.assessment.sequence_number,
                outcome.assessment.is_emergency(),
                outcome.progression.summary()
            );
            if let Progression::Matched { matches } = &outcome.progression {
                print_matches(matches);
            }
        }
        Err(err) => println!("  Emergency submission failed: {}", err),
    }
    print_status(&service, "neema");

    let notices = notifier.notices();
    println!("\nSeeker notices:");
    for notice in notices {
        let tag = match notice.kind {
            NoticeKind::MatchesFound { emergency: true, .. } => "emergency matches",
            NoticeKind::MatchesFound { .. } => "matches",
            NoticeKind::NoSuitableProviders { .. } => "no providers",
        };
        println!("  - {} [{}]: {}", notice.seeker_id.0, tag, notice.message);
    }

    Ok(())
}

fn print_status(service: &DemoService, seeker: &str) {
    match service.get_assessment_status(&SeekerId(seeker.to_string())) {
        Ok(status) => println!(
            "  Status for {}: {} ({})",
            seeker,
            status.status.label(),
            status.message
        ),
        Err(err) => println!("  Status unavailable: {}", err),
    }
}

fn print_matches(matches: &[MatchRecord]) {
    if matches.is_empty() {
        println!("  No matches recorded");
        return;
    }
    for record in matches {
        println!(
            "  - {} -> {} score {:.1} ({})",
            record.id.0,
            record.provider_id.0,
            record.score,
            record.match_type.label()
        );
        for line in record.criteria.explain() {
            println!("      {}", line);
        }
    }
}

fn walk_lifecycle(service: &DemoService, record: &MatchRecord) {
    let step = service
        .record_provider_response(&record.id, true, Some("Intake call booked".to_string()))
        .and_then(|accepted| {
            println!(
                "  Provider {} responded -> {}",
                accepted.provider_id.0,
                accepted.status.label()
            );
            service.record_feedback(&record.id, Some("Moved in this week".to_string()))
        });

    match step {
        Ok(completed) => println!("  Seeker feedback recorded -> {}", completed.status.label()),
        Err(IntakeServiceError::Lifecycle(err)) => println!("  Match not advanced: {}", err),
        Err(err) => println!("  Match update failed: {}", err),
    }
}

fn standard_submission(round: u32) -> AssessmentSubmission {
    AssessmentSubmission {
        seeker_id: SeekerId("wanjiru".to_string()),
        need_types: BTreeSet::from([NeedCategory::Shelter, NeedCategory::Employment]),
        urgency_level: UrgencyLevel::Medium,
        language_preference: "en".to_string(),
        location_data: Some(LocationData {
            address: None,
            coordinates: Some(Coordinates::new(-1.3000, 36.8500)),
            region: Some("Nairobi".to_string()),
        }),
        vulnerability_tags: BTreeSet::new(),
        literacy_mode: Some(LiteracyMode::Text),
        assessment_responses: json!({
            "round": round,
            "housing_situation": "renting a room, lease ends next month",
            "employment_status": "part time"
        }),
    }
}

fn emergency_submission() -> AssessmentSubmission {
    AssessmentSubmission {
        seeker_id: SeekerId("neema".to_string()),
        need_types: BTreeSet::from([NeedCategory::Shelter]),
        urgency_level: UrgencyLevel::High,
        language_preference: "sw".to_string(),
        location_data: Some(LocationData {
            address: None,
            coordinates: Some(Coordinates::new(-1.2850, 36.8200)),
            region: Some("Nairobi".to_string()),
        }),
        vulnerability_tags: BTreeSet::from(["women".to_string()]),
        literacy_mode: Some(LiteracyMode::Voice),
        assessment_responses: json!({
            "safe_at_home": false,
            "situation": "domestic_violence"
        }),
    }
}
