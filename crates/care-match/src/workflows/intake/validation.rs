use serde_json::{Map, Value};
use tracing::warn;

use super::domain::AssessmentSubmission;

/// Structural defects that make a submission impossible to record.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IntakeValidationError {
    #[error("seeker id must not be blank")]
    MissingSeekerId,
    #[error("assessment responses must be a JSON object, found {found}")]
    ResponsesNotAnObject { found: &'static str },
}

/// Submission whose responses have been unpacked into a question/answer map.
#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    pub submission: AssessmentSubmission,
    pub responses: Map<String, Value>,
}

/// Reject structurally invalid input and normalize the rest. Missing needs or
/// malformed locations are accepted; scoring degrades those dimensions to zero.
pub fn validate_submission(
    mut submission: AssessmentSubmission,
) -> Result<ValidatedSubmission, IntakeValidationError> {
    let seeker = submission.seeker_id.0.trim();
    if seeker.is_empty() {
        return Err(IntakeValidationError::MissingSeekerId);
    }
    submission.seeker_id.0 = seeker.to_string();

    let responses = match std::mem::take(&mut submission.assessment_responses) {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(IntakeValidationError::ResponsesNotAnObject {
                found: json_kind(&other),
            })
        }
    };

    submission.language_preference = submission.language_preference.trim().to_lowercase();
    submission.vulnerability_tags = submission
        .vulnerability_tags
        .iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect();

    if submission.need_types.is_empty() {
        warn!(seeker_id = %submission.seeker_id.0, "assessment submitted without need types");
    }

    Ok(ValidatedSubmission {
        submission,
        responses,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
