//! Rule-based emergency classification for free text and intake answers.
//!
//! Matching is plain lower-cased substring search over a fixed keyword table so every
//! term can be audited and unit tested on its own. The table has gaps; the surrounding
//! application keeps a manual emergency path that does not depend on this module.

use serde::Serialize;
use serde_json::{Map, Value};

/// Family of distress signal a keyword belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    Distress,
    Violence,
    Medical,
    MissingPerson,
}

/// Static group of normalized keywords for one category and language.
#[derive(Debug)]
pub struct KeywordGroup {
    pub category: SignalCategory,
    pub language: &'static str,
    pub terms: &'static [&'static str],
}

pub const EMERGENCY_KEYWORDS: &[KeywordGroup] = &[
    KeywordGroup {
        category: SignalCategory::Distress,
        language: "en",
        terms: &[
            "emergency",
            "urgent help",
            "help me",
            "in danger",
            "not safe",
            "unsafe",
            "suicide",
            "kill myself",
            "end my life",
        ],
    },
    KeywordGroup {
        category: SignalCategory::Violence,
        language: "en",
        terms: &[
            "abuse",
            "assault",
            "violence",
            "violent",
            "beating me",
            "beats me",
            "hitting me",
            "threatened to kill",
            "raped",
            "trafficked",
        ],
    },
    KeywordGroup {
        category: SignalCategory::Medical,
        language: "en",
        terms: &[
            "bleeding",
            "overdose",
            "unconscious",
            "heart attack",
            "can't breathe",
            "cannot breathe",
            "seizure",
        ],
    },
    KeywordGroup {
        category: SignalCategory::MissingPerson,
        language: "en",
        terms: &["missing child", "missing person", "kidnapped", "abducted"],
    },
    KeywordGroup {
        category: SignalCategory::Distress,
        language: "es",
        terms: &[
            "emergencia",
            "urgente",
            "socorro",
            "auxilio",
            "peligro",
            "suicidio",
            "quiero morir",
        ],
    },
    KeywordGroup {
        category: SignalCategory::Violence,
        language: "es",
        terms: &["abuso", "violencia", "agresión", "me pega", "violación", "amenaza de muerte"],
    },
    KeywordGroup {
        category: SignalCategory::Medical,
        language: "es",
        terms: &["sangrando", "sobredosis", "inconsciente", "infarto", "no puedo respirar"],
    },
    KeywordGroup {
        category: SignalCategory::MissingPerson,
        language: "es",
        terms: &["desaparecido", "desaparecida", "secuestrado", "secuestrada"],
    },
    KeywordGroup {
        category: SignalCategory::Distress,
        language: "fr",
        terms: &["urgence", "au secours", "en danger", "suicide", "me tuer"],
    },
    KeywordGroup {
        category: SignalCategory::Violence,
        language: "fr",
        terms: &["violence", "agression", "abus", "me frappe", "violée"],
    },
    KeywordGroup {
        category: SignalCategory::Medical,
        language: "fr",
        terms: &["saigne", "surdose", "inconscient", "crise cardiaque", "ne peux pas respirer"],
    },
    KeywordGroup {
        category: SignalCategory::MissingPerson,
        language: "fr",
        terms: &["disparu", "disparue", "enlevé", "enlevée"],
    },
    KeywordGroup {
        category: SignalCategory::Distress,
        language: "sw",
        terms: &["dharura", "hatari", "nisaidie haraka", "kujiua"],
    },
    KeywordGroup {
        category: SignalCategory::Violence,
        language: "sw",
        terms: &["unyanyasaji", "vurugu", "ananipiga", "ubakaji", "kunitishia"],
    },
    KeywordGroup {
        category: SignalCategory::Medical,
        language: "sw",
        terms: &["anatoka damu", "ninatoka damu", "amezimia", "siwezi kupumua"],
    },
    KeywordGroup {
        category: SignalCategory::MissingPerson,
        language: "sw",
        terms: &["amepotea", "ametekwa", "mtoto amepotea"],
    },
];

/// Canonical answer codes produced by the structured questionnaire.
pub const EMERGENCY_RESPONSE_CODES: &[&str] = &[
    "physical_abuse",
    "sexual_abuse",
    "domestic_violence",
    "medical_emergency",
    "immediate_danger",
    "suicidal",
    "self_harm",
    "trafficking",
    "missing_person",
    "no_shelter_tonight",
];

const URGENT_ANSWERS: &[&str] = &["immediate", "critical"];

/// Which rule classified the input as an emergency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmergencySignal {
    TextKeyword {
        category: SignalCategory,
        language: &'static str,
        term: &'static str,
    },
    ResponseCode {
        question: String,
        code: &'static str,
    },
    ResponseKeyword {
        question: String,
        category: SignalCategory,
        language: &'static str,
        term: &'static str,
    },
    UrgencyAnswer {
        question: String,
    },
    SafetyAnswer {
        question: String,
    },
}

impl EmergencySignal {
    pub fn label(&self) -> &'static str {
        match self {
            EmergencySignal::TextKeyword { .. } => "text_keyword",
            EmergencySignal::ResponseCode { .. } => "response_code",
            EmergencySignal::ResponseKeyword { .. } => "response_keyword",
            EmergencySignal::UrgencyAnswer { .. } => "urgency_answer",
            EmergencySignal::SafetyAnswer { .. } => "safety_answer",
        }
    }
}

/// True when any text keyword or response rule fires.
pub fn detect_emergency(responses: &Map<String, Value>, message_text: Option<&str>) -> bool {
    inspect_emergency(responses, message_text).is_some()
}

/// Return the first signal found, checking the message text before the responses.
pub fn inspect_emergency(
    responses: &Map<String, Value>,
    message_text: Option<&str>,
) -> Option<EmergencySignal> {
    if let Some(text) = message_text {
        let lowered = text.to_lowercase();
        if let Some((group, term)) = find_keyword(&lowered) {
            return Some(EmergencySignal::TextKeyword {
                category: group.category,
                language: group.language,
                term,
            });
        }
    }

    responses
        .iter()
        .find_map(|(question, answer)| inspect_response(question, answer))
}

fn inspect_response(question: &str, answer: &Value) -> Option<EmergencySignal> {
    let key = question.to_lowercase();

    if key.contains("urgency") {
        if let Some(value) = answer.as_str() {
            let value = value.trim().to_lowercase();
            if URGENT_ANSWERS.contains(&value.as_str()) {
                return Some(EmergencySignal::UrgencyAnswer {
                    question: question.to_string(),
                });
            }
        }
    }

    if key.contains("safe") && answer.as_bool() == Some(false) {
        return Some(EmergencySignal::SafetyAnswer {
            question: question.to_string(),
        });
    }

    let value = answer.as_str()?.to_lowercase();

    if let Some(code) = EMERGENCY_RESPONSE_CODES
        .iter()
        .copied()
        .find(|code| value.contains(code))
    {
        return Some(EmergencySignal::ResponseCode {
            question: question.to_string(),
            code,
        });
    }

    find_keyword(&value).map(|(group, term)| EmergencySignal::ResponseKeyword {
        question: question.to_string(),
        category: group.category,
        language: group.language,
        term,
    })
}

fn find_keyword(lowered: &str) -> Option<(&'static KeywordGroup, &'static str)> {
    EMERGENCY_KEYWORDS.iter().find_map(|group| {
        group
            .terms
            .iter()
            .copied()
            .find(|term| lowered.contains(term))
            .map(|term| (group, term))
    })
}
