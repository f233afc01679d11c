//! Static abdominal-pain knowledge base.
//!
//! Seven conditions, a warning-sign phrase list, and the small-talk phrase
//! lists used by the canned-reply stage. All of it is fixed at compile time
//! and validated once when the knowledge base is loaded; nothing here is
//! mutated at runtime.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Severity of a condition, drawn from a closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    MildToModerate,
    MildToSevere,
    ModerateToSevere,
    Severe,
}

impl Severity {
    /// Severities that warrant the medical-attention advisory.
    pub fn is_elevated(self) -> bool {
        matches!(self, Severity::Severe | Severity::ModerateToSevere)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::MildToModerate => "mild to moderate",
            Severity::MildToSevere => "mild to severe",
            Severity::ModerateToSevere => "moderate to severe",
            Severity::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named medical knowledge entry. Immutable after load.
#[derive(Debug, Clone)]
pub struct Condition {
    /// Unique snake_case identifier ("peptic_ulcer").
    pub key: &'static str,
    /// Ordered symptom phrases, most characteristic first.
    pub symptoms: &'static [&'static str],
    /// Ordered cause phrases.
    pub causes: &'static [&'static str],
    pub severity: Severity,
    /// Free-text duration descriptor ("acute", "chronic", "episodes").
    pub duration: &'static str,
    /// Body-location descriptor ("upper right abdomen").
    pub location: &'static str,
    pub description: &'static str,
}

impl Condition {
    /// Human-facing name: underscores become spaces, words are title-cased.
    pub fn display_name(&self) -> String {
        title_case(&self.key.replace('_', " "))
    }

    /// Descriptive text the embedding index encodes, one per condition.
    /// Field order is fixed so embeddings are reproducible across loads.
    pub fn profile_text(&self) -> String {
        format!(
            "{}: {} Symptoms: {}. Causes: {}. Location: {}. Severity: {}.",
            self.key,
            self.description,
            self.symptoms.join(", "),
            self.causes.join(", "),
            self.location,
            self.severity,
        )
    }
}

/// Capitalize the first letter of every whitespace-separated word.
pub(crate) fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Condition table ─────────────────────────────────────────

static CONDITIONS: &[Condition] = &[
    Condition {
        key: "gastritis",
        symptoms: &[
            "burning stomach pain",
            "nausea",
            "vomiting",
            "bloating",
            "loss of appetite",
        ],
        causes: &["H. pylori infection", "NSAIDs", "alcohol", "stress"],
        severity: Severity::MildToModerate,
        duration: "acute or chronic",
        location: "upper abdomen",
        description: "Inflammation of the stomach lining causing burning pain and digestive discomfort.",
    },
    Condition {
        key: "appendicitis",
        symptoms: &[
            "sharp pain near navel",
            "pain moves to lower right",
            "fever",
            "nausea",
            "vomiting",
        ],
        causes: &["blocked appendix", "infection"],
        severity: Severity::Severe,
        duration: "acute",
        location: "lower right abdomen",
        description: "Inflammation of the appendix requiring immediate medical attention.",
    },
    Condition {
        key: "irritable_bowel_syndrome",
        symptoms: &["cramping", "bloating", "gas", "diarrhea", "constipation"],
        causes: &["stress", "food triggers", "hormonal changes", "gut bacteria"],
        severity: Severity::MildToModerate,
        duration: "chronic",
        location: "lower abdomen",
        description: "Functional disorder affecting the large intestine with recurring symptoms.",
    },
    Condition {
        key: "gallstones",
        symptoms: &[
            "sudden severe pain",
            "pain after meals",
            "nausea",
            "vomiting",
            "fever",
        ],
        causes: &["cholesterol buildup", "bile composition", "genetics"],
        severity: Severity::ModerateToSevere,
        duration: "episodes",
        location: "upper right abdomen",
        description: "Hard deposits in the gallbladder causing pain and digestive issues.",
    },
    Condition {
        key: "peptic_ulcer",
        symptoms: &[
            "burning pain",
            "pain between meals",
            "pain at night",
            "nausea",
            "bloating",
        ],
        causes: &["H. pylori infection", "NSAIDs", "smoking", "alcohol"],
        severity: Severity::MildToSevere,
        duration: "chronic",
        location: "upper abdomen",
        description: "Open sores in the stomach or duodenum causing burning pain.",
    },
    Condition {
        key: "food_poisoning",
        symptoms: &[
            "sudden onset",
            "nausea",
            "vomiting",
            "diarrhea",
            "fever",
            "cramping",
        ],
        causes: &["contaminated food", "bacteria", "viruses", "parasites"],
        severity: Severity::MildToModerate,
        duration: "acute",
        location: "general abdomen",
        description: "Illness caused by consuming contaminated food or water.",
    },
    Condition {
        key: "kidney_stones",
        symptoms: &[
            "severe flank pain",
            "pain radiates to groin",
            "blood in urine",
            "nausea",
        ],
        causes: &["dehydration", "diet", "genetics", "medical conditions"],
        severity: Severity::Severe,
        duration: "episodes",
        location: "side and back",
        description: "Hard deposits in kidneys causing severe pain when passing.",
    },
];

// ── Phrase lists ────────────────────────────────────────────

/// Phrases that make a query urgent regardless of which condition matched.
static WARNING_SIGNS: &[&str] = &[
    "severe persistent pain",
    "high fever",
    "blood in vomit or stool",
    "difficulty breathing",
    "chest pain",
    "rapid pulse",
    "dehydration signs",
    "inability to pass gas or stool",
];

static GREETINGS: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
];

static HOW_ARE_YOU: &[&str] = &["how are you", "how are you doing", "how are you today"];

static CAPABILITY_QUESTIONS: &[&str] =
    &["what can you do", "how can you help", "what do you know"];

// ── Knowledge base ──────────────────────────────────────────

/// Errors from knowledge-base validation at load time.
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Duplicate condition key: {0}")]
    DuplicateKey(String),
    #[error("Condition {key} is missing required field: {field}")]
    MissingField { key: String, field: &'static str },
}

/// The fixed condition table plus the phrase lists the dispatcher consults.
pub struct KnowledgeBase {
    conditions: &'static [Condition],
    warning_signs: &'static [&'static str],
    greetings: &'static [&'static str],
    how_are_you: &'static [&'static str],
    capability_questions: &'static [&'static str],
}

impl KnowledgeBase {
    /// Load the builtin abdominal-pain knowledge base, validating every entry.
    pub fn builtin() -> Result<Self, KnowledgeError> {
        validate_conditions(CONDITIONS)?;
        Ok(Self {
            conditions: CONDITIONS,
            warning_signs: WARNING_SIGNS,
            greetings: GREETINGS,
            how_are_you: HOW_ARE_YOU,
            capability_questions: CAPABILITY_QUESTIONS,
        })
    }

    pub fn conditions(&self) -> &[Condition] {
        self.conditions
    }

    pub fn get(&self, key: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.key == key)
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// True if the (already lowercased) text contains any warning-sign phrase.
    pub fn contains_warning_sign(&self, lowered: &str) -> bool {
        self.warning_signs.iter().any(|sign| lowered.contains(sign))
    }

    pub fn greetings(&self) -> &[&'static str] {
        self.greetings
    }

    pub fn how_are_you(&self) -> &[&'static str] {
        self.how_are_you
    }

    pub fn capability_questions(&self) -> &[&'static str] {
        self.capability_questions
    }
}

/// Validate a condition table: unique non-empty keys, no empty fields.
fn validate_conditions(conditions: &[Condition]) -> Result<(), KnowledgeError> {
    let mut seen: Vec<&str> = Vec::with_capacity(conditions.len());

    for condition in conditions {
        if condition.key.is_empty() {
            return Err(KnowledgeError::MissingField {
                key: "<unnamed>".into(),
                field: "key",
            });
        }
        if seen.contains(&condition.key) {
            return Err(KnowledgeError::DuplicateKey(condition.key.into()));
        }
        seen.push(condition.key);

        let missing = if condition.symptoms.is_empty() {
            Some("symptoms")
        } else if condition.causes.is_empty() {
            Some("causes")
        } else if condition.description.is_empty() {
            Some("description")
        } else if condition.location.is_empty() {
            Some("location")
        } else if condition.duration.is_empty() {
            Some("duration")
        } else {
            None
        };

        if let Some(field) = missing {
            return Err(KnowledgeError::MissingField {
                key: condition.key.into(),
                field,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_loads_and_validates() {
        let kb = KnowledgeBase::builtin().unwrap();
        assert_eq!(kb.len(), 7);
        assert!(!kb.is_empty());
    }

    #[test]
    fn get_known_and_unknown_keys() {
        let kb = KnowledgeBase::builtin().unwrap();
        assert!(kb.get("appendicitis").is_some());
        assert!(kb.get("gastritis").is_some());
        assert!(kb.get("common_cold").is_none());
    }

    #[test]
    fn display_name_title_cases_and_strips_underscores() {
        let kb = KnowledgeBase::builtin().unwrap();
        let ibs = kb.get("irritable_bowel_syndrome").unwrap();
        assert_eq!(ibs.display_name(), "Irritable Bowel Syndrome");
        let ulcer = kb.get("peptic_ulcer").unwrap();
        assert_eq!(ulcer.display_name(), "Peptic Ulcer");
    }

    #[test]
    fn profile_text_contains_every_field() {
        let kb = KnowledgeBase::builtin().unwrap();
        let c = kb.get("appendicitis").unwrap();
        let text = c.profile_text();
        assert!(text.starts_with("appendicitis:"));
        assert!(text.contains(c.description));
        assert!(text.contains("sharp pain near navel"));
        assert!(text.contains("blocked appendix"));
        assert!(text.contains("lower right abdomen"));
        assert!(text.contains("severe"));
    }

    #[test]
    fn severity_display_matches_closed_set() {
        assert_eq!(Severity::MildToModerate.to_string(), "mild to moderate");
        assert_eq!(Severity::Severe.to_string(), "severe");
        assert_eq!(Severity::ModerateToSevere.to_string(), "moderate to severe");
    }

    #[test]
    fn elevated_severities_trigger_advisory() {
        assert!(Severity::Severe.is_elevated());
        assert!(Severity::ModerateToSevere.is_elevated());
        assert!(!Severity::MildToModerate.is_elevated());
        assert!(!Severity::MildToSevere.is_elevated());
    }

    #[test]
    fn warning_sign_detection_is_substring_based() {
        let kb = KnowledgeBase::builtin().unwrap();
        assert!(kb.contains_warning_sign("i noticed blood in vomit or stool today"));
        assert!(kb.contains_warning_sign("a high fever since yesterday"));
        assert!(!kb.contains_warning_sign("a mild ache after lunch"));
    }

    #[test]
    fn title_case_handles_mixed_input() {
        assert_eq!(title_case("sharp pain near navel"), "Sharp Pain Near Navel");
        assert_eq!(title_case(""), "");
        assert_eq!(title_case("fever"), "Fever");
    }

    #[test]
    fn validation_rejects_duplicate_keys() {
        static BAD: &[Condition] = &[
            Condition {
                key: "gastritis",
                symptoms: &["nausea"],
                causes: &["stress"],
                severity: Severity::MildToModerate,
                duration: "acute",
                location: "upper abdomen",
                description: "x",
            },
            Condition {
                key: "gastritis",
                symptoms: &["nausea"],
                causes: &["stress"],
                severity: Severity::MildToModerate,
                duration: "acute",
                location: "upper abdomen",
                description: "x",
            },
        ];
        assert!(matches!(
            validate_conditions(BAD),
            Err(KnowledgeError::DuplicateKey(_))
        ));
    }

    #[test]
    fn validation_rejects_empty_symptoms() {
        static BAD: &[Condition] = &[Condition {
            key: "mystery",
            symptoms: &[],
            causes: &["unknown"],
            severity: Severity::Severe,
            duration: "acute",
            location: "abdomen",
            description: "x",
        }];
        assert!(matches!(
            validate_conditions(BAD),
            Err(KnowledgeError::MissingField { field: "symptoms", .. })
        ));
    }
}
