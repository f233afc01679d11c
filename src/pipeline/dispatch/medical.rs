//! Knowledge-stage reply formatting.
//!
//! Formats the top-ranked condition into a structured summary: name,
//! description, leading symptoms, characteristics, then any advisories
//! the severity or the user's own wording call for, and the closing
//! educational disclaimer.

use crate::knowledge::{title_case, Condition, KnowledgeBase};

/// Appended when the matched condition's severity is elevated.
pub(crate) const ATTENTION_ADVISORY: &str = "**Important:** This condition may require medical attention. \
     Please consult a healthcare provider for proper diagnosis and treatment.";

/// Appended when the user's message contains a warning-sign phrase.
pub(crate) const URGENT_ADVISORY: &str = "**Urgent:** Your symptoms may indicate a serious condition. \
     Please seek immediate medical attention or call emergency services.";

/// Closes every knowledge-stage reply.
pub(crate) const DISCLAIMER: &str = "*This information is for educational purposes only and should \
     not replace professional medical advice.*";

/// Symptoms shown in the summary; the rest are omitted for brevity.
const MAX_SYMPTOMS_SHOWN: usize = 4;

/// Build the full knowledge-stage reply for a matched condition.
/// `lowered_input` is the user's message, lowercased, used for the
/// warning-sign check. Both advisories can co-occur.
pub fn condition_reply(
    condition: &Condition,
    lowered_input: &str,
    kb: &KnowledgeBase,
) -> String {
    let mut reply = format!(
        "Based on your symptoms, you might be experiencing {}.\n\n",
        condition.display_name()
    );

    reply.push_str(&format!("**Description:** {}\n\n", condition.description));

    reply.push_str("**Common symptoms include:**\n");
    for symptom in condition.symptoms.iter().take(MAX_SYMPTOMS_SHOWN) {
        reply.push_str(&format!("- {}\n", title_case(symptom)));
    }

    reply.push_str("\n**Typical characteristics:**\n");
    reply.push_str(&format!("- Location: {}\n", condition.location));
    reply.push_str(&format!("- Severity: {}\n", condition.severity));
    reply.push_str(&format!("- Duration: {}\n", condition.duration));

    if condition.severity.is_elevated() {
        reply.push_str(&format!("\n{ATTENTION_ADVISORY}\n"));
    }

    if kb.contains_warning_sign(lowered_input) {
        reply.push_str(&format!("\n{URGENT_ADVISORY}\n"));
    }

    reply.push_str(&format!("\n{DISCLAIMER}"));
    reply
}
