//! Follow-up suggestion derivation.
//!
//! A pure function of the user's message and the dispatcher's retrieval
//! outcome. No model calls, no state. Candidates accumulate in a fixed
//! order (condition-specific first, then pain clarifiers, then
//! symptom-specific extras) and the list is truncated to the cap.

use crate::knowledge::Condition;

/// Upper bound on suggestions returned per exchange.
pub const MAX_SUGGESTIONS: usize = 4;

/// Derive follow-up questions for one exchange. `matched` is the condition
/// the knowledge stage answered with, if any.
pub fn suggest(user_message: &str, matched: Option<&Condition>) -> Vec<String> {
    let lowered = user_message.to_lowercase();
    let mut suggestions = Vec::new();

    if let Some(condition) = matched {
        let name = condition.display_name();
        suggestions.push(format!("What causes {name}?"));
        suggestions.push(format!("How is {name} treated?"));
        suggestions.push(format!("When should I see a doctor for {name}?"));
        suggestions.push("What are the warning signs I should watch for?".to_string());
    }

    if ["pain", "hurt", "ache"].iter().any(|w| lowered.contains(w)) {
        suggestions.push("How severe is the pain on a scale of 1-10?".to_string());
        suggestions.push("Where exactly is the pain located?".to_string());
        suggestions.push("When did the pain start?".to_string());
        suggestions.push("What makes the pain better or worse?".to_string());
    }

    if lowered.contains("nausea") {
        suggestions.push("Are you also experiencing vomiting?".to_string());
    }

    if lowered.contains("fever") {
        suggestions.push("What is your current temperature?".to_string());
    }

    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}
