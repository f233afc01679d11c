//! Small-talk stage: substring matches against fixed phrase lists.
//!
//! Lists are checked in fixed priority order (greetings, then
//! how-are-you, then capability questions) and the first matching list
//! wins. Matching is plain substring containment over the lowercased
//! input, so a greeting buried mid-sentence still counts.

use crate::knowledge::KnowledgeBase;

pub(crate) const GREETING_REPLY: &str = "Hello! I'm here to help you understand abdominal pain \
     and related symptoms. How can I assist you today?";

pub(crate) const HOW_ARE_YOU_REPLY: &str = "Thank you for asking! I'm doing well and ready to help \
     you with any questions about abdominal pain. How are you feeling?";

pub(crate) const CAPABILITY_REPLY: &str = "I'm a medical assistant specialized in abdominal pain. I can help you:\n\n\
     - Understand possible causes of abdominal pain\n\
     - Identify warning signs that need immediate attention\n\
     - Learn about different conditions and their symptoms\n\
     - Get guidance on when to see a doctor\n\n\
     Please describe your symptoms, and I'll provide relevant information.";

/// Return the canned reply for the first matching phrase list, if any.
/// `lowered` must already be lowercased.
pub fn match_canned(kb: &KnowledgeBase, lowered: &str) -> Option<&'static str> {
    if kb.greetings().iter().any(|p| lowered.contains(p)) {
        return Some(GREETING_REPLY);
    }
    if kb.how_are_you().iter().any(|p| lowered.contains(p)) {
        return Some(HOW_ARE_YOU_REPLY);
    }
    if kb
        .capability_questions()
        .iter()
        .any(|p| lowered.contains(p))
    {
        return Some(CAPABILITY_REPLY);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::builtin().unwrap()
    }

    #[test]
    fn every_greeting_phrase_returns_greeting_reply() {
        let kb = kb();
        for phrase in kb.greetings() {
            assert_eq!(
                match_canned(&kb, phrase),
                Some(GREETING_REPLY),
                "phrase: {phrase}"
            );
        }
    }

    #[test]
    fn how_are_you_returns_its_reply() {
        let kb = kb();
        assert_eq!(
            match_canned(&kb, "how are you today?"),
            Some(HOW_ARE_YOU_REPLY)
        );
    }

    #[test]
    fn capability_question_returns_capability_reply() {
        let kb = kb();
        assert_eq!(match_canned(&kb, "what can you do?"), Some(CAPABILITY_REPLY));
        assert_eq!(
            match_canned(&kb, "so, how can you help me?"),
            Some(CAPABILITY_REPLY)
        );
    }

    #[test]
    fn greetings_take_priority_over_later_lists() {
        let kb = kb();
        // Contains both a greeting and a capability phrase; greeting wins.
        assert_eq!(
            match_canned(&kb, "hello, what can you do?"),
            Some(GREETING_REPLY)
        );
    }

    #[test]
    fn symptom_text_is_not_canned() {
        let kb = kb();
        assert_eq!(
            match_canned(&kb, "sharp pain near navel, fever, pain moved to lower right"),
            None
        );
        assert_eq!(match_canned(&kb, "burning stomach pain after meals"), None);
    }

    #[test]
    fn matching_is_substring_based_mid_sentence() {
        let kb = kb();
        assert_eq!(
            match_canned(&kb, "well hello there, assistant"),
            Some(GREETING_REPLY)
        );
    }
}
