//! Regex-derived turn heuristics.
//!
//! Every function here is a pure mapping from generated text to a
//! structured value; none of them touch `MemoryState`. They are best-effort
//! string matching with no semantic understanding — false positives and
//! negatives are expected and accepted. The correctness target is
//! reproducibility: the same text always yields the same extraction.

use crate::config::Mode;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static ROLEPLAY_EMOTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(smiled|laughed|sighed|frowned|blushed|nervous|excited|angry|happy|sad|calm|terrified|aroused|horny)\b",
    )
    .unwrap()
});

static STORY_EMOTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(aroused|excited|embarrassed|terrified|calm|nervous|desperate)\b").unwrap()
});

// Letter class stays case-sensitive so the article in "a cup of tea"
// cannot match.
static CUP_SIZE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-H]+\s*(?i:cup))\b").unwrap()
});

static POSITIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(smile|happy|love|like|kind|sweet|gentle|warm)\b").unwrap()
});

static NEGATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(angry|hate|dislike|rude|cold|annoyed|frustrated)\b").unwrap()
});

static HEAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(horny|aroused|needy|hot|sexy|playful|huge|hard|big|panic|desperate)\b")
        .unwrap()
});

static PROPER_NOUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z][a-z]{2,}\b").unwrap());

static DIALOGUE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([A-Z][a-z]+ [A-Z][a-z]+|[A-Z][a-z]+)""#).unwrap());

static SENTENCE_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

/// Capitalized words that are never character names.
const NAME_STOP_LIST: &[&str] = &[
    "The", "And", "But", "For", "With", "This", "That", "There", "Then", "You", "Your", "They",
    "She", "He", "It", "We", "Us", "Our", "Their", "What", "When", "Where",
];

/// Verbs and verb-like markers that make a sentence a plot event.
const EVENT_KEYWORDS: &[&str] = &[
    "decided", "began", "found", "discovered", "realized", "promised", "agreed", "refused",
    "encountered", "met", "fought", "traveled", "learned", "changed", "revealed", "grew",
    "shrunk", "aroused", "calmed", "grow", "started",
];

/// Maximum character names registered from one text.
const MAX_NAMES_PER_TURN: usize = 5;

/// Maximum plot events retained from one text.
const MAX_EVENTS_PER_TURN: usize = 3;

/// Relationship-progression label, recomputed from scratch each turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RelationshipLabel {
    /// Positive words clearly dominate.
    Warming,
    /// Negative words clearly dominate.
    Tense,
    /// Heat words outweigh the negatives.
    Heating,
    /// Everything else, including ties.
    #[default]
    Stable,
}

impl RelationshipLabel {
    /// The label text embedded in continuation prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipLabel::Warming => "warming up, becoming closer",
            RelationshipLabel::Tense => "tense, find a way to get closer again",
            RelationshipLabel::Heating => "sexual tension increasing, use more sexual language",
            RelationshipLabel::Stable => "stable, maintaining current dynamic",
        }
    }
}

impl std::fmt::Display for RelationshipLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First emotional cue in the text, per the mode's vocabulary.
pub fn detect_emotion(mode: Mode, text: &str) -> Option<String> {
    let re = match mode {
        Mode::Story => &*STORY_EMOTION_RE,
        Mode::Roleplay => &*ROLEPLAY_EMOTION_RE,
    };
    re.find(text).map(|m| m.as_str().to_lowercase())
}

/// First "X cup" mention in the text.
pub fn detect_cup_size(text: &str) -> Option<String> {
    CUP_SIZE_RE
        .captures(text)
        .map(|c| c[1].to_string())
}

/// Score the emotional tone of a combined input+output exchange.
///
/// Pure threshold comparison over three fixed word lists; ties resolve to
/// `Stable`.
pub fn score_relationship(combined_text: &str) -> RelationshipLabel {
    let positive = POSITIVE_RE.find_iter(combined_text).count();
    let negative = NEGATIVE_RE.find_iter(combined_text).count();
    let heat = HEAT_RE.find_iter(combined_text).count();

    if positive > negative + 2 {
        RelationshipLabel::Warming
    } else if negative > positive + 2 {
        RelationshipLabel::Tense
    } else if heat > negative + 1 {
        RelationshipLabel::Heating
    } else {
        RelationshipLabel::Stable
    }
}

/// Potential character names: capitalized words of length >= 3 outside the
/// stop list, plus names quoted in dialogue. Deduplicated in encounter
/// order, capped at 5.
pub fn extract_character_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    let candidates = PROPER_NOUN_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .chain(
            DIALOGUE_NAME_RE
                .captures_iter(text)
                .map(|c| c[1].to_string()),
        );

    for candidate in candidates {
        if NAME_STOP_LIST.contains(&candidate.as_str()) {
            continue;
        }
        if !names.contains(&candidate) {
            names.push(candidate);
        }
        if names.len() == MAX_NAMES_PER_TURN {
            break;
        }
    }

    names
}

/// Descriptive clauses attached to a character, e.g. "Mira was pale and
/// shaking". Only clauses of more than two words count.
pub fn extract_traits(text: &str, character_name: &str) -> Vec<String> {
    let pattern = format!(
        r"(?i){}\s+(was|is|had|has|seemed|looked|appeared)\s+([^.!?]+)[.!?]",
        regex::escape(character_name)
    );
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };

    let mut traits = Vec::new();
    for captures in re.captures_iter(text) {
        let description = captures[2].trim().to_string();
        if description.split_whitespace().count() > 2 && !traits.contains(&description) {
            traits.push(description);
        }
    }
    traits
}

/// Sentences judged significant: more than 6 words and at least one event
/// keyword. Up to 3 per text, in encounter order.
pub fn extract_key_events(text: &str) -> Vec<String> {
    let mut events = Vec::new();

    for sentence in SENTENCE_SPLIT_RE.split(text) {
        let sentence = sentence.trim();
        if sentence.is_empty() || sentence.split_whitespace().count() <= 6 {
            continue;
        }
        let lowered = sentence.to_lowercase();
        if EVENT_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            events.push(sentence.to_string());
            if events.len() == MAX_EVENTS_PER_TURN {
                break;
            }
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emotion_first_match_wins() {
        let text = "She laughed, then frowned at the letter.";
        assert_eq!(
            detect_emotion(Mode::Roleplay, text),
            Some("laughed".to_string())
        );
    }

    #[test]
    fn test_emotion_vocabulary_differs_by_mode() {
        let text = "He looked embarrassed but smiled anyway.";
        // "embarrassed" only exists in the story vocabulary,
        // "smiled" only in the roleplay one.
        assert_eq!(
            detect_emotion(Mode::Story, text),
            Some("embarrassed".to_string())
        );
        assert_eq!(
            detect_emotion(Mode::Roleplay, text),
            Some("smiled".to_string())
        );
    }

    #[test]
    fn test_no_emotion() {
        assert_eq!(detect_emotion(Mode::Story, "The door creaked open."), None);
    }

    #[test]
    fn test_cup_size() {
        assert_eq!(
            detect_cup_size("her D cup bra"),
            Some("D cup".to_string())
        );
        assert_eq!(detect_cup_size("a cup of tea on the table"), None);
        assert_eq!(detect_cup_size("no mention at all"), None);
    }

    #[test]
    fn test_relationship_warming() {
        // 4 positive (love, sweet, warm, smile), 0 negative.
        let text = "I love you, you are so sweet. She gave a warm smile.";
        assert_eq!(score_relationship(text), RelationshipLabel::Warming);
    }

    #[test]
    fn test_relationship_tense() {
        let text = "He was angry and rude, cold and annoyed with everyone.";
        assert_eq!(score_relationship(text), RelationshipLabel::Tense);
    }

    #[test]
    fn test_relationship_heat_beats_stable() {
        let text = "The night felt hot and she was playful.";
        assert_eq!(score_relationship(text), RelationshipLabel::Heating);
    }

    #[test]
    fn test_relationship_balanced_is_stable() {
        // 1 positive (happy), 1 negative (cold): no threshold crossed.
        let text = "She was happy but the room stayed cold.";
        assert_eq!(score_relationship(text), RelationshipLabel::Stable);
        assert_eq!(
            score_relationship(text).as_str(),
            "stable, maintaining current dynamic"
        );
    }

    #[test]
    fn test_name_extraction_respects_stop_list() {
        let names = extract_character_names("The Quick fox met Daniel");
        assert!(names.contains(&"Quick".to_string()));
        assert!(names.contains(&"Daniel".to_string()));
        assert!(!names.contains(&"The".to_string()));
    }

    #[test]
    fn test_name_extraction_dedupes_and_caps() {
        let text = "Anna met Anna. Ben met Cara and Dana near Evan and Fiona.";
        let names = extract_character_names(text);
        assert_eq!(names.len(), 5);
        assert_eq!(names[0], "Anna");
        assert_eq!(names.iter().filter(|n| *n == "Anna").count(), 1);
    }

    #[test]
    fn test_dialogue_names() {
        let names = extract_character_names(r#"A voice called out: "Marcus""#);
        assert!(names.contains(&"Marcus".to_string()));
    }

    #[test]
    fn test_trait_extraction() {
        let text = "Mira was pale and visibly shaking. Mira is tall.";
        let traits = extract_traits(text, "Mira");
        assert_eq!(traits, vec!["pale and visibly shaking".to_string()]);
    }

    #[test]
    fn test_trait_extraction_escapes_name() {
        // A name with regex metacharacters must not break the pattern.
        let traits = extract_traits("Dr. Who was tired beyond measure.", "Dr. Who");
        assert_eq!(traits, vec!["tired beyond measure".to_string()]);
    }

    #[test]
    fn test_key_events() {
        let text = "It rained. They finally decided to leave the valley behind them. \
                    She discovered a narrow path behind the old mill wheel. Nothing else happened.";
        let events = extract_key_events(text);
        assert_eq!(events.len(), 2);
        assert!(events[0].contains("decided"));
        assert!(events[1].contains("discovered"));
    }

    #[test]
    fn test_key_events_short_sentences_ignored() {
        // Contains a keyword but is 6 words or fewer.
        let events = extract_key_events("They decided to go home now.");
        assert!(events.is_empty());
    }

    #[test]
    fn test_key_events_capped_at_three() {
        let text = "Aria decided to walk the long road north alone. \
                    Aria found a rusted key in the river mud there. \
                    Aria learned the old song from the ferry captain himself. \
                    Aria promised to return before the first winter snow fell.";
        let events = extract_key_events(text);
        assert_eq!(events.len(), 3);
    }
}
