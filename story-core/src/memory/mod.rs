//! Derived conversation memory.
//!
//! Holds everything one conversation accumulates across turns: a sliding
//! window of exchanges, per-character accumulator records, extracted plot
//! events, the relationship-progression label, and a snapshot of the last
//! interaction. The generator owns exactly one `MemoryState`; the session
//! loop never sees it.

pub mod clothing;
pub mod heuristics;

use crate::config::Mode;
use chrono::{DateTime, Utc};
use clothing::ClothingState;
use heuristics::RelationshipLabel;
use serde::{Deserialize, Serialize};

/// Maximum number of recent exchanges kept in full detail.
pub const MAX_RECENT_EXCHANGES: usize = 10;

/// Characters rendered into a story context block.
const MAX_CONTEXT_CHARACTERS: usize = 4;

/// Exchanges rendered into a roleplay context block.
const MAX_CONTEXT_EXCHANGES: usize = 5;

/// Plot events rendered into a story context block.
const MAX_CONTEXT_EVENTS: usize = 3;

/// Cap on the rolling story summary, in characters.
const MAX_SUMMARY_CHARS: usize = 500;

/// One stored input/output exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    pub input: String,
    pub output: String,
    pub timestamp: DateTime<Utc>,
}

/// Accumulated knowledge about one character.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacterRecord {
    /// Primary name, exactly as first detected.
    pub name: String,
    /// How many turns have mentioned this character.
    pub mentions: u32,
    /// Excerpt of the text this character was last seen in.
    pub last_seen: String,
    /// Descriptive clauses collected over time.
    pub traits: Vec<String>,
    /// Last detected emotional state.
    pub emotion: Option<String>,
    /// Last detected cup-size mention.
    pub cup_size: Option<String>,
    /// Wardrobe state (roleplay mode only).
    pub clothing: ClothingState,
}

/// Turn-spanning derived memory for a single conversation.
///
/// Cleared atomically on `CLEAR_MEMORY` or at the start of a new
/// generation; there is no partial clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryState {
    exchanges: Vec<Exchange>,
    characters: Vec<CharacterRecord>,
    key_events: Vec<String>,
    relationship: Option<RelationshipLabel>,
    last_interaction: String,
    summary: String,
}

impl MemoryState {
    /// Create an empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one exchange, evicting the oldest beyond the window.
    pub fn record_exchange(&mut self, input: &str, output: &str) {
        self.exchanges.push(Exchange {
            input: input.to_string(),
            output: output.to_string(),
            timestamp: Utc::now(),
        });
        while self.exchanges.len() > MAX_RECENT_EXCHANGES {
            self.exchanges.remove(0);
        }
    }

    /// Number of stored exchanges.
    pub fn exchange_count(&self) -> usize {
        self.exchanges.len()
    }

    /// The stored exchanges, oldest first.
    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Look up a character by exact name.
    pub fn character(&self, name: &str) -> Option<&CharacterRecord> {
        self.characters.iter().find(|c| c.name == name)
    }

    /// All tracked characters, in first-seen order.
    pub fn characters(&self) -> &[CharacterRecord] {
        &self.characters
    }

    /// Record a sighting of a character, creating the record on first
    /// mention. Bumps the mention count and refreshes the last-seen
    /// excerpt.
    pub fn observe_character(&mut self, name: &str, excerpt: &str) -> &mut CharacterRecord {
        let index = match self.characters.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.characters.push(CharacterRecord {
                    name: name.to_string(),
                    ..CharacterRecord::default()
                });
                self.characters.len() - 1
            }
        };

        let record = &mut self.characters[index];
        record.mentions += 1;
        record.last_seen = truncate(excerpt, 250).to_string();
        record
    }

    /// Append plot events, skipping exact duplicates.
    pub fn note_events(&mut self, events: Vec<String>) {
        for event in events {
            if !event.is_empty() && !self.key_events.contains(&event) {
                self.key_events.push(event);
            }
        }
    }

    /// The plot-event list, oldest first.
    pub fn key_events(&self) -> &[String] {
        &self.key_events
    }

    /// Replace the relationship-progression label.
    pub fn set_relationship(&mut self, label: RelationshipLabel) {
        self.relationship = Some(label);
    }

    /// The current relationship label, if any turn has been scored.
    pub fn relationship(&self) -> Option<RelationshipLabel> {
        self.relationship
    }

    /// Snapshot the most recent exchange for continuation prompts.
    pub fn note_interaction(&mut self, input: &str, output: &str) {
        self.last_interaction = format!("User: {} | AI: {}...", input, truncate(output, 100));
    }

    /// Truncated snapshot of the most recent exchange.
    pub fn last_interaction(&self) -> &str {
        &self.last_interaction
    }

    /// Fold the latest key events into the rolling story summary.
    pub fn update_summary(&mut self) {
        if self.summary.chars().count() >= MAX_SUMMARY_CHARS {
            return;
        }
        let tail_start = self.key_events.len().saturating_sub(MAX_CONTEXT_EVENTS);
        let key_points = self.key_events[tail_start..].join(" ");
        let combined = format!("{} {}", self.summary, key_points);
        self.summary = truncate(combined.trim(), MAX_SUMMARY_CHARS).to_string();
    }

    /// The rolling story summary.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Discard everything. Atomic: there is no partial clear.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Render the memory-context block embedded in continuation prompts.
    pub fn render_context(&self, mode: Mode) -> String {
        match mode {
            Mode::Roleplay => self.render_roleplay_context(),
            Mode::Story => self.render_story_context(),
        }
    }

    fn render_roleplay_context(&self) -> String {
        if self.exchanges.is_empty() {
            return "CONTEXT: Beginning new roleplay scenario.".to_string();
        }

        let mut context = String::from("CONVERSATION HISTORY (recent):\n");
        let tail_start = self.exchanges.len().saturating_sub(MAX_CONTEXT_EXCHANGES);
        for exchange in &self.exchanges[tail_start..] {
            context.push_str(&format!(
                "{}... → {}...\n",
                truncate(&exchange.input, 50),
                truncate(&exchange.output, 50)
            ));
        }

        if let Some(label) = self.relationship {
            context.push_str(&format!("\nRELATIONSHIP STATUS: {label}\n"));
        }

        context
    }

    fn render_story_context(&self) -> String {
        if self.characters.is_empty() {
            return "CONTEXT: Beginning a new story.".to_string();
        }

        let mut context = String::from("CHARACTER CONTEXT:\n");
        for record in self.characters.iter().take(MAX_CONTEXT_CHARACTERS) {
            context.push_str(&format!(
                "- {}: mentioned {} times",
                record.name, record.mentions
            ));
            if !record.traits.is_empty() {
                let traits: Vec<&str> =
                    record.traits.iter().take(2).map(String::as_str).collect();
                context.push_str(&format!(", traits: {}", traits.join(", ")));
            }
            if let Some(ref cup) = record.cup_size {
                context.push_str(&format!(", cup size: {cup}"));
            }
            if let Some(ref emotion) = record.emotion {
                context.push_str(&format!(", emotional state: {emotion}"));
            }
            context.push('\n');
        }

        if !self.key_events.is_empty() {
            context.push_str("\nRECENT PLOT DEVELOPMENTS:\n");
            let tail_start = self.key_events.len().saturating_sub(MAX_CONTEXT_EVENTS);
            for event in &self.key_events[tail_start..] {
                context.push_str(&format!("- {event}\n"));
            }
        }

        if !self.summary.is_empty() {
            context.push_str(&format!("\nSTORY SUMMARY: {}\n", self.summary));
        }

        context
    }
}

/// Truncate to at most `max_chars` characters, respecting UTF-8
/// boundaries.
pub(crate) fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
