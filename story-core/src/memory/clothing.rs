//! Clothing-state tracking for roleplay mode.
//!
//! A fixed synonym table maps garment words onto wardrobe slots; surface
//! patterns over the generated text detect a character putting on, taking
//! off, or adjusting garments. Slot updates are last-write-wins; every
//! detected change is appended to a history log with the verb that caused
//! it.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Wardrobe slot. Garment words outside the synonym table land in
/// `Accessories`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Slot {
    Shirt,
    Pants,
    Dress,
    Bra,
    Panties,
    Accessories,
}

impl Slot {
    /// Get the display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Shirt => "shirt",
            Slot::Pants => "pants",
            Slot::Dress => "dress",
            Slot::Bra => "bra",
            Slot::Panties => "panties",
            Slot::Accessories => "accessories",
        }
    }

    /// Map a garment word onto its slot.
    pub fn for_garment(word: &str) -> Slot {
        match word.to_lowercase().as_str() {
            "shirt" | "blouse" | "t-shirt" | "sweater" | "jersey" | "top" | "sweatshirt" => {
                Slot::Shirt
            }
            "pants" | "trousers" | "jeans" | "leggings" | "slacks" | "breeches" | "shorts" => {
                Slot::Pants
            }
            "dress" | "gown" | "robe" | "frock" | "garment" | "outfit" => Slot::Dress,
            "bra" | "brassiere" | "bandeau" => Slot::Bra,
            "panties" | "briefs" | "undies" | "lingerie" | "undergarment" => Slot::Panties,
            _ => Slot::Accessories,
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded wardrobe change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClothingEvent {
    /// The garment description as it was tracked.
    pub item: String,
    /// Normalized verb, e.g. `took_off`, `put_on`, `adjusted`.
    pub action: String,
    /// Excerpt of the text that triggered the change.
    pub context: String,
}

/// A detected clothing change, not yet applied to any state.
#[derive(Debug, Clone, PartialEq)]
pub enum ClothingSignal {
    /// A garment was taken off; clears the slot.
    Removed { slot: Slot, item: String, verb: String },
    /// A garment was put on; sets the slot.
    Worn { slot: Slot, item: String, verb: String },
    /// A garment was handled without being put on or taken off; history
    /// only.
    Adjusted { slot: Slot, item: String, verb: String },
    /// A garment was described with no explicit action; fills the slot if
    /// vacant.
    Seen { slot: Slot, item: String },
}

/// Current wardrobe plus change history for one character.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClothingState {
    slots: BTreeMap<Slot, String>,
    history: Vec<ClothingEvent>,
}

impl ClothingState {
    /// Current item in a slot.
    pub fn current(&self, slot: Slot) -> Option<&str> {
        self.slots.get(&slot).map(String::as_str)
    }

    /// All occupied slots.
    pub fn slots(&self) -> impl Iterator<Item = (Slot, &str)> {
        self.slots.iter().map(|(slot, item)| (*slot, item.as_str()))
    }

    /// The change history, oldest first.
    pub fn history(&self) -> &[ClothingEvent] {
        &self.history
    }

    /// Apply a detected signal. `context` is the excerpt logged alongside
    /// slot changes.
    pub fn apply(&mut self, signal: ClothingSignal, context: &str) {
        match signal {
            ClothingSignal::Removed { slot, verb, .. } => {
                // Only garments we know are worn can come off.
                if let Some(removed) = self.slots.remove(&slot) {
                    self.history.push(ClothingEvent {
                        item: removed,
                        action: verb,
                        context: context.to_string(),
                    });
                }
            }
            ClothingSignal::Worn { slot, item, verb } => {
                self.slots.insert(slot, item.clone());
                self.history.push(ClothingEvent {
                    item,
                    action: verb,
                    context: context.to_string(),
                });
            }
            ClothingSignal::Adjusted { slot, verb, .. } => {
                if let Some(current) = self.slots.get(&slot) {
                    self.history.push(ClothingEvent {
                        item: current.clone(),
                        action: verb,
                        context: context.to_string(),
                    });
                }
            }
            ClothingSignal::Seen { slot, item } => {
                self.slots.entry(slot).or_insert(item);
            }
        }
    }
}

/// Alternation over every known garment word. Longer synonyms come before
/// their substrings so "t-shirt" is not read as "shirt".
const GARMENT_WORDS: &str = "t-shirt|sweatshirt|shirt|blouse|sweater|jersey|top\
    |pants|trousers|jeans|leggings|slacks|breeches|shorts\
    |dress|gown|robe|frock|garment|outfit\
    |bra|brassiere|bandeau\
    |panties|briefs|undies|lingerie|undergarment";

const REMOVAL_VERBS: &str = "took off|removed|ripped|dropped|took out|snapped out of";

const WEARING_VERBS: &str = "put on|wore|changed into|wearing|slipped into";

const ADJUSTMENT_VERBS: &str =
    "snapped|tore|ripped|broke|fastened|adjusted|tightened|loosened|opened|closed";

/// Detect clothing changes for `character_name` in `text`.
///
/// Pure: returns signals in processing order (removals, then wear events,
/// then adjustments, then passive descriptions) without touching any
/// state.
pub fn observe_clothing(text: &str, character_name: &str) -> Vec<ClothingSignal> {
    let name = regex::escape(character_name);
    let mut signals = Vec::new();

    let removal = Regex::new(&format!(
        r"(?i){name}\s+.*?\b({verbs})\s+(?:his|her|their)?\s*((?:[\w-]+\s+)?)({GARMENT_WORDS})\b",
        verbs = REMOVAL_VERBS,
    ));
    if let Ok(re) = removal {
        for captures in re.captures_iter(text) {
            let verb = captures[1].to_lowercase().replace(' ', "_");
            let item = format!("{}{}", &captures[2], &captures[3])
                .trim()
                .to_string();
            signals.push(ClothingSignal::Removed {
                slot: Slot::for_garment(&captures[3]),
                item,
                verb,
            });
        }
    }

    let wearing = Regex::new(&format!(
        r"(?i){name}\s+.*?\b({verbs})\s+(?:a\s+|his\s+|her\s+|their\s+)?((?:[\w-]+\s+)?)({GARMENT_WORDS})\b",
        verbs = WEARING_VERBS,
    ));
    if let Ok(re) = wearing {
        for captures in re.captures_iter(text) {
            let verb = captures[1].to_lowercase().replace(' ', "_");
            let item = format!("{}{}", &captures[2], &captures[3])
                .trim()
                .to_string();
            signals.push(ClothingSignal::Worn {
                slot: Slot::for_garment(&captures[3]),
                item,
                verb,
            });
        }
    }

    let adjustment = Regex::new(&format!(
        r"(?i){name}'s\s+((?:[\w-]+\s+)?)({GARMENT_WORDS})\s+({verbs})\b",
        verbs = ADJUSTMENT_VERBS,
    ));
    if let Ok(re) = adjustment {
        for captures in re.captures_iter(text) {
            signals.push(ClothingSignal::Adjusted {
                slot: Slot::for_garment(&captures[2]),
                item: format!("{}{}", &captures[1], &captures[2]).trim().to_string(),
                verb: captures[3].to_lowercase(),
            });
        }
    }

    let described = Regex::new(&format!(
        r"(?i){name}(?:\s+(?:was\s+)?wearing\s+(?:a\s+)?|'s\s+|\s+had\s+on\s+(?:a\s+)?)((?:[\w-]+\s+){{0,2}})({GARMENT_WORDS})\b",
    ));
    if let Ok(re) = described {
        for captures in re.captures_iter(text) {
            signals.push(ClothingSignal::Seen {
                slot: Slot::for_garment(&captures[2]),
                item: format!("{}{}", &captures[1], &captures[2]).trim().to_string(),
            });
        }
    }

    signals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garment_slot_mapping() {
        assert_eq!(Slot::for_garment("blouse"), Slot::Shirt);
        assert_eq!(Slot::for_garment("Jeans"), Slot::Pants);
        assert_eq!(Slot::for_garment("gown"), Slot::Dress);
        assert_eq!(Slot::for_garment("brassiere"), Slot::Bra);
        assert_eq!(Slot::for_garment("lingerie"), Slot::Panties);
        // Unknown garments fall into the catch-all.
        assert_eq!(Slot::for_garment("scarf"), Slot::Accessories);
    }

    #[test]
    fn test_wearing_sets_slot() {
        let signals = observe_clothing("Mira slipped into a red dress for dinner.", "Mira");
        assert!(signals.contains(&ClothingSignal::Worn {
            slot: Slot::Dress,
            item: "red dress".to_string(),
            verb: "slipped_into".to_string(),
        }));
    }

    #[test]
    fn test_removal_then_wear_is_last_write_wins() {
        let mut state = ClothingState::default();

        for signal in observe_clothing("Mira was wearing a red dress tonight.", "Mira") {
            state.apply(signal, "turn 1");
        }
        assert_eq!(state.current(Slot::Dress), Some("red dress"));

        for signal in observe_clothing("Mira slowly took off her dress.", "Mira") {
            state.apply(signal, "turn 2");
        }
        assert_eq!(state.current(Slot::Dress), None);

        let removals: Vec<_> = state
            .history()
            .iter()
            .filter(|e| e.action == "took_off")
            .collect();
        assert_eq!(removals.len(), 1);
        assert_eq!(removals[0].item, "red dress");
    }

    #[test]
    fn test_removal_without_known_garment_is_ignored() {
        let mut state = ClothingState::default();
        for signal in observe_clothing("Mira suddenly took off her jacket.", "Mira") {
            state.apply(signal, "turn 1");
        }
        // "jacket" is not in the synonym table and nothing was tracked.
        assert!(state.history().is_empty());
    }

    #[test]
    fn test_adjustment_keeps_slot() {
        let mut state = ClothingState::default();
        for signal in observe_clothing("Anna put on a silk blouse.", "Anna") {
            state.apply(signal, "turn 1");
        }
        for signal in observe_clothing("Anna's blouse tightened as she turned.", "Anna") {
            state.apply(signal, "turn 2");
        }

        assert_eq!(state.current(Slot::Shirt), Some("silk blouse"));
        let last = state.history().last().unwrap();
        assert_eq!(last.action, "tightened");
        assert_eq!(last.item, "silk blouse");
    }

    #[test]
    fn test_passive_description_fills_vacant_slot_only() {
        let mut state = ClothingState::default();
        for signal in observe_clothing("Eve was wearing faded jeans.", "Eve") {
            state.apply(signal, "turn 1");
        }
        assert_eq!(state.current(Slot::Pants), Some("faded jeans"));

        // A later passive mention must not overwrite an occupied slot.
        for signal in observe_clothing("Eve had on old trousers.", "Eve") {
            state.apply(signal, "turn 2");
        }
        assert_eq!(state.current(Slot::Pants), Some("faded jeans"));
    }

    #[test]
    fn test_t_shirt_is_not_read_as_shirt() {
        let signals = observe_clothing("Kai wore a black t-shirt.", "Kai");
        assert!(signals.iter().any(|s| matches!(
            s,
            ClothingSignal::Worn { item, .. } if item == "black t-shirt"
        )));
    }
}
