//! Command dispatch and turn processing.
//!
//! The `Generator` owns the completion backend and the memory for one
//! conversation. Every error below startup is recoverable: it is rendered
//! into the response text so the host always receives a well-formed,
//! sentinel-terminated block.

use crate::backend::{self, BackendError, CompletionBackend, GenerationOptions};
use crate::config::{ConfigError, Mode, SceneConfig};
use crate::memory::heuristics::{
    detect_cup_size, detect_emotion, extract_character_names, extract_key_events, extract_traits,
    score_relationship,
};
use crate::memory::{clothing::observe_clothing, truncate, MemoryState};
use crate::prompt::build_prompt;
use tracing::{debug, info, warn};

/// Token budget for a story continuation (openings get the full story
/// budget).
const STORY_CONTINUATION_MAX_TOKENS: usize = 450;

/// The commands the wire protocol understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start fresh: clear memory, then generate an opening.
    Generate,
    /// Extend the current conversation.
    Continue,
    /// Reset memory and confirm.
    ClearMemory,
}

impl Command {
    /// Parse a wire-protocol command name.
    pub fn parse(name: &str) -> Option<Command> {
        match name {
            "GENERATE" => Some(Command::Generate),
            "CONTINUE" => Some(Command::Continue),
            "CLEAR_MEMORY" => Some(Command::ClearMemory),
            _ => None,
        }
    }
}

/// Errors from processing one command. All of them are reported through
/// the response channel, never as a process failure.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Generation error: {0}")]
    Backend(#[from] BackendError),
}

/// Services generation commands for a single conversation.
pub struct Generator {
    backend: Box<dyn CompletionBackend>,
    memory: MemoryState,
    mode: Mode,
}

impl Generator {
    /// Create a generator with an empty memory.
    pub fn new(mode: Mode, backend: Box<dyn CompletionBackend>) -> Self {
        Self {
            backend,
            memory: MemoryState::new(),
            mode,
        }
    }

    /// The generator's mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The accumulated memory, for inspection.
    pub fn memory(&self) -> &MemoryState {
        &self.memory
    }

    /// Verify the backend responds before the process signals readiness.
    pub async fn smoke_test(&self) -> Result<String, BackendError> {
        backend::smoke_test(self.backend.as_ref()).await
    }

    /// Process one command. Always returns response text; failures travel
    /// in-band.
    pub async fn process(&mut self, command: &str, data: &str, config_json: &str) -> String {
        debug!(command, "processing command");
        match self.dispatch(command, data, config_json).await {
            Ok(text) => text,
            Err(err) => {
                warn!(command, "command failed: {err}");
                err.to_string()
            }
        }
    }

    async fn dispatch(
        &mut self,
        command: &str,
        data: &str,
        config_json: &str,
    ) -> Result<String, GeneratorError> {
        let config = SceneConfig::parse(self.mode, config_json)?;

        match Command::parse(command) {
            Some(Command::Generate) => {
                self.memory.clear();
                self.run_turn(data, &config, false).await
            }
            Some(Command::Continue) => self.run_turn(data, &config, true).await,
            Some(Command::ClearMemory) => {
                self.memory.clear();
                info!("memory cleared for new scenario");
                Ok(match self.mode {
                    Mode::Story => "Memory cleared successfully",
                    Mode::Roleplay => "Roleplay memory cleared successfully",
                }
                .to_string())
            }
            None => Ok(format!("Unknown command: {command}")),
        }
    }

    async fn run_turn(
        &mut self,
        data: &str,
        config: &SceneConfig,
        continuation: bool,
    ) -> Result<String, GeneratorError> {
        let prompt = build_prompt(self.mode, config, data, &self.memory, continuation);
        debug!(chars = prompt.len(), continuation, "prompt built");

        let text = self.backend.complete(&prompt, &self.turn_options(continuation)).await?;
        self.absorb_turn(data, &text, config);
        Ok(text)
    }

    fn turn_options(&self, continuation: bool) -> GenerationOptions {
        let options = GenerationOptions::for_mode(self.mode);
        match (self.mode, continuation) {
            (Mode::Story, true) => options.with_max_tokens(STORY_CONTINUATION_MAX_TOKENS),
            _ => options,
        }
    }

    /// Fold a completed exchange into memory.
    ///
    /// Extraction is pure (see [`crate::memory::heuristics`]); this is the
    /// single place the results are applied. A heuristic that finds
    /// nothing simply leaves its slice of the state untouched.
    fn absorb_turn(&mut self, input: &str, output: &str, config: &SceneConfig) {
        self.memory.record_exchange(input, output);

        let emotion = detect_emotion(self.mode, output);
        let cup_size = detect_cup_size(output);

        match self.mode {
            Mode::Roleplay => {
                // The AI character accumulates emotional and wardrobe
                // state; other detected names only get sighting counts.
                let signals = observe_clothing(output, &config.ai_character);
                let excerpt = format!("{}...", truncate(output, 100));

                let record = self.memory.observe_character(&config.ai_character, output);
                if let Some(emotion) = emotion {
                    record.emotion = Some(emotion);
                }
                if let Some(cup_size) = cup_size {
                    record.cup_size = Some(cup_size);
                }
                for signal in signals {
                    record.clothing.apply(signal, &excerpt);
                }

                for name in extract_character_names(output) {
                    if name != config.ai_character {
                        self.memory.observe_character(&name, output);
                    }
                }
            }
            Mode::Story => {
                for name in extract_character_names(output) {
                    let traits = extract_traits(output, &name);
                    let record = self.memory.observe_character(&name, output);
                    for item in traits {
                        if !record.traits.contains(&item) {
                            record.traits.push(item);
                        }
                    }
                    if let Some(ref emotion) = emotion {
                        record.emotion = Some(emotion.clone());
                    }
                    if let Some(ref cup_size) = cup_size {
                        record.cup_size = Some(cup_size.clone());
                    }
                }
            }
        }

        let combined = format!("{output} {input}");
        self.memory.set_relationship(score_relationship(&combined));

        self.memory.note_events(extract_key_events(output));
        if self.mode == Mode::Story {
            self.memory.update_summary();
        }
        self.memory.note_interaction(input, output);

        debug!(
            exchanges = self.memory.exchange_count(),
            characters = self.memory.characters().len(),
            events = self.memory.key_events().len(),
            "memory updated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingBackend, MockBackend};

    fn roleplay_generator(responses: Vec<&str>) -> (Generator, MockBackend) {
        let mock = MockBackend::new(responses);
        let generator = Generator::new(Mode::Roleplay, Box::new(mock.clone()));
        (generator, mock)
    }

    #[tokio::test]
    async fn test_generate_returns_completion() {
        let (mut generator, _mock) = roleplay_generator(vec!["She nodded slowly."]);
        let response = generator.process("GENERATE", "hello", "{}").await;
        assert_eq!(response, "She nodded slowly.");
        assert_eq!(generator.memory().exchange_count(), 1);
    }

    #[tokio::test]
    async fn test_generate_clears_prior_state() {
        let (mut generator, _mock) =
            roleplay_generator(vec!["First scene.", "Second scene."]);

        generator.process("GENERATE", "begin", "{}").await;
        generator.process("GENERATE", "start over", "{}").await;

        // Only the second conversation's exchange survives.
        assert_eq!(generator.memory().exchange_count(), 1);
        assert_eq!(generator.memory().exchanges()[0].input, "start over");
    }

    #[tokio::test]
    async fn test_continue_accumulates_history() {
        let (mut generator, _mock) = roleplay_generator(vec!["one", "two", "three"]);

        generator.process("GENERATE", "begin", "{}").await;
        generator.process("CONTINUE", "and then", "{}").await;
        generator.process("CONTINUE", "and after that", "{}").await;

        assert_eq!(generator.memory().exchange_count(), 3);
    }

    #[tokio::test]
    async fn test_clear_memory_confirmation_per_mode() {
        let (mut generator, _mock) = roleplay_generator(vec![]);
        assert_eq!(
            generator.process("CLEAR_MEMORY", "", "{}").await,
            "Roleplay memory cleared successfully"
        );

        let mut story = Generator::new(Mode::Story, Box::new(MockBackend::default()));
        assert_eq!(
            story.process("CLEAR_MEMORY", "", "{}").await,
            "Memory cleared successfully"
        );
    }

    #[tokio::test]
    async fn test_unknown_command_leaves_state_untouched() {
        let (mut generator, mock) = roleplay_generator(vec!["scene"]);
        generator.process("GENERATE", "begin", "{}").await;

        let response = generator.process("DESTROY", "", "{}").await;
        assert_eq!(response, "Unknown command: DESTROY");
        assert_eq!(generator.memory().exchange_count(), 1);
        // No extra model call was made.
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_config_reported_in_band() {
        let (mut generator, mock) = roleplay_generator(vec!["scene"]);
        let response = generator.process("GENERATE", "begin", "{broken").await;

        assert!(response.starts_with("JSON error:"), "got: {response}");
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_reported_in_band() {
        let mut generator = Generator::new(Mode::Story, Box::new(FailingBackend));
        let response = generator.process("GENERATE", "begin", "{}").await;

        assert!(response.starts_with("Generation error:"), "got: {response}");
        assert!(response.contains("scripted failure"));
    }

    #[tokio::test]
    async fn test_roleplay_turn_updates_character_state() {
        let (mut generator, _mock) = roleplay_generator(vec![
            "Mira blushed and slipped into a red dress before answering.",
        ]);
        let config = r#"{"aiCharacter": "Mira"}"#;
        generator.process("GENERATE", "hello", config).await;

        let record = generator.memory().character("Mira").unwrap();
        assert_eq!(record.emotion.as_deref(), Some("blushed"));
        assert_eq!(
            record.clothing.current(crate::memory::clothing::Slot::Dress),
            Some("red dress")
        );
    }

    #[tokio::test]
    async fn test_story_turn_registers_characters_and_events() {
        let mock = MockBackend::new(vec![
            "Mira was pale and visibly shaking. Mira decided to cross the old rope bridge.",
        ]);
        let mut generator = Generator::new(Mode::Story, Box::new(mock));
        generator.process("GENERATE", "begin", "{}").await;

        let record = generator.memory().character("Mira").unwrap();
        assert!(record.traits.contains(&"pale and visibly shaking".to_string()));
        assert_eq!(generator.memory().key_events().len(), 1);
        assert!(!generator.memory().summary().is_empty());
    }

    #[tokio::test]
    async fn test_relationship_recomputed_each_turn() {
        let (mut generator, _mock) = roleplay_generator(vec![
            "She gave a warm smile, so happy and sweet and kind.",
            "The door was shut.",
        ]);

        generator.process("GENERATE", "I love you", "{}").await;
        assert_eq!(
            generator.memory().relationship().map(|l| l.as_str()),
            Some("warming up, becoming closer")
        );

        // The next turn replaces, not blends.
        generator.process("CONTINUE", "fine", "{}").await;
        assert_eq!(
            generator.memory().relationship().map(|l| l.as_str()),
            Some("stable, maintaining current dynamic")
        );
    }
}
