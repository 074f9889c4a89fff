//! Scene configuration.
//!
//! Every request may carry a JSON object of scene overrides in its third
//! field. The host backends that drive these processes have drifted over
//! time and send several spellings for the same keys, so the canonical
//! names carry aliases. Decoding and defaulting happen once, here; the
//! rest of the crate only ever sees a fully populated `SceneConfig`.

use serde::Deserialize;

/// Which flavor of generator is running.
///
/// The two modes share the protocol and memory machinery but differ in
/// prompt templates, extraction vocabularies, and defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Chaptered narrative fiction.
    Story,
    /// First-person character roleplay.
    Roleplay,
}

impl Mode {
    /// Get the display name.
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Story => "story",
            Mode::Roleplay => "roleplay",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors from decoding a configuration payload.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Scene descriptors for one request, fully defaulted.
///
/// Constructed fresh from each inbound command's configuration payload;
/// never persisted between commands.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    /// The character the user plays.
    pub user_character: String,
    /// The character the model plays (or the second lead, in story mode).
    pub ai_character: String,
    /// Free-text scenario or background.
    pub scenario: String,
    pub genre: String,
    /// Narrative perspective, e.g. "third person".
    pub perspective: String,
    /// Relationship or situation descriptor.
    pub relationship: String,
    /// Excerpt of the story so far, for story-mode continuations.
    pub current_story: String,
}

/// Raw payload as the host sends it. All fields optional; unknown keys
/// ignored.
#[derive(Debug, Default, Deserialize)]
struct RawSceneConfig {
    #[serde(rename = "userCharacter", alias = "char1", alias = "firstCharacter")]
    user_character: Option<String>,
    #[serde(rename = "aiCharacter", alias = "char2", alias = "secondCharacter")]
    ai_character: Option<String>,
    #[serde(alias = "situation", alias = "background")]
    scenario: Option<String>,
    genre: Option<String>,
    perspective: Option<String>,
    relationship: Option<String>,
    current_story: Option<String>,
}

impl SceneConfig {
    /// Default configuration for the given mode.
    pub fn defaults(mode: Mode) -> Self {
        match mode {
            Mode::Story => Self {
                user_character: "Character 1".to_string(),
                ai_character: "Character 2".to_string(),
                scenario: "an exciting adventure begins".to_string(),
                genre: "fantasy".to_string(),
                perspective: "third person".to_string(),
                relationship: "strangers meeting".to_string(),
                current_story: String::new(),
            },
            Mode::Roleplay => Self {
                user_character: "You".to_string(),
                ai_character: "AI Partner".to_string(),
                scenario: "A conversation between two people".to_string(),
                genre: "romance".to_string(),
                perspective: "second person".to_string(),
                relationship: "strangers meeting".to_string(),
                current_story: String::new(),
            },
        }
    }

    /// Decode a configuration payload, falling back to mode defaults for
    /// absent keys.
    ///
    /// An empty payload (or the literal `{}`) is valid and yields all
    /// defaults. A malformed payload is an error the caller reports back
    /// through the response channel.
    pub fn parse(mode: Mode, config_json: &str) -> Result<Self, ConfigError> {
        let mut config = Self::defaults(mode);

        let trimmed = config_json.trim();
        if trimmed.is_empty() || trimmed == "{}" {
            return Ok(config);
        }

        let raw: RawSceneConfig = serde_json::from_str(trimmed)?;

        if let Some(value) = raw.user_character {
            config.user_character = value;
        }
        if let Some(value) = raw.ai_character {
            config.ai_character = value;
        }
        if let Some(value) = raw.scenario {
            config.scenario = value;
        }
        if let Some(value) = raw.genre {
            config.genre = value;
        }
        if let Some(value) = raw.perspective {
            config.perspective = value;
        }
        if let Some(value) = raw.relationship {
            config.relationship = value;
        }
        if let Some(value) = raw.current_story {
            config.current_story = value;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload_yields_defaults() {
        let config = SceneConfig::parse(Mode::Roleplay, "{}").unwrap();
        assert_eq!(config, SceneConfig::defaults(Mode::Roleplay));
        assert_eq!(config.ai_character, "AI Partner");

        let config = SceneConfig::parse(Mode::Story, "").unwrap();
        assert_eq!(config.genre, "fantasy");
        assert_eq!(config.perspective, "third person");
    }

    #[test]
    fn test_overrides() {
        let json = r#"{"aiCharacter": "Mira", "genre": "noir", "relationship": "old rivals"}"#;
        let config = SceneConfig::parse(Mode::Roleplay, json).unwrap();

        assert_eq!(config.ai_character, "Mira");
        assert_eq!(config.genre, "noir");
        assert_eq!(config.relationship, "old rivals");
        // Untouched keys keep their defaults.
        assert_eq!(config.user_character, "You");
    }

    #[test]
    fn test_legacy_key_aliases() {
        let json = r#"{"char1": "Anna", "secondCharacter": "Brook", "situation": "a locked room"}"#;
        let config = SceneConfig::parse(Mode::Story, json).unwrap();

        assert_eq!(config.user_character, "Anna");
        assert_eq!(config.ai_character, "Brook");
        assert_eq!(config.scenario, "a locked room");
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let json = r#"{"genre": "mystery", "somethingElse": 42}"#;
        let config = SceneConfig::parse(Mode::Story, json).unwrap();
        assert_eq!(config.genre, "mystery");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let result = SceneConfig::parse(Mode::Story, "{not json");
        assert!(result.is_err());
    }
}
