//! Prompt construction.
//!
//! Deterministic string templates over the scene configuration and the
//! rendered memory context, wrapped in Gemma-style turn delimiters. The
//! stop sequences in [`crate::backend::GenerationOptions`] correspond to
//! these delimiters.
//!
//! Caller-supplied fields are embedded verbatim: a host that places turn
//! tokens inside a character name can break out of its template slot. The
//! host process is trusted; this is a documented property of the wire
//! protocol, not something this layer defends against.

use crate::config::{Mode, SceneConfig};
use crate::memory::{truncate, MemoryState};

/// How much of the story-so-far excerpt survives into the prompt.
const MAX_STORY_EXCERPT_CHARS: usize = 1200;

/// How much of the last-interaction snapshot survives into the prompt.
const MAX_INTERACTION_CHARS: usize = 200;

/// Build the prompt for one generation request.
pub fn build_prompt(
    mode: Mode,
    config: &SceneConfig,
    user_input: &str,
    memory: &MemoryState,
    continuation: bool,
) -> String {
    match (mode, continuation) {
        (Mode::Story, false) => story_opening(config, user_input),
        (Mode::Story, true) => story_continuation(config, user_input, memory),
        (Mode::Roleplay, false) => roleplay_opening(config, user_input),
        (Mode::Roleplay, true) => roleplay_continuation(config, user_input, memory),
    }
}

/// Shared authorial directives for roleplay prompts.
const ROLEPLAY_STYLE: &str = "\
WRITING:
- Give your character a realistic range of emotions and behaviors, including internal struggles
- Use inner monologue in italics to reveal unvoiced thoughts and hesitations
- Let doubts and secret wishes simmer beneath the surface
- Do not rush to conclude a plot or resolve conflicts too quickly; let the conversation unfold gradually over multiple messages
- Write intimate moments with sensory, embodied detail fitting the genre";

fn story_opening(config: &SceneConfig, user_input: &str) -> String {
    // The opening user turn doubles as the initial situation when present.
    let situation = if user_input.trim().is_empty() {
        config.scenario.as_str()
    } else {
        user_input
    };

    format!(
        "<start_of_turn>system
You are a skilled storyteller. Write the FIRST CHAPTER of a {genre} story.

INITIAL SITUATION: {situation}

MAIN CHARACTERS:
- {first}
- {second}

WRITING STYLE:
- Use {perspective} perspective
- Write in a style fitting for {genre}
- Introduce an engaging conflict or mystery
- Create vivid descriptions and natural dialogue
- Length: approximately 400-500 words

Respond only with the story text, no commentary or metadata.<end_of_turn>

<start_of_turn>user
Begin the story now<end_of_turn>
<start_of_turn>model
",
        genre = config.genre,
        situation = situation,
        first = config.user_character,
        second = config.ai_character,
        perspective = config.perspective,
    )
}

fn story_continuation(config: &SceneConfig, user_input: &str, memory: &MemoryState) -> String {
    let memory_context = memory.render_context(Mode::Story);

    let story_so_far = if config.current_story.is_empty() {
        String::new()
    } else {
        format!(
            "STORY SO FAR (last part): {}...\n\n",
            truncate(&config.current_story, MAX_STORY_EXCERPT_CHARS)
        )
    };

    format!(
        "<start_of_turn>system
You are continuing a {genre} story. Maintain perfect consistency.

CHARACTERS:
- {first}
- {second}

PERSPECTIVE: {perspective}

{memory_context}

{story_so_far}INSTRUCTIONS:
- Continue naturally based on: {user_input}
- Maintain perfect consistency with established characters, events, and tone
- Develop the plot forward in a compelling way
- Include descriptive elements and natural dialogue
- Length: 400-500 words
- Respond only with the next narrative segment<end_of_turn>

<start_of_turn>user
{user_input}<end_of_turn>
<start_of_turn>model
",
        genre = config.genre,
        first = config.user_character,
        second = config.ai_character,
        perspective = config.perspective,
        memory_context = memory_context,
        story_so_far = story_so_far,
        user_input = user_input,
    )
}

fn roleplay_opening(config: &SceneConfig, user_input: &str) -> String {
    format!(
        "<start_of_turn>system
You are: {ai}

SCENARIO: {scenario}
RELATIONSHIP: {relationship}
GENRE: {genre}

YOUR CHARACTER TRAITS:
- Stay in character as {ai}
- Respond naturally to the user's actions and dialogue
- Show emotional depth and realistic reactions
- Progress the relationship naturally
- Keep responses concise but meaningful

{style}

USER CHARACTER: {user}

Respond only with your character's actions, dialogue, and reactions. No OOC comments.<end_of_turn>

<start_of_turn>user
{input}<end_of_turn>
<start_of_turn>model
",
        ai = config.ai_character,
        scenario = config.scenario,
        relationship = config.relationship,
        genre = config.genre,
        style = ROLEPLAY_STYLE,
        user = config.user_character,
        input = user_input,
    )
}

fn roleplay_continuation(config: &SceneConfig, user_input: &str, memory: &MemoryState) -> String {
    let memory_context = memory.render_context(Mode::Roleplay);
    let relationship = memory.relationship().unwrap_or_default();

    format!(
        "<start_of_turn>system
Continue your role as {ai} in this {genre} scenario.

CONTEXT:
{memory_context}

CURRENT RELATIONSHIP STATUS: {relationship}

INSTRUCTIONS:
- Respond to: {input}
- Stay perfectly in character as {ai}
- Maintain consistency with previous interactions
- Show emotional progression based on relationship development
- Use realistic dialogue and reactions
- Include subtle body language and emotional cues
- Keep response length appropriate to the situation
- No breaking character or meta-commentary

{style}

RECENT INTERACTION: {recent}...

Respond only as your character would speak and act.<end_of_turn>

<start_of_turn>user
{input}<end_of_turn>
<start_of_turn>model
",
        ai = config.ai_character,
        genre = config.genre,
        memory_context = memory_context,
        relationship = relationship,
        input = user_input,
        style = ROLEPLAY_STYLE,
        recent = truncate(memory.last_interaction(), MAX_INTERACTION_CHARS),
    )
}
