//! Roleplay-mode generator.
//!
//! Reads `COMMAND|DATA|CONFIG_JSON` lines from stdin and writes
//! sentinel-terminated in-character responses to stdout, tracking
//! emotional and wardrobe state across turns.

use story_core::Mode;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    storygen::run(Mode::Roleplay).await
}
