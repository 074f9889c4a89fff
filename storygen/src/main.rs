//! Story-mode generator.
//!
//! Reads `COMMAND|DATA|CONFIG_JSON` lines from stdin and writes
//! sentinel-terminated chapters of narrative fiction to stdout.

use story_core::Mode;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    storygen::run(Mode::Story).await
}
