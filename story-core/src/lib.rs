//! Session protocol and derived-memory engine for story and roleplay
//! generation.
//!
//! This crate provides:
//! - The `COMMAND|DATA|CONFIG_JSON` wire protocol and session loop
//! - Command dispatch over a pluggable completion backend
//! - Regex-derived conversation memory (characters, emotions, clothing,
//!   relationship trajectory, plot events)
//! - Deterministic prompt templates for opening and continuation turns
//!
//! # Quick Start
//!
//! ```ignore
//! use story_core::{Generator, LlamaBackend, Mode, run_session};
//! use tokio::io::BufReader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = LlamaBackend::from_env();
//!     let mut generator = Generator::new(Mode::Roleplay, Box::new(backend));
//!
//!     generator.smoke_test().await?;
//!
//!     let stdin = BufReader::new(tokio::io::stdin());
//!     run_session(&mut generator, stdin, tokio::io::stdout()).await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod generator;
pub mod memory;
pub mod prompt;
pub mod protocol;
pub mod testing;

// Primary public API
pub use backend::{BackendError, CompletionBackend, GenerationOptions, LlamaBackend};
pub use config::{Mode, SceneConfig};
pub use generator::{Command, Generator, GeneratorError};
pub use memory::MemoryState;
pub use protocol::{run_session, INVALID_FORMAT, SENTINEL};
pub use testing::MockBackend;
