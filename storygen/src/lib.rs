//! Shared runtime for the generator binaries.
//!
//! Both binaries follow the same lifecycle: load the environment, wire
//! diagnostics to stderr, verify the completion server, emit the `READY`
//! token the host process polls for, then hand stdin/stdout to the
//! session loop. Standard output carries protocol payload only; every
//! diagnostic goes to stderr.

use story_core::{run_session, Generator, LlamaBackend, Mode};
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Run one generator process to completion.
///
/// Exits the process with a non-zero status if the backend cannot be
/// verified; in that case the `READY` token is never emitted.
pub async fn run(mode: Mode) -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("starting {mode} generator");

    let backend = LlamaBackend::from_env();
    info!(url = backend.base_url(), "using completion server");

    if let Err(err) = backend.health().await {
        error!("completion server health check failed: {err}");
        error!(
            "hint: start a llama.cpp server first, e.g. `llama-server -m model.gguf --port 8080`, \
             or point LLAMA_SERVER_URL at a running one"
        );
        std::process::exit(1);
    }

    let mut generator = Generator::new(mode, Box::new(backend));

    match generator.smoke_test().await {
        Ok(text) => info!(text = %text, "model smoke test passed"),
        Err(err) => {
            error!("model smoke test failed: {err}");
            error!("hint: check that the server has a model loaded and enough memory");
            std::process::exit(1);
        }
    }

    // The host process polls stderr for this token before sending
    // commands.
    info!("READY - waiting for commands");

    let stdin = BufReader::new(tokio::io::stdin());
    run_session(&mut generator, stdin, tokio::io::stdout()).await?;

    info!("shutting down {mode} generator");
    Ok(())
}
