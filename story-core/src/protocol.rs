//! The stdin/stdout wire protocol.
//!
//! Line-oriented, UTF-8. One request per line, in the form
//! `COMMAND|DATA|CONFIG_JSON`; one response block per request, terminated
//! by the literal sentinel line `END_RESPONSE`. Malformed requests and
//! failed generations are answered in-band — the host can always read up
//! to the next sentinel, whatever happened.

use crate::generator::Generator;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// The sentinel line terminating every response block.
pub const SENTINEL: &str = "END_RESPONSE";

/// Fixed response for a request with fewer than two fields.
pub const INVALID_FORMAT: &str = "ERROR: Invalid command format. Expected: COMMAND|DATA|CONFIG";

/// A parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request<'a> {
    pub command: &'a str,
    pub data: &'a str,
    /// Everything after the second `|`, verbatim — may itself contain `|`.
    pub config_json: &'a str,
}

/// Split a request line on its first two `|` delimiters.
///
/// Returns `None` when fewer than two fields are present. A missing third
/// field defaults to `{}`.
pub fn parse_request(line: &str) -> Option<Request<'_>> {
    let mut parts = line.splitn(3, '|');
    let command = parts.next()?;
    let data = parts.next()?;
    let config_json = parts.next().unwrap_or("{}");

    Some(Request {
        command,
        data,
        config_json,
    })
}

/// Drive the request/response loop until a blank line or end of input.
///
/// Generic over reader and writer so tests can run it over in-memory
/// buffers. Each response is flushed before the next line is read; exactly
/// one request is in flight at a time.
pub async fn run_session<R, W>(generator: &mut Generator, reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            info!("no input received, shutting down");
            break;
        }

        debug!(preview = %crate::memory::truncate(line, 50), "received command");

        let response = match parse_request(line) {
            Some(request) => {
                generator
                    .process(request.command, request.data, request.config_json)
                    .await
            }
            None => INVALID_FORMAT.to_string(),
        };

        writer.write_all(response.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.write_all(SENTINEL.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;

        debug!(chars = response.len(), "response sent");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_request() {
        let request = parse_request("GENERATE|hello there|{\"genre\": \"noir\"}").unwrap();
        assert_eq!(request.command, "GENERATE");
        assert_eq!(request.data, "hello there");
        assert_eq!(request.config_json, "{\"genre\": \"noir\"}");
    }

    #[test]
    fn test_parse_missing_config_defaults() {
        let request = parse_request("CLEAR_MEMORY|").unwrap();
        assert_eq!(request.command, "CLEAR_MEMORY");
        assert_eq!(request.data, "");
        assert_eq!(request.config_json, "{}");
    }

    #[test]
    fn test_config_keeps_embedded_pipes() {
        let request = parse_request(r#"CONTINUE|go on|{"scenario": "a|b|c"}"#).unwrap();
        assert_eq!(request.config_json, r#"{"scenario": "a|b|c"}"#);
    }

    #[test]
    fn test_single_field_is_malformed() {
        assert!(parse_request("ONLYCOMMAND").is_none());
    }
}
