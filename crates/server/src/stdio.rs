// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-framed stdio transport.
//!
//! One framed request, one framed response, until EOF. A bad frame or a
//! bad body answers with a protocol error and keeps the loop alive; only
//! stream-level IO failures end it.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use masc_core::Clock;
use masc_mcp::{error_response, framing, FramingError, PARSE_ERROR};

use crate::mcp::McpServer;

/// Fixed session id: all stdio clients share one identity file.
const STDIO_SESSION_ID: &str = "stdio";

/// Serve MCP over stdin/stdout until EOF or cancellation.
pub async fn run_stdio<C: Clock + 'static>(
    server: Arc<McpServer<C>>,
    cancel: CancellationToken,
) -> Result<(), FramingError> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    run_loop(server, stdin, stdout, cancel).await
}

/// Transport loop over arbitrary streams (tests drive this directly).
pub async fn run_loop<C, R, W>(
    server: Arc<McpServer<C>>,
    mut reader: BufReader<R>,
    mut writer: W,
    cancel: CancellationToken,
) -> Result<(), FramingError>
where
    C: Clock + 'static,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let body = tokio::select! {
            _ = cancel.cancelled() => {
                info!("stdio transport cancelled");
                return Ok(());
            }
            read = framing::read_message(&mut reader) => match read {
                Ok(Some(body)) => body,
                Ok(None) => {
                    info!("stdio transport reached EOF");
                    return Ok(());
                }
                Err(FramingError::Io(e)) => return Err(FramingError::Io(e)),
                Err(e) => {
                    // One bad frame must not kill the loop.
                    warn!(error = %e, "bad frame on stdio");
                    let response =
                        error_response(None, PARSE_ERROR, "Parse error", None);
                    framing::write_message(&mut writer, response.to_string().as_bytes()).await?;
                    continue;
                }
            },
        };

        match server.handle(&body, STDIO_SESSION_ID, &cancel).await {
            Some(response) => {
                framing::write_message(&mut writer, response.to_string().as_bytes()).await?;
            }
            None => debug!("no response for notification"),
        }
    }
}

#[cfg(test)]
#[path = "stdio_tests.rs"]
mod tests;
