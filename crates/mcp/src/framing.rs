// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Content-Length` framing for the stdio transport.
//!
//! Wire format: `Content-Length: N\r\n\r\n<N bytes>`. Header names are
//! case-insensitive; unknown headers are skipped.

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Upper bound on a single framed message (64 MiB); anything larger is a
/// corrupt stream.
const MAX_FRAME_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum FramingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing Content-Length header")]
    MissingLength,

    #[error("invalid Content-Length: {0}")]
    BadLength(String),

    #[error("frame of {0} bytes exceeds limit")]
    Oversize(u64),
}

/// Read one framed message. `Ok(None)` signals a clean EOF before any
/// header byte.
pub async fn read_message<R>(
    reader: &mut BufReader<R>,
) -> Result<Option<Vec<u8>>, FramingError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut content_length: Option<u64> = None;
    let mut saw_header = false;

    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            if saw_header {
                return Err(FramingError::MissingLength);
            }
            return Ok(None);
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        saw_header = true;
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                let value = value.trim();
                let length: u64 = value
                    .parse()
                    .map_err(|_| FramingError::BadLength(value.to_string()))?;
                content_length = Some(length);
            }
        }
    }

    let length = content_length.ok_or(FramingError::MissingLength)?;
    if length > MAX_FRAME_BYTES {
        return Err(FramingError::Oversize(length));
    }

    let mut body = vec![0u8; length as usize];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

/// Write one framed message and flush.
pub async fn write_message<W>(writer: &mut W, body: &[u8]) -> Result<(), FramingError>
where
    W: AsyncWrite + Unpin,
{
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "framing_tests.rs"]
mod tests;
