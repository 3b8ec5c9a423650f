//! Newline-delimited JSON framing.
//!
//! Each request is one JSON object on a single line; each response is
//! written the same way, compact, followed by `\n`.
//!
//! ```text
//! {"id":1,"op":"get","key":"ls"}\n
//! {"id":1,"status":"miss","payload":"..."}\n
//! ```

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::types::requests::{LookupRequest, RequestId};
use crate::types::responses::LookupResponse;
use crate::LookasideResult;

/// One line read from the client.
#[derive(Debug)]
pub enum Incoming {
    /// A well-formed request.
    Request(LookupRequest),
    /// A line that could not be parsed. `id` is recovered when the line is
    /// a JSON object with a usable `id`.
    Invalid {
        id: Option<RequestId>,
        reason: String,
    },
}

/// Reads requests from an async byte stream.
pub struct RequestReader<R> {
    reader: BufReader<R>,
    line: Vec<u8>,
}

impl<R: AsyncRead + Unpin> RequestReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            reader: BufReader::new(input),
            line: Vec::new(),
        }
    }

    /// Reads the next non-empty line. Returns `None` at EOF.
    pub async fn next_message(&mut self) -> LookasideResult<Option<Incoming>> {
        loop {
            self.line.clear();
            let bytes_read = self.reader.read_until(b'\n', &mut self.line).await?;

            if bytes_read == 0 {
                return Ok(None);
            }

            let text = match std::str::from_utf8(&self.line) {
                Ok(text) => text.trim(),
                Err(e) => {
                    return Ok(Some(Incoming::Invalid {
                        id: None,
                        reason: format!("invalid UTF-8: {}", e),
                    }))
                }
            };

            if text.is_empty() {
                continue;
            }

            let incoming = match serde_json::from_str::<LookupRequest>(text) {
                Ok(request) => {
                    tracing::debug!(id = ?request.id, op = %request.op, "Received request");
                    Incoming::Request(request)
                }
                Err(e) => Incoming::Invalid {
                    id: salvage_id(text),
                    reason: format!("invalid request: {}", e),
                },
            };
            return Ok(Some(incoming));
        }
    }
}

/// Pulls `id` out of a line that parsed as JSON but not as a request.
fn salvage_id(text: &str) -> Option<RequestId> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    serde_json::from_value(value.get("id")?.clone()).ok()
}

/// Writes responses to an async byte stream.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> ResponseWriter<W> {
    pub fn new(output: W) -> Self {
        Self { writer: output }
    }

    /// Writes one response line and flushes it.
    pub async fn write_response(&mut self, response: &LookupResponse) -> LookasideResult<()> {
        let body = serde_json::to_string(response)?;

        self.writer.write_all(body.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        // Clients wait on each line.
        self.writer.flush().await?;

        tracing::debug!(id = ?response.id, status = ?response.status, "Sent response");
        Ok(())
    }
}
