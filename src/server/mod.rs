//! Stdio lookup server.
//!
//! Reads newline-delimited JSON requests and answers each one on its own
//! task against a shared [`LookupService`]. Responses are written as they
//! complete, so they may come back out of order; each carries the request
//! `id`.

mod transport;

pub use transport::{Incoming, RequestReader, ResponseWriter};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::service::LookupService;
use crate::types::requests::{LookupRequest, Operation};
use crate::types::responses::LookupResponse;
use crate::LookasideResult;

/// Responses that may be resolved but not yet written. Bounds the number of
/// concurrent resolutions per connection.
const MAX_PENDING_RESPONSES: usize = 64;

/// Lookup server over a pair of byte streams.
pub struct LookupServer {
    service: Arc<LookupService>,
    started_at: DateTime<Utc>,
}

impl LookupServer {
    pub fn new(service: Arc<LookupService>) -> Self {
        Self {
            service,
            started_at: Utc::now(),
        }
    }

    pub fn service(&self) -> &Arc<LookupService> {
        &self.service
    }

    /// Serves stdin/stdout until stdin is closed.
    pub async fn run_stdio(&self) -> LookasideResult<()> {
        self.run(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serves `input`/`output` until `input` reaches EOF and every accepted
    /// request has been answered.
    ///
    /// If `output` fails, reading stops, requests still waiting for a
    /// response slot are dropped without being resolved, and the write error
    /// is returned.
    pub async fn run<R, W>(&self, input: R, output: W) -> LookasideResult<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!("Lookup server starting...");

        let (tx, rx) = mpsc::channel(MAX_PENDING_RESPONSES);
        let (read_result, write_result) =
            tokio::join!(self.accept(input, tx), write_responses(output, rx));

        tracing::info!("Lookup server stopped");
        write_result.and(read_result)
    }

    /// Reads requests and spawns one task per request.
    async fn accept<R>(&self, input: R, tx: mpsc::Sender<LookupResponse>) -> LookasideResult<()>
    where
        R: AsyncRead + Unpin,
    {
        let mut reader = RequestReader::new(input);
        let mut tasks = JoinSet::new();

        let result = loop {
            let next = tokio::select! {
                biased;
                _ = tx.closed() => {
                    tracing::warn!("Output closed, no longer accepting requests");
                    break Ok(());
                }
                next = reader.next_message() => next,
            };

            let incoming = match next {
                Ok(Some(incoming)) => incoming,
                Ok(None) => {
                    tracing::info!("Client disconnected");
                    break Ok(());
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read request");
                    break Err(e);
                }
            };

            match incoming {
                Incoming::Request(request) => {
                    let service = self.service.clone();
                    let started_at = self.started_at;
                    let tx = tx.clone();
                    let span = tracing::debug_span!(
                        "request",
                        request_id = %uuid::Uuid::new_v4(),
                        op = %request.op,
                    );
                    tasks.spawn(
                        async move {
                            // A slot is taken before resolving so nothing is
                            // resolved once the writer has gone.
                            let Ok(permit) = tx.reserve().await else {
                                tracing::debug!("Dropped request, output closed");
                                return;
                            };
                            let response = handle_request(&service, request, started_at).await;
                            permit.send(response);
                        }
                        .instrument(span),
                    );
                }
                Incoming::Invalid { id, reason } => {
                    tracing::warn!(%reason, "Rejected request");
                    if tx.send(LookupResponse::error(id, reason)).await.is_err() {
                        break Ok(());
                    }
                }
            }

            while let Some(joined) = tasks.try_join_next() {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "Request task failed");
                }
            }
        };

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Request task failed");
            }
        }

        result
    }
}

async fn write_responses<W>(
    output: W,
    mut rx: mpsc::Receiver<LookupResponse>,
) -> LookasideResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut writer = ResponseWriter::new(output);
    while let Some(response) = rx.recv().await {
        if let Err(e) = writer.write_response(&response).await {
            tracing::error!(error = %e, "Failed to write response");
            return Err(e);
        }
    }
    Ok(())
}

/// Executes one request against the service.
pub async fn handle_request(
    service: &LookupService,
    request: LookupRequest,
    started_at: DateTime<Utc>,
) -> LookupResponse {
    let id = request.id;

    match request.op {
        Operation::Get { key } => match service.lookup(&key).await {
            Ok(lookup) => LookupResponse::found(id, &lookup),
            Err(err) => LookupResponse::not_found(id, &err),
        },
        Operation::Invalidate { key } => LookupResponse::removed(id, service.invalidate(&key)),
        Operation::Clear => {
            service.clear();
            LookupResponse::ok(id)
        }
        Operation::Stats => {
            let uptime_secs = (Utc::now() - started_at).num_seconds().max(0) as u64;
            LookupResponse::stats(id, service.stats(), uptime_secs)
        }
    }
}
