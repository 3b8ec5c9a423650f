//! Per-key deduplication of concurrent resolutions.

use std::collections::HashMap;
use std::future::Future;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

use crate::types::errors::ResolveError;

type Outcome = Result<Bytes, ResolveError>;

/// Result of [`InFlight::run`].
#[derive(Debug)]
pub(crate) struct Joined {
    pub(crate) result: Outcome,
    /// True when the result came from another caller's resolution.
    pub(crate) shared: bool,
}

/// Table of resolutions currently running, keyed by lookup key.
///
/// The first caller for a key becomes the leader and runs the resolution.
/// Callers arriving while it runs subscribe and receive a clone of the
/// leader's outcome. The table lock is only held to register or subscribe.
#[derive(Default)]
pub(crate) struct InFlight {
    calls: Mutex<HashMap<String, broadcast::Sender<Outcome>>>,
}

impl InFlight {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Runs `resolve` for `key` unless a resolution is already in flight, in
    /// which case waits for that one instead.
    ///
    /// If the leader is dropped before finishing, waiting callers start over
    /// and one of them takes the lead.
    pub(crate) async fn run<F, Fut>(&self, key: &str, resolve: F) -> Joined
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        loop {
            let receiver = {
                let mut calls = self.calls.lock();
                match calls.get(key) {
                    Some(sender) => Some(sender.subscribe()),
                    None => {
                        let (sender, _) = broadcast::channel(1);
                        calls.insert(key.to_string(), sender);
                        None
                    }
                }
            };

            let mut receiver = match receiver {
                Some(receiver) => receiver,
                None => return self.lead(key, &resolve).await,
            };

            match receiver.recv().await {
                Ok(result) => {
                    return Joined {
                        result,
                        shared: true,
                    }
                }
                Err(_) => {
                    debug!(key, "In-flight resolution abandoned, retrying");
                }
            }
        }
    }

    async fn lead<F, Fut>(&self, key: &str, resolve: &F) -> Joined
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        let guard = LeaderGuard {
            inflight: self,
            key,
            finished: false,
        };
        let result = resolve().await;
        guard.finish(result.clone());

        Joined {
            result,
            shared: false,
        }
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.calls.lock().len()
    }
}

/// Unregisters the leader's entry, also when its future is dropped mid-way.
struct LeaderGuard<'a> {
    inflight: &'a InFlight,
    key: &'a str,
    finished: bool,
}

impl LeaderGuard<'_> {
    fn finish(mut self, result: Outcome) {
        self.finished = true;
        let sender = self.inflight.calls.lock().remove(self.key);
        if let Some(sender) = sender {
            // No receivers is fine: nobody was waiting.
            let _ = sender.send(result);
        }
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.inflight.calls.lock().remove(self.key);
        }
    }
}
