//! Single-flight session refresh
//!
//! When several requests hit 401 at once only the first one refreshes the
//! session. The rest park in a FIFO queue and are released, in arrival order,
//! with the outcome of that one refresh.

use std::{
    collections::VecDeque,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::ClientError;

#[derive(Debug, Default)]
struct GateState {
    /// Bumped every time a refresh finishes, successfully or not
    generation: u64,
    last_failed: bool,
    refreshing: bool,
    waiters: VecDeque<oneshot::Sender<bool>>,
}

#[derive(Debug, Clone, Default)]
pub struct RefreshGate {
    state: Arc<Mutex<GateState>>,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot taken before a request is sent
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Number of requests parked behind the running refresh
    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Resolve a 401 seen by a request sent at generation `observed`
    ///
    /// Returns `Ok(())` when the request should be replayed. If a refresh
    /// already finished after the request was sent, its outcome is reused and
    /// `refresh` is not called.
    pub async fn refresh_after<F, Fut>(&self, observed: u64, refresh: F) -> Result<(), ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), ClientError>>,
    {
        let parked = {
            let mut state = self.lock();
            if state.generation != observed {
                return if state.last_failed {
                    Err(ClientError::SessionExpired)
                } else {
                    Ok(())
                };
            }

            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                Some(rx)
            } else {
                state.refreshing = true;
                None
            }
        };

        if let Some(rx) = parked {
            debug!("Waiting for the session refresh in flight");
            return match rx.await {
                Ok(true) => Ok(()),
                _ => Err(ClientError::SessionExpired),
            };
        }

        let mut in_flight = InFlight {
            gate: self,
            done: false,
        };
        let outcome = refresh().await;
        in_flight.finish(outcome.is_ok());

        outcome.map_err(|e| {
            warn!("Session refresh failed: {}", e);
            ClientError::SessionExpired
        })
    }

    fn settle(&self, succeeded: bool) {
        let waiters = {
            let mut state = self.lock();
            state.refreshing = false;
            state.generation += 1;
            state.last_failed = !succeeded;
            std::mem::take(&mut state.waiters)
        };

        debug!(
            "Session refresh settled (succeeded: {}), releasing {} waiters",
            succeeded,
            waiters.len()
        );

        for waiter in waiters {
            // A dropped receiver means that caller gave up
            let _ = waiter.send(succeeded);
        }
    }
}

/// Settles the gate as failed if the refreshing future is dropped midway
struct InFlight<'a> {
    gate: &'a RefreshGate,
    done: bool,
}

impl InFlight<'_> {
    fn finish(&mut self, succeeded: bool) {
        self.done = true;
        self.gate.settle(succeeded);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.gate.settle(false);
        }
    }
}
