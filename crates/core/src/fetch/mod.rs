//! Cancellable catalog requests.
//!
//! A [`CancellableFetcher`] runs at most one live request for one logical
//! operation (the search box, the detail pane). Starting a new request cancels
//! the previous one. Finished requests are posted back to the owner as a
//! [`Completion`] tagged with the [`RequestEpoch`] they were issued under, and
//! [`CancellableFetcher::accept`] only hands back the result of the live epoch.
//!
//! Aborting the spawned task is best effort: the remote call may still finish
//! on the wire. Epoch matching is what keeps a superseded response out of
//! controller state.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::AbortHandle;
use tracing::debug;

use crate::external_catalog::CatalogError;
use crate::metrics::{
    CATALOG_REQUESTS_CANCELLED, CATALOG_REQUESTS_STARTED, CATALOG_REQUEST_OUTCOMES,
    STALE_COMPLETIONS,
};

/// Monotonic token identifying one request cycle of a fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestEpoch(u64);

impl RequestEpoch {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of a finished request, as posted back to the owner.
#[derive(Debug)]
pub struct Completion<T> {
    pub epoch: RequestEpoch,
    pub result: Result<T, CatalogError>,
}

/// Where finished requests are delivered.
pub type CompletionSink<T> = Arc<dyn Fn(Completion<T>) + Send + Sync>;

struct CancelState {
    cancelled: Arc<AtomicBool>,
    abort: AbortHandle,
}

/// Handle to one in-flight request.
///
/// Cancelling before completion guarantees the request's completion is never
/// posted (or, if it raced the cancel, never accepted).
#[derive(Clone)]
pub struct CancelHandle {
    epoch: RequestEpoch,
    state: Arc<CancelState>,
}

impl CancelHandle {
    pub fn epoch(&self) -> RequestEpoch {
        self.epoch
    }

    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.state.abort.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("epoch", &self.epoch)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Issues requests for one logical operation, keeping only the newest live.
pub struct CancellableFetcher<T> {
    operation: &'static str,
    next_epoch: u64,
    live: Option<CancelHandle>,
    sink: CompletionSink<T>,
}

impl<T: Send + 'static> CancellableFetcher<T> {
    /// Create a fetcher that posts completions into `sink`.
    pub fn new(operation: &'static str, sink: CompletionSink<T>) -> Self {
        Self {
            operation,
            next_epoch: 0,
            live: None,
            sink,
        }
    }

    /// Cancel the live request (if any) and spawn `request` as the new one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F>(&mut self, request: F) -> CancelHandle
    where
        F: Future<Output = Result<T, CatalogError>> + Send + 'static,
    {
        self.cancel();

        self.next_epoch += 1;
        let epoch = RequestEpoch(self.next_epoch);

        let cancelled = Arc::new(AtomicBool::new(false));
        let task_cancelled = Arc::clone(&cancelled);
        let sink = Arc::clone(&self.sink);

        let task = tokio::spawn(async move {
            let result = request.await;
            if !task_cancelled.load(Ordering::SeqCst) {
                sink(Completion { epoch, result });
            }
        });

        let handle = CancelHandle {
            epoch,
            state: Arc::new(CancelState {
                cancelled,
                abort: task.abort_handle(),
            }),
        };

        debug!(operation = self.operation, %epoch, "request started");
        CATALOG_REQUESTS_STARTED
            .with_label_values(&[self.operation])
            .inc();

        self.live = Some(handle.clone());
        handle
    }
}

impl<T> CancellableFetcher<T> {
    /// Cancel the live request. Returns whether one was in flight.
    pub fn cancel(&mut self) -> bool {
        match self.live.take() {
            Some(handle) => {
                handle.cancel();
                debug!(operation = self.operation, epoch = %handle.epoch, "request cancelled");
                CATALOG_REQUESTS_CANCELLED
                    .with_label_values(&[self.operation])
                    .inc();
                true
            }
            None => false,
        }
    }

    /// Hand back the result if `completion` belongs to the live request.
    ///
    /// Accepting settles the fetcher; anything else is stale and dropped.
    pub fn accept(&mut self, completion: Completion<T>) -> Option<Result<T, CatalogError>> {
        let is_live = self
            .live
            .as_ref()
            .is_some_and(|live| live.epoch == completion.epoch && !live.is_cancelled());

        if !is_live {
            debug!(
                operation = self.operation,
                epoch = %completion.epoch,
                "discarding stale completion"
            );
            STALE_COMPLETIONS
                .with_label_values(&[self.operation])
                .inc();
            return None;
        }

        self.live = None;
        let outcome = match &completion.result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        CATALOG_REQUEST_OUTCOMES
            .with_label_values(&[self.operation, outcome])
            .inc();
        Some(completion.result)
    }

    /// Whether a request is live (started, not yet accepted or cancelled).
    pub fn is_in_flight(&self) -> bool {
        self.live.is_some()
    }

    /// Epoch of the live request.
    pub fn live_epoch(&self) -> Option<RequestEpoch> {
        self.live.as_ref().map(|h| h.epoch)
    }
}

impl<T> Drop for CancellableFetcher<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.live.take() {
            handle.cancel();
        }
    }
}
