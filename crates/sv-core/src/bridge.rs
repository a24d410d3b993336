//! Pending Request Bridge
//!
//! Correlates the result of an external file picker with the page request
//! that opened it. The bridge holds at most one pending callback:
//!
//! - `begin` stores a callback and returns a fresh [`RequestId`]. A callback
//!   that was still pending is fulfilled with the empty result first.
//! - `complete` delivers a result, but only for the pending id. Results for
//!   superseded or unknown ids are dropped.
//! - `result_unavailable` fulfils the pending callback with the empty result
//!   when no picker could be launched.
//!
//! Every stored callback runs exactly once, including a callback still pending
//! when the bridge is dropped: it receives the empty result. Callbacks run
//! after the internal lock is released, so they may call back into the bridge.
//!
//! There is no timeout: a picker that never answers keeps the slot occupied
//! until the next `begin`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use log::debug;
use tokio::sync::oneshot;

use crate::types::{FileSelection, RequestId};

/// Completion handle for a pending request.
pub type Callback<T> = Box<dyn FnOnce(T) + Send + 'static>;

struct Pending<T> {
    id: RequestId,
    callback: Callback<T>,
}

/// Single-slot register for an outstanding external request.
pub struct PendingRequestBridge<T: Default = FileSelection> {
    slot: Mutex<Option<Pending<T>>>,
    next_id: AtomicU64,
}

impl<T: Default> fmt::Debug for PendingRequestBridge<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequestBridge")
            .field("pending", &self.pending_id())
            .finish()
    }
}

impl<T: Default> Default for PendingRequestBridge<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default> PendingRequestBridge<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    fn take_pending(&self) -> Option<Pending<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    /// Id of the request currently waiting for a result.
    pub fn pending_id(&self) -> Option<RequestId> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|p| p.id)
    }

    pub fn is_pending(&self) -> bool {
        self.pending_id().is_some()
    }

    /// Register a new request, superseding any pending one.
    ///
    /// The superseded callback is fulfilled with the empty result before this
    /// returns.
    pub fn begin<F>(&self, callback: F) -> RequestId
    where
        F: FnOnce(T) + Send + 'static,
    {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let superseded = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Pending {
                id,
                callback: Box::new(callback),
            });

        if let Some(old) = superseded {
            debug!("Request {} superseded by {}", old.id, id);
            (old.callback)(T::default());
        }

        id
    }

    /// Register a new request and receive its result through a channel.
    ///
    /// If the bridge is dropped with the request still pending, the receiver
    /// gets the empty result.
    pub fn begin_async(&self) -> (RequestId, oneshot::Receiver<T>)
    where
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let id = self.begin(move |result| {
            // The receiver may have been dropped; nobody is waiting then.
            let _ = tx.send(result);
        });
        (id, rx)
    }

    /// Deliver the result for `id`.
    ///
    /// Returns false, without touching the pending request, when `id` is not
    /// the one currently pending.
    pub fn complete(&self, id: RequestId, result: T) -> bool {
        let pending = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(p) if p.id == id => slot.take(),
                _ => None,
            }
        };

        match pending {
            Some(p) => {
                (p.callback)(result);
                true
            }
            None => {
                debug!("Discarding stale result for request {}", id);
                false
            }
        }
    }

    /// The external picker could not be launched: fulfil the pending request
    /// with the empty result.
    pub fn result_unavailable(&self) {
        if let Some(p) = self.take_pending() {
            debug!("No picker available for request {}", p.id);
            (p.callback)(T::default());
        }
    }
}

impl<T: Default> Drop for PendingRequestBridge<T> {
    fn drop(&mut self) {
        if let Some(p) = self.slot.get_mut().unwrap_or_else(PoisonError::into_inner).take() {
            debug!("Bridge dropped with request {} pending", p.id);
            (p.callback)(T::default());
        }
    }
}
