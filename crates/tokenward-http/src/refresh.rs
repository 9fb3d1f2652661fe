//! Single-flight coordination for token refresh.
//!
//! The first caller starts the refresh and publishes it as a shared future.
//! Callers arriving while it is pending await that same future instead of
//! issuing another refresh call. The future clears the slot as it completes,
//! so the next rejection after that starts a fresh refresh.
//!
//! The shared future only makes progress while someone awaits it. If every
//! waiter is dropped first, the last one clears the slot, which cancels the
//! refresh; the next rejection starts over.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::debug;

use tokenward_core::AccessToken;
use tokenward_core::error::AuthError;

/// The result every waiter receives.
pub(crate) type RefreshOutcome = Result<AccessToken, AuthError>;

type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

#[derive(Default)]
pub(crate) struct RefreshFlight {
    pending: Arc<Mutex<Option<PendingRefresh>>>,
}

impl RefreshFlight {
    fn slot(&self) -> MutexGuard<'_, Option<PendingRefresh>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a refresh is currently pending.
    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> bool {
        self.slot().is_some()
    }

    /// Join the pending refresh, or start one with `start`.
    pub(crate) async fn run<F, Fut>(&self, start: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome> + Send + 'static,
    {
        let pending = {
            let mut slot = self.slot();
            match slot.as_ref() {
                Some(pending) => {
                    debug!("Joining in-flight refresh");
                    pending.clone()
                }
                None => {
                    let handle = Arc::clone(&self.pending);
                    let refresh = start();
                    let pending = async move {
                        let outcome = refresh.await;
                        handle
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .take();
                        outcome
                    }
                    .boxed()
                    .shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        let mut waiter = Waiter {
            flight: self,
            pending,
        };
        (&mut waiter.pending).await
    }
}

/// One caller's handle on the pending refresh.
struct Waiter<'a> {
    flight: &'a RefreshFlight,
    pending: PendingRefresh,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        let abandoned = {
            let mut slot = self.flight.slot();
            // The slot and this waiter hold the only references left.
            let last = self.pending.strong_count() == Some(2)
                && slot
                    .as_ref()
                    .is_some_and(|pending| pending.ptr_eq(&self.pending));
            if last { slot.take() } else { None }
        };

        if abandoned.is_some() {
            debug!("Refresh abandoned by its last waiter");
        }
    }
}
