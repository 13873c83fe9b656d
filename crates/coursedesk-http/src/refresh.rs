//! Single-flight token refresh.
//!
//! Every request that hits an expired session needs a new token pair, but
//! only one refresh call should reach the server at a time. The first caller
//! starts the refresh; callers arriving while it runs await the same shared
//! future and receive a clone of its result.

use std::sync::{Mutex, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::debug;

use coursedesk_core::{Result, TokenPair};

type RefreshFuture = Shared<BoxFuture<'static, Result<TokenPair>>>;

#[derive(Default)]
pub(crate) struct RefreshFlight {
    slot: Mutex<Option<RefreshFuture>>,
}

impl RefreshFlight {
    /// Await the refresh in flight, or start one with `start` if none is.
    pub(crate) async fn run<F>(&self, start: F) -> Result<TokenPair>
    where
        F: FnOnce() -> BoxFuture<'static, Result<TokenPair>>,
    {
        let (flight, joined) = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(flight) => (flight.clone(), true),
                None => {
                    let flight = start().shared();
                    *slot = Some(flight.clone());
                    (flight, false)
                }
            }
        };

        if joined {
            debug!("Joining in-flight token refresh");
        }

        let result = flight.clone().await;

        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot
            .as_ref()
            .is_some_and(|current| current.ptr_eq(&flight))
        {
            *slot = None;
        }

        result
    }

    #[cfg(test)]
    fn in_flight(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use coursedesk_core::error::AuthError;

    fn counted_refresh(
        calls: Arc<AtomicUsize>,
        outcome: Result<TokenPair>,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<TokenPair>> {
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                outcome
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let flight = Arc::new(RefreshFlight::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..5)
            .map(|_| {
                let flight = Arc::clone(&flight);
                let start = counted_refresh(Arc::clone(&calls), Ok(TokenPair::new("a2", "r2")));
                tokio::spawn(async move { flight.run(start).await })
            })
            .collect();

        for task in tasks {
            let pair = task.await.unwrap().unwrap();
            assert_eq!(pair.access.as_str(), "a2");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!flight.in_flight());
    }

    #[tokio::test]
    async fn failure_is_shared_and_slot_resets() {
        let flight = Arc::new(RefreshFlight::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            flight.run(counted_refresh(Arc::clone(&calls), Err(AuthError::RefreshTokenMissing.into()))),
            flight.run(counted_refresh(Arc::clone(&calls), Err(AuthError::RefreshTokenMissing.into()))),
        );
        assert!(a.is_err());
        assert!(b.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // A later refresh starts fresh.
        let pair = flight
            .run(counted_refresh(Arc::clone(&calls), Ok(TokenPair::new("a3", "r3"))))
            .await
            .unwrap();
        assert_eq!(pair.refresh.as_str(), "r3");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
