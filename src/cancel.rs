//! Cooperative cancellation for in-flight operations.
//!
//! A token is scoped to one owner (a tree node or a search slot). Cancelling
//! a token also cancels every token derived from it via [`CancelToken::child`],
//! so discarding a subtree tears down all of its pending fetches at once.
//! Cancellation is one-way: once fired, a token stays cancelled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Cloneable cancellation handle. All clones observe the same state.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled: AtomicBool,
    notify: broadcast::Sender<()>,
    parent: Option<CancelToken>,
}

impl CancelToken {
    /// Create a fresh, independent token.
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(1);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                notify,
                parent: None,
            }),
        }
    }

    /// Derive a token that fires when either it or any ancestor is cancelled.
    pub fn child(&self) -> Self {
        let (notify, _) = broadcast::channel(1);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                notify,
                parent: Some(self.clone()),
            }),
        }
    }

    /// Fire the token. Idempotent; clones and children all observe it.
    pub fn cancel(&self) {
        if self
            .inner
            .cancelled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            // Ignore send errors (no receivers waiting)
            let _ = self.inner.notify.send(());
        }
    }

    /// Fast, lock-free check of this token and its ancestors.
    pub fn is_cancelled(&self) -> bool {
        let mut current = Some(self);
        while let Some(token) = current {
            if token.inner.cancelled.load(Ordering::SeqCst) {
                return true;
            }
            current = token.inner.parent.as_ref();
        }
        false
    }

    /// Resolve once the token (or any ancestor) is cancelled. Intended for
    /// use inside `tokio::select!` against the operation being guarded.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }

        // Subscribe along the whole ancestor chain, then re-check the flag:
        // a cancel() that lands between the check and the subscription is
        // caught by the second check, one after it wakes a receiver.
        let mut receivers: Vec<broadcast::Receiver<()>> = Vec::new();
        let mut current = Some(self);
        while let Some(token) = current {
            receivers.push(token.inner.notify.subscribe());
            current = token.inner.parent.as_ref();
        }

        loop {
            if self.is_cancelled() {
                return;
            }
            let waits = receivers.iter_mut().map(|rx| Box::pin(rx.recv()));
            let _ = futures_util::future::select_all(waits).await;
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout, Duration};

    #[tokio::test]
    async fn test_new_token_is_not_cancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_is_observed_by_clones() {
        let token = CancelToken::new();
        let clone = token.clone();

        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let token = CancelToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_child_observes_parent_cancellation() {
        let parent = CancelToken::new();
        let child = parent.child();
        let grandchild = child.child();

        assert!(!grandchild.is_cancelled());
        parent.cancel();
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
    }

    #[tokio::test]
    async fn test_parent_unaffected_by_child_cancellation() {
        let parent = CancelToken::new();
        let child = parent.child();

        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let token = CancelToken::new();
        let waiter = token.clone();

        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });

        sleep(Duration::from_millis(10)).await;
        token.cancel();

        timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should wake after cancel")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_wakes_child_waiter_on_parent_cancel() {
        let parent = CancelToken::new();
        let child = parent.child();

        let handle = tokio::spawn(async move {
            child.cancelled().await;
        });

        sleep(Duration::from_millis(10)).await;
        parent.cancel();

        timeout(Duration::from_secs(1), handle)
            .await
            .expect("child waiter should wake after parent cancel")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_returns_immediately_when_already_fired() {
        let token = CancelToken::new();
        token.cancel();

        timeout(Duration::from_millis(100), token.cancelled())
            .await
            .expect("already-cancelled token should resolve immediately");
    }
}
