//! Request lifetimes tied to the view that issued them.
//!
//! A view owns a [`CancelScope`]; every request it starts runs through a
//! [`CancelToken`] from that scope. Once the scope is cancelled or dropped,
//! pending requests resolve to [`ApiError::Cancelled`] and their responses
//! are discarded instead of mutating state the view no longer owns.

use std::future::Future;

use tokio::sync::watch;

use crate::error::ApiError;

/// Owner side. Dropping it cancels every token it handed out.
#[derive(Debug)]
pub struct CancelScope {
    tx: watch::Sender<bool>,
}

/// Cheap, cloneable handle checked by in-flight requests.
#[derive(Debug, Clone)]
pub struct CancelToken {
    /// `None` for a token that can never be cancelled.
    rx: Option<watch::Receiver<bool>>,
}

impl Default for CancelScope {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelScope {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: Some(self.tx.subscribe()),
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        match &self.rx {
            Some(rx) => *rx.borrow() || rx.has_changed().is_err(),
            None => false,
        }
    }

    /// Drive `fut` unless the scope goes away first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let Some(mut rx) = self.rx.clone() else {
            return fut.await;
        };
        if self.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = rx.wait_for(|cancelled| *cancelled) => Err(ApiError::Cancelled),
            out = fut => {
                if self.is_cancelled() {
                    Err(ApiError::Cancelled)
                } else {
                    out
                }
            }
        }
    }
}
