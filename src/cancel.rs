//! Cancellation token threaded through every suspension point of a run

use crate::error::{AppError, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable handle that cancels a run when triggered
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Request cancellation; every clone observes it
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so `changed` cannot fail while we wait.
        while !*receiver.borrow_and_update() {
            if receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Fail fast with [`AppError::Cancelled`] if the token was triggered
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(AppError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Drive `operation` unless the token fires first
    pub async fn guard<T, F>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(AppError::Cancelled),
            result = operation => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_guard_passes_result_through() {
        let token = CancelToken::new();
        let value = token.guard(async { Ok::<_, AppError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_guard_interrupts_pending_operation() {
        let token = CancelToken::new();
        let trigger = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = token
            .guard(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, AppError>(())
            })
            .await;

        assert_eq!(result, Err(AppError::Cancelled));
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_already_cancelled_token_fails_fast() {
        let token = CancelToken::new();
        token.cancel();

        assert_eq!(token.check(), Err(AppError::Cancelled));
        let result = token.guard(async { Ok::<_, AppError>(1) }).await;
        assert_eq!(result, Err(AppError::Cancelled));
    }

    #[test]
    fn test_clones_share_cancellation() {
        tokio_test::block_on(async {
            let token = CancelToken::new();
            let clone = token.clone();
            assert!(!clone.is_cancelled());

            token.cancel();
            clone.cancelled().await;
            assert!(clone.is_cancelled());
            assert_eq!(clone.check(), Err(AppError::Cancelled));
        });
    }
}
