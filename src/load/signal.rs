//! Cooperative cancellation for guard and loader work.

use tokio::sync::watch;

/// Owner side of a cancellation flag. Cloning shares the same flag.
#[derive(Debug, Clone)]
pub struct AbortController {
    tx: std::sync::Arc<watch::Sender<bool>>,
}

impl AbortController {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            tx: std::sync::Arc::new(tx),
        }
    }

    /// Flip the flag. Idempotent.
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: self.tx.subscribe(),
        }
    }

    pub fn same_as(&self, other: &AbortController) -> bool {
        std::sync::Arc::ptr_eq(&self.tx, &other.tx)
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side handed to guards and loaders.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the owning controller aborts. Never resolves otherwise.
    pub async fn aborted(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|aborted| *aborted).await.is_err() {
            // Controller dropped without aborting.
            std::future::pending::<()>().await;
        }
    }
}
