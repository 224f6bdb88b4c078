//! Keyed mutexes serializing transfers per account pair.
//!
//! One async mutex exists per ordered `(low, high)` account-id pair, so
//! reciprocal transfers (A to B and B to A) contend on the same key and
//! serialize instead of interleaving. Waiting is bounded; a timeout surfaces
//! as the retryable [`EngineError::LockTimeout`].

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{EngineError, ResultEngine};

#[derive(Debug, Default)]
pub(crate) struct PairLocks {
    locks: Mutex<HashMap<(i64, i64), Arc<Mutex<()>>>>,
}

impl PairLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for the `(a, b)` pair, waiting at most `wait`.
    pub(crate) async fn acquire(
        &self,
        a: i64,
        b: i64,
        wait: Duration,
    ) -> ResultEngine<OwnedMutexGuard<()>> {
        let key = if a <= b { (a, b) } else { (b, a) };
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(key).or_default())
        };

        match tokio::time::timeout(wait, lock.lock_owned()).await {
            Ok(guard) => Ok(guard),
            Err(_) => Err(EngineError::LockTimeout(format!(
                "transfer lane for accounts {} and {}",
                key.0, key.1
            ))),
        }
    }
}
