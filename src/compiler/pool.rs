//! Bounded pool of compilation slots.
//!
//! Compilations are the only long-running work in the server; everything
//! else is map lookups and file reads. The pool caps how many run at once
//! so a burst of `/compile` requests cannot exhaust the blocking workers.
//! A slot is held as an RAII permit: acquired on dispatch, released when
//! the permit drops, on every success, failure and timeout path alike.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A bounded set of compilation slots shared by all request workers.
#[derive(Clone)]
pub struct CompilePool {
    slots: Arc<Semaphore>,
    capacity: usize,
}

impl CompilePool {
    /// Create a pool with the given number of slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Acquire a slot, waiting if all are taken.
    ///
    /// The returned permit must be held for the duration of the
    /// compilation; dropping it frees the slot.
    pub async fn acquire(&self) -> CompilePermit {
        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .expect("compile pool semaphore closed unexpectedly");
        CompilePermit { _permit: permit }
    }

    /// Slots not currently in use.
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Configured number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// A held compilation slot. Dropping it releases the slot.
#[derive(Debug)]
pub struct CompilePermit {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_permits_are_scoped() {
        let pool = CompilePool::new(2);
        assert_eq!(pool.available(), 2);

        let first = pool.acquire().await;
        let second = pool.acquire().await;
        assert_eq!(pool.available(), 0);

        drop(first);
        assert_eq!(pool.available(), 1);
        drop(second);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn test_acquire_waits_for_free_slot() {
        let pool = CompilePool::new(1);
        let held = pool.acquire().await;

        let contender = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire().await })
        };

        // The contender cannot finish while the slot is held.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(held);
        let _slot = contender.await.unwrap();
    }
}
