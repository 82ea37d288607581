// src/limiter.rs
// =============================================================================
// A counting limiter: a bounded-concurrency admission gate.
//
// - acquire() waits until one of the N slots is free, then reserves it
// - the reservation is a Permit value; dropping it frees the slot
//
// The same type gates two things:
// - inbound: how many batches the whole server runs at once (shared)
// - outbound: how many fetches one batch has in flight (one per batch)
//
// Rust concepts:
// - RAII: the permit releases itself when it goes out of scope
// - Arc: shared ownership so permits can move into spawned tasks
// =============================================================================

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A fixed-capacity gate. Cloning shares the same slots.
#[derive(Debug, Clone)]
pub struct CountingLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// One reserved slot of a [`CountingLimiter`].
///
/// The slot is returned when the permit is dropped or passed to
/// [`Permit::release`]. Both consume the permit, so a slot can only be
/// released once.
#[derive(Debug)]
pub struct Permit {
    _permit: OwnedSemaphorePermit,
}

impl Permit {
    /// Frees the slot now instead of at end of scope.
    pub fn release(self) {}
}

impl CountingLimiter {
    /// Creates a limiter with `capacity` slots.
    ///
    /// A zero capacity is treated as one. `MuxConfig::validate` rejects
    /// zero before it gets here.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits for a free slot and reserves it.
    ///
    /// Waiters are served in FIFO order, so nobody starves.
    pub async fn acquire(&self) -> Permit {
        // The semaphore is owned by this limiter and never closed,
        // so acquire_owned can only fail after close().
        match Arc::clone(&self.semaphore).acquire_owned().await {
            Ok(permit) => Permit { _permit: permit },
            Err(_) => unreachable!("limiter semaphore is never closed"),
        }
    }

    /// Waits until every slot is free at the same moment.
    ///
    /// Takes its place in the same FIFO queue as `acquire`, so callers
    /// already waiting for a slot are served first.
    pub async fn wait_idle(&self) {
        let all = u32::try_from(self.capacity).unwrap_or(u32::MAX);
        match self.semaphore.acquire_many(all).await {
            Ok(_all) => {}
            Err(_) => unreachable!("limiter semaphore is never closed"),
        }
    }

    /// Reserves a slot only if one is free right now.
    #[cfg(test)]
    pub fn try_acquire(&self) -> Option<Permit> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| Permit { _permit: permit })
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of free slots.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Number of reserved slots.
    pub fn in_use(&self) -> usize {
        self.capacity - self.available()
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why wrap the Semaphore in an Arc?
//    - acquire_owned() needs an Arc<Semaphore> so the permit can outlive
//      the borrow of the limiter
//    - That is what lets a permit move into a spawned worker task
//
// 2. Why does `release` have an empty body?
//    - It takes `self` by value, so the permit is dropped when it returns
//    - Dropping the OwnedSemaphorePermit hands the slot back
// -----------------------------------------------------------------------------
