//! Fixed-size pool of persistent connections.
//!
//! Every slot is guarded by its own mutex, so a connection carries at most one
//! in-flight request. Dispatch scans for a free slot and, when all are busy,
//! waits on slot 0. There is no queueing or fairness between waiters.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Default number of pooled connections
pub const DEFAULT_POOL_SIZE: usize = 5;

/// Pool of exclusively locked connections
#[derive(Debug)]
pub struct ConnectionPool<C> {
    slots: Vec<Mutex<C>>,
    acquired: AtomicU64,
    fallbacks: AtomicU64,
}

/// A connection checked out of the pool; released on drop
#[derive(Debug)]
pub struct PooledConnection<'a, C> {
    slot: usize,
    guard: MutexGuard<'a, C>,
}

impl<C> PooledConnection<'_, C> {
    /// Index of the slot this connection occupies
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl<C> Deref for PooledConnection<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.guard
    }
}

impl<C> DerefMut for PooledConnection<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.guard
    }
}

/// Pool statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of slots
    pub size: usize,
    /// Slots locked at the time of the call
    pub busy: usize,
    /// Total successful checkouts
    pub acquired: u64,
    /// Checkouts that had to wait on slot 0
    pub fallbacks: u64,
}

impl<C> ConnectionPool<C> {
    /// Build a pool of `size` connections; a size of 0 is treated as 1
    pub fn new<E>(size: usize, mut connect: impl FnMut() -> Result<C, E>) -> Result<Self, E> {
        let size = size.max(1);
        let slots = (0..size)
            .map(|_| connect().map(Mutex::new))
            .collect::<Result<Vec<_>, E>>()?;
        Ok(Self {
            slots,
            acquired: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
        })
    }

    /// Number of slots
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Take the first free connection without waiting
    pub fn try_acquire(&self) -> Option<PooledConnection<'_, C>> {
        let (slot, guard) = self
            .slots
            .iter()
            .enumerate()
            .find_map(|(i, m)| m.try_lock().ok().map(|g| (i, g)))?;
        self.acquired.fetch_add(1, Ordering::Relaxed);
        Some(PooledConnection { slot, guard })
    }

    /// Take the first free connection, or wait for slot 0 if none is free
    pub async fn acquire(&self) -> PooledConnection<'_, C> {
        if let Some(conn) = self.try_acquire() {
            debug!("Acquired pooled connection {}", conn.slot);
            return conn;
        }

        self.fallbacks.fetch_add(1, Ordering::Relaxed);
        debug!(
            "All {} pooled connections busy, waiting on connection 0",
            self.slots.len()
        );
        let guard = self.slots[0].lock().await;
        self.acquired.fetch_add(1, Ordering::Relaxed);
        PooledConnection { slot: 0, guard }
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            size: self.slots.len(),
            busy: self.slots.iter().filter(|m| m.try_lock().is_err()).count(),
            acquired: self.acquired.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
        }
    }
}
