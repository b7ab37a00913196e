//! Concurrency Guard
//!
//! One readers/writer lock shared by every store handle of a data root.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Process-wide lock scoping every collection operation
///
/// Reads (`find`, `find_one`, `count_documents`) take the shared mode; every
/// mutation, including catalog lifecycle changes, takes the exclusive mode.
/// The lock is not sharded: a slow write on one collection blocks reads on
/// every other. Guards release on drop, on every exit path.
#[derive(Debug, Default)]
pub struct ConcurrencyGuard {
    lock: RwLock<()>,
}

impl ConcurrencyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until shared access is granted
    pub fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read()
    }

    /// Block until exclusive access is granted
    pub fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write()
    }
}
