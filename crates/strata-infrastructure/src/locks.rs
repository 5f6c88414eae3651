//! Poison-aware locking for registry state
//!
//! A factory, hook or listener that panics while the registry holds one of
//! its locks poisons that lock. Every later access then fails with
//! [`Error::Internal`] naming the node and structure involved, instead of
//! panicking in the caller.

use std::fmt;
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use strata_domain::error::{Error, Result};

/// Registry structure guarded by a lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guarded<'a> {
    /// Records and multi-groups of the node with this id
    NodeState(&'a str),
    /// Orphan forwarders owned by the node with this id
    Forwarders(&'a str),
    /// Listeners attached to a node
    Listeners,
}

impl fmt::Display for Guarded<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeState(id) => write!(f, "state of registry '{id}'"),
            Self::Forwarders(id) => write!(f, "orphan forwarders of registry '{id}'"),
            Self::Listeners => f.write_str("listener collection"),
        }
    }
}

fn poisoned(access: &str, guarded: Guarded<'_>) -> Error {
    Error::internal(format!("{access} lock on {guarded} poisoned"))
}

/// Lock a mutex-guarded registry structure
pub fn lock_mutex<'a, T>(lock: &'a Mutex<T>, guarded: Guarded<'_>) -> Result<MutexGuard<'a, T>> {
    lock.lock().map_err(|_| poisoned("mutex", guarded))
}

/// Read a registry structure
pub fn read_lock<'a, T>(lock: &'a RwLock<T>, guarded: Guarded<'_>) -> Result<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| poisoned("read", guarded))
}

/// Write a registry structure
pub fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    guarded: Guarded<'_>,
) -> Result<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| poisoned("write", guarded))
}
