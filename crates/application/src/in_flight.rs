//! Per-operation in-flight flags.
//!
//! Distinct operations may overlap; a second start of an operation whose
//! flag is still set is refused.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Identifies one kind of call a screen can have in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationKey {
    /// Collection reload.
    List,
    /// Record creation.
    Create,
    /// Record update.
    Update,
    /// Deletion of one record.
    Delete(String),
    /// A diagnostic probe, by name.
    Probe(String),
}

impl OperationKey {
    /// Key for deleting the record `id`.
    #[must_use]
    pub fn delete(id: impl fmt::Display) -> Self {
        Self::Delete(id.to_string())
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => f.write_str("list"),
            Self::Create => f.write_str("create"),
            Self::Update => f.write_str("update"),
            Self::Delete(id) => write!(f, "delete:{id}"),
            Self::Probe(name) => f.write_str(name),
        }
    }
}

/// Set of operations currently running.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<Mutex<HashSet<OperationKey>>>,
}

impl InFlight {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as running, or returns `None` if it already is.
    ///
    /// The flag is released when the guard drops.
    #[must_use]
    pub fn try_begin(&self, key: OperationKey) -> Option<InFlightGuard> {
        if !self.active.lock().insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            key,
            active: Arc::clone(&self.active),
        })
    }

    /// Returns true while `key` is running.
    #[must_use]
    pub fn is_active(&self, key: &OperationKey) -> bool {
        self.active.lock().contains(key)
    }

    /// Running operations, sorted by name.
    #[must_use]
    pub fn active(&self) -> Vec<OperationKey> {
        let mut keys: Vec<_> = self.active.lock().iter().cloned().collect();
        keys.sort_by_key(ToString::to_string);
        keys
    }
}

/// Releases its operation flag on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    key: OperationKey,
    active: Arc<Mutex<HashSet<OperationKey>>>,
}

impl InFlightGuard {
    /// The operation this guard holds.
    #[must_use]
    pub const fn key(&self) -> &OperationKey {
        &self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active.lock().remove(&self.key);
    }
}
