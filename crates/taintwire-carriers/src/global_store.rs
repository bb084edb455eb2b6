//! Process-global store carrier — the cross-request leakage hazard.
//!
//! Models the package-level shared map several of the vulnerable samples
//! use: ingress writes the extracted host into a process-wide map and a
//! later handler (possibly serving a different user's request) reads it
//! back. Last writer wins, and state persists across scenario runs until
//! [`reset_process_global_store`] is called. The leakage is the subject
//! under test, so it is reproduced here deliberately rather than designed
//! away; the reset hook exists so the harness can control its lifecycle.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};
use taintwire_types::carrier::CarrierState;
use taintwire_types::taint::TaintValue;
use tracing::debug;

static STORE: OnceLock<ProcessGlobalStore> = OnceLock::new();

/// The process-wide singleton.
pub fn process_global_store() -> &'static ProcessGlobalStore {
    STORE.get_or_init(ProcessGlobalStore::new)
}

/// Maintenance hook: clear all entries. The scenario registry calls this
/// between runs to keep them independent.
pub fn reset_process_global_store() {
    process_global_store().reset();
}

/// Process-wide key/value map of tainted hosts, mutated under a
/// read/write lock.
#[derive(Debug, Default)]
pub struct ProcessGlobalStore {
    entries: RwLock<HashMap<String, TaintValue>>,
}

impl ProcessGlobalStore {
    fn new() -> Self {
        Self::default()
    }

    /// Store a value under `key`. Last writer wins; the value stays visible
    /// to every subsequent reader in the process until overwritten or reset.
    pub fn put(&self, key: &str, value: TaintValue) {
        debug!(key, host = %value.value, "global store put");
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value);
    }

    /// Read back a copy of the value under `key`, if present.
    pub fn get(&self, key: &str) -> Option<TaintValue> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    /// Clear all entries.
    pub fn reset(&self) {
        debug!("global store reset");
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    /// Lifecycle state: `Populated` while any entry exists.
    pub fn state(&self) -> CarrierState {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        if entries.is_empty() {
            CarrierState::Empty
        } else {
            CarrierState::Populated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taintwire_types::taint::TaintOrigin;

    // These tests share the process-wide singleton, so each uses its own
    // key and resets through a fresh local store where isolation matters.

    #[test]
    fn test_round_trip_and_overwrite() {
        let store = ProcessGlobalStore::new();
        assert_eq!(store.state(), CarrierState::Empty);

        let first = TaintValue::new("good.com", TaintOrigin::HostHeader);
        store.put("reset_host", first);
        let second = TaintValue::new("evil.com", TaintOrigin::ForwardedHostHeader);
        store.put("reset_host", second.clone());

        // Last writer wins
        assert_eq!(store.get("reset_host").unwrap(), second);
        assert_eq!(store.state(), CarrierState::Populated);
    }

    #[test]
    fn test_leaks_until_reset() {
        let store = ProcessGlobalStore::new();
        store.put(
            "reset_host",
            TaintValue::new("evil.com", TaintOrigin::ForwardedHostHeader),
        );

        // A "second request" that writes nothing still observes the value
        assert_eq!(store.get("reset_host").unwrap().value, "evil.com");

        store.reset();
        assert!(store.get("reset_host").is_none());
        assert_eq!(store.state(), CarrierState::Empty);
    }

    #[test]
    fn test_singleton_reset_hook() {
        process_global_store().put(
            "singleton_probe",
            TaintValue::new("evil.com", TaintOrigin::HostHeader),
        );
        assert!(process_global_store().get("singleton_probe").is_some());

        reset_process_global_store();
        assert!(process_global_store().get("singleton_probe").is_none());
    }
}
