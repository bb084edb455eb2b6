//! Request-scoped context carrier — per-request key/value storage.
//!
//! Models the middleware-context idiom: ingress middleware stashes the
//! extracted host under a key on the request's context, and a handler
//! further down the chain reads it back. The store itself is shared and
//! concurrent (many requests in flight), but each [`RequestContext`] handle
//! scopes reads and writes to a single request id, and the entry is cleared
//! when the request ends.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use taintwire_types::carrier::CarrierState;
use taintwire_types::taint::TaintValue;
use tracing::debug;
use uuid::Uuid;

/// Shared store of per-request context maps, keyed by request id.
#[derive(Debug, Clone, Default)]
pub struct RequestContextStore {
    entries: Arc<DashMap<Uuid, HashMap<String, TaintValue>>>,
}

impl RequestContextStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a context handle for a new simulated request.
    pub fn begin_request(&self) -> RequestContext {
        RequestContext {
            request_id: Uuid::new_v4(),
            store: self.clone(),
        }
    }

    /// Number of requests currently holding context entries.
    pub fn live_requests(&self) -> usize {
        self.entries.len()
    }
}

/// Context handle scoped to one request. Dropping the handle ends the
/// request and clears its entry from the shared store.
#[derive(Debug)]
pub struct RequestContext {
    request_id: Uuid,
    store: RequestContextStore,
}

impl RequestContext {
    /// The id of the simulated request this handle is scoped to.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Store a value under `key`, overwriting any prior value (the carrier
    /// is re-enterable within the request's lifetime).
    pub fn put(&self, key: &str, value: TaintValue) {
        debug!(request_id = %self.request_id, key, host = %value.value, "context put");
        self.store
            .entries
            .entry(self.request_id)
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Read back a copy of the value under `key`, if present.
    pub fn get(&self, key: &str) -> Option<TaintValue> {
        self.store
            .entries
            .get(&self.request_id)
            .and_then(|values| values.get(key).cloned())
    }

    /// Lifecycle state of this request's context entry.
    pub fn state(&self) -> CarrierState {
        match self.store.entries.get(&self.request_id) {
            Some(values) if !values.is_empty() => CarrierState::Populated,
            _ => CarrierState::Empty,
        }
    }
}

impl Drop for RequestContext {
    fn drop(&mut self) {
        self.store.entries.remove(&self.request_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taintwire_types::taint::TaintOrigin;

    #[test]
    fn test_round_trip() {
        let store = RequestContextStore::new();
        let ctx = store.begin_request();
        assert_eq!(ctx.state(), CarrierState::Empty);

        let value = TaintValue::new("evil.com", TaintOrigin::ForwardedHostHeader);
        ctx.put("reset_host", value.clone());
        assert_eq!(ctx.state(), CarrierState::Populated);
        assert_eq!(ctx.get("reset_host").unwrap(), value);

        // Re-enterable: reading does not consume
        assert_eq!(ctx.get("reset_host").unwrap(), value);
    }

    #[test]
    fn test_overwrite_wins() {
        let store = RequestContextStore::new();
        let ctx = store.begin_request();
        ctx.put("reset_host", TaintValue::new("good.com", TaintOrigin::HostHeader));
        ctx.put(
            "reset_host",
            TaintValue::new("evil.com", TaintOrigin::ForwardedHostHeader),
        );
        assert_eq!(ctx.get("reset_host").unwrap().value, "evil.com");
    }

    #[test]
    fn test_requests_are_isolated() {
        let store = RequestContextStore::new();
        let a = store.begin_request();
        let b = store.begin_request();
        a.put("reset_host", TaintValue::new("evil.com", TaintOrigin::HostHeader));

        assert!(b.get("reset_host").is_none());
        assert_eq!(store.live_requests(), 1);
    }

    #[test]
    fn test_drop_clears_entry() {
        let store = RequestContextStore::new();
        {
            let ctx = store.begin_request();
            ctx.put("reset_host", TaintValue::new("evil.com", TaintOrigin::HostHeader));
            assert_eq!(store.live_requests(), 1);
        }
        assert_eq!(store.live_requests(), 0);
    }
}
