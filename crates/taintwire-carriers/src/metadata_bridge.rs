//! Metadata bridge carrier — RPC-style multi-valued string metadata.
//!
//! Models the gRPC-interceptor idiom: the tainted host is smuggled across
//! a call boundary as string metadata (`x-reset-host`) rather than as a
//! typed value. Metadata values are lists of strings with only the first
//! element significant, so provenance has to be encoded alongside the host
//! and reconstructed on the far side. Lifetime is one call: the bridge is
//! single-use.

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use taintwire_types::carrier::CarrierState;
use taintwire_types::taint::{TaintOrigin, TaintValue};
use tracing::{debug, warn};

/// Metadata key carrying the host string itself.
pub const HOST_KEY: &str = "x-reset-host";
/// Metadata key carrying the taint origin.
pub const ORIGIN_KEY: &str = "x-taint-origin";
/// Metadata key carrying the capture timestamp (RFC 3339, nanoseconds).
pub const CAPTURED_AT_KEY: &str = "x-captured-at";

/// Single-use string-metadata bridge.
#[derive(Debug, Default)]
pub struct MetadataBridge {
    entries: Mutex<HashMap<String, Vec<String>>>,
    state: Mutex<CarrierState>,
}

impl MetadataBridge {
    /// Create an empty bridge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode the value into metadata entries. A second `put` is ignored —
    /// the bridge spans exactly one call.
    pub fn put(&self, value: TaintValue) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state != CarrierState::Empty {
            return;
        }
        debug!(host = %value.value, "metadata bridge put");
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .entry(HOST_KEY.to_string())
            .or_default()
            .push(value.value.clone());
        entries
            .entry(ORIGIN_KEY.to_string())
            .or_default()
            .push(value.origin.to_string());
        entries.entry(CAPTURED_AT_KEY.to_string()).or_default().push(
            value
                .captured_at
                .to_rfc3339_opts(SecondsFormat::Nanos, true),
        );
        *state = CarrierState::Populated;
    }

    /// Append an extra raw value under a metadata key. Later elements are
    /// carried but never significant — `get` reads the first element only.
    pub fn append(&self, key: &str, raw: impl Into<String>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.entry(key.to_string()).or_default().push(raw.into());
    }

    /// Decode the value back out, transitioning to `Consumed`.
    pub fn get(&self) -> Option<TaintValue> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state != CarrierState::Populated {
            return None;
        }
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        let host = entries.get(HOST_KEY)?.first()?.clone();
        let origin: TaintOrigin = match entries
            .get(ORIGIN_KEY)
            .and_then(|values| values.first())
            .map(|raw| raw.parse())
        {
            Some(Ok(origin)) => origin,
            _ => {
                warn!(host = %host, "metadata bridge missing or invalid origin entry");
                return None;
            }
        };
        let captured_at = match entries
            .get(CAPTURED_AT_KEY)
            .and_then(|values| values.first())
            .map(|raw| DateTime::parse_from_rfc3339(raw))
        {
            Some(Ok(ts)) => ts.with_timezone(&Utc),
            _ => {
                warn!(host = %host, "metadata bridge missing or invalid timestamp entry");
                return None;
            }
        };

        *state = CarrierState::Consumed;
        Some(TaintValue {
            value: host,
            origin,
            captured_at,
        })
    }

    /// Snapshot of the raw metadata map (for verification).
    pub fn metadata(&self) -> HashMap<String, Vec<String>> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CarrierState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_preserves_provenance() {
        let bridge = MetadataBridge::new();
        let value = TaintValue::new("evil.com", TaintOrigin::ForwardedHostHeader);
        bridge.put(value.clone());
        assert_eq!(bridge.state(), CarrierState::Populated);

        let out = bridge.get().unwrap();
        assert_eq!(out, value);
        assert_eq!(bridge.state(), CarrierState::Consumed);
    }

    #[test]
    fn test_first_element_is_significant() {
        let bridge = MetadataBridge::new();
        bridge.put(TaintValue::new("evil.com", TaintOrigin::HostHeader));
        bridge.append(HOST_KEY, "second.example");

        assert_eq!(bridge.metadata()[HOST_KEY], vec!["evil.com", "second.example"]);
        assert_eq!(bridge.get().unwrap().value, "evil.com");
    }

    #[test]
    fn test_single_use() {
        let bridge = MetadataBridge::new();
        bridge.put(TaintValue::new("evil.com", TaintOrigin::HostHeader));
        assert!(bridge.get().is_some());
        assert!(bridge.get().is_none());

        // put after consumption is ignored
        bridge.put(TaintValue::new("other.com", TaintOrigin::HostHeader));
        assert_eq!(bridge.state(), CarrierState::Consumed);
    }

    #[test]
    fn test_get_on_empty() {
        let bridge = MetadataBridge::new();
        assert!(bridge.get().is_none());
        assert_eq!(bridge.state(), CarrierState::Empty);
    }
}
