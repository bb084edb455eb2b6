//! Direct carrier — the value is handed straight from source to sink.
//!
//! This is the degenerate case: no shared storage, no concurrency boundary,
//! just an owned slot standing in for "passed by argument". It exists so
//! the harness can exercise the same put/get contract against the simplest
//! possible propagation shape.

use taintwire_types::carrier::CarrierState;
use taintwire_types::taint::TaintValue;

/// Single-use in-place slot. `get` moves the value out; the carrier is
/// terminal once consumed.
#[derive(Debug, Default)]
pub struct DirectCarrier {
    slot: Option<TaintValue>,
    consumed: bool,
}

impl DirectCarrier {
    /// Create an empty carrier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the value. A second `put` after consumption is ignored —
    /// the carrier is terminal.
    pub fn put(&mut self, value: TaintValue) {
        if self.consumed {
            return;
        }
        self.slot = Some(value);
    }

    /// Take the value out, transitioning to `Consumed`.
    pub fn get(&mut self) -> Option<TaintValue> {
        let value = self.slot.take();
        if value.is_some() {
            self.consumed = true;
        }
        value
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CarrierState {
        if self.consumed {
            CarrierState::Consumed
        } else if self.slot.is_some() {
            CarrierState::Populated
        } else {
            CarrierState::Empty
        }
    }
}
