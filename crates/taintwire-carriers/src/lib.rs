//! Carrier implementations — every distinct way a tainted host value moves
//! from request ingress to the reset-link sink.
//!
//! Each module implements one propagation mechanism from the carrier
//! taxonomy in `taintwire-types`. The variants share a lifecycle
//! (`Empty → Populated → Consumed` for single-use carriers,
//! `Empty ⇄ Populated` for re-enterable ones) and the invariant that a
//! stored [`taintwire_types::taint::TaintValue`] is only ever copied or
//! relayed, never mutated.

pub mod async_handoff;
pub mod broadcast;
pub mod direct;
pub mod global_store;
pub mod metadata_bridge;
pub mod request_context;

pub use async_handoff::AsyncHandoff;
pub use broadcast::BroadcastCarrier;
pub use direct::DirectCarrier;
pub use global_store::{process_global_store, reset_process_global_store, ProcessGlobalStore};
pub use metadata_bridge::MetadataBridge;
pub use request_context::{RequestContext, RequestContextStore};

use tokio::sync::watch;

/// Create a cancellation token pair. Flipping the sender to `true` releases
/// any carrier `get` currently waiting on the receiver.
pub fn cancel_pair() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}
