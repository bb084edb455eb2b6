//! Carrier taxonomy: the six propagation mechanisms and their lifecycle
//! states.
//!
//! The enums here are pure data — the carrier implementations live in the
//! `taintwire-carriers` crate. They are shared because scenario specs,
//! report records, and the CLI all need to name carrier kinds without
//! depending on the implementations.

use crate::error::TaintwireError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The propagation mechanism a scenario exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarrierKind {
    /// The value is passed by argument, no storage at all.
    Direct,
    /// Per-request context map, lifetime of one request.
    RequestScopedContext,
    /// Process-wide shared map behind a read/write lock. Last writer wins;
    /// state leaks across requests unless explicitly reset.
    ProcessGlobalStore,
    /// One-shot channel hand-off to a concurrently scheduled consumer.
    AsyncHandoff,
    /// RPC-style multi-valued string metadata, lifetime of one call.
    MetadataBridge,
    /// Pub/sub fan-out to registered subscribers, best-effort, no replay.
    BroadcastChannel,
}

impl CarrierKind {
    /// All carrier kinds, in the order the standard registry enumerates them.
    pub const ALL: [CarrierKind; 6] = [
        CarrierKind::Direct,
        CarrierKind::RequestScopedContext,
        CarrierKind::ProcessGlobalStore,
        CarrierKind::AsyncHandoff,
        CarrierKind::MetadataBridge,
        CarrierKind::BroadcastChannel,
    ];

    /// Whether the consuming side runs on a separately scheduled task.
    pub fn crosses_task_boundary(&self) -> bool {
        matches!(
            self,
            CarrierKind::AsyncHandoff | CarrierKind::BroadcastChannel
        )
    }

    /// Whether the carrier is single-use (`Empty → Populated → Consumed`,
    /// terminal) as opposed to re-enterable (`Empty ⇄ Populated`).
    pub fn is_single_use(&self) -> bool {
        matches!(
            self,
            CarrierKind::Direct | CarrierKind::AsyncHandoff | CarrierKind::MetadataBridge
        )
    }
}

impl fmt::Display for CarrierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CarrierKind::Direct => write!(f, "direct"),
            CarrierKind::RequestScopedContext => write!(f, "request_scoped_context"),
            CarrierKind::ProcessGlobalStore => write!(f, "process_global_store"),
            CarrierKind::AsyncHandoff => write!(f, "async_handoff"),
            CarrierKind::MetadataBridge => write!(f, "metadata_bridge"),
            CarrierKind::BroadcastChannel => write!(f, "broadcast_channel"),
        }
    }
}

impl FromStr for CarrierKind {
    type Err = TaintwireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(CarrierKind::Direct),
            "request_scoped_context" => Ok(CarrierKind::RequestScopedContext),
            "process_global_store" => Ok(CarrierKind::ProcessGlobalStore),
            "async_handoff" => Ok(CarrierKind::AsyncHandoff),
            "metadata_bridge" => Ok(CarrierKind::MetadataBridge),
            "broadcast_channel" => Ok(CarrierKind::BroadcastChannel),
            other => Err(TaintwireError::UnknownCarrier(other.to_string())),
        }
    }
}

/// Lifecycle state of a carrier instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarrierState {
    /// No value stored yet.
    #[default]
    Empty,
    /// A value has been put and not yet consumed.
    Populated,
    /// The value was taken out; terminal for single-use carriers.
    Consumed,
}

/// When the consuming side of a broadcast scenario registers relative to
/// the producer's `put`. Subscribing after `put` never observes the value
/// (no replay) — the registry exercises both orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Subscriber is registered before the producer publishes.
    SubscribeBeforePut,
    /// Subscriber registers only after the producer has published.
    SubscribeAfterPut,
}
