//! Broadcast carrier — pub/sub fan-out to registered subscribers.
//!
//! Models the WebSocket connection-store idiom: a producer publishes the
//! tainted host to every currently connected subscriber. Delivery is
//! best-effort and fire-and-forget: publishing with zero subscribers is
//! not an error, there is no replay for late subscribers, and no ordering
//! is guaranteed across subscribers.

use std::sync::Mutex;
use taintwire_types::carrier::CarrierState;
use taintwire_types::taint::TaintValue;
use tokio::sync::{broadcast, watch};
use tracing::debug;

/// Buffered capacity per subscriber.
const CHANNEL_CAPACITY: usize = 16;

/// Re-enterable broadcast fan-out.
#[derive(Debug)]
pub struct BroadcastCarrier {
    sender: broadcast::Sender<TaintValue>,
    /// Last published value, kept for state observability only.
    last: Mutex<Option<TaintValue>>,
}

impl BroadcastCarrier {
    /// Create a carrier with no subscribers.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            last: Mutex::new(None),
        }
    }

    /// Register a subscriber. Only values published after this call are
    /// delivered — there is no replay.
    pub fn subscribe(&self) -> broadcast::Receiver<TaintValue> {
        self.sender.subscribe()
    }

    /// Publish a copy of the value to every registered subscriber.
    /// Fire-and-forget: zero subscribers is not an error.
    pub fn put(&self, value: TaintValue) {
        let delivered = self.sender.send(value.clone()).unwrap_or(0);
        debug!(host = %value.value, subscribers = delivered, "broadcast put");
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        *last = Some(value);
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Await the next value on a subscription, or give up when `cancel`
    /// fires. Returns `None` on cancellation or a closed channel.
    pub async fn recv(
        receiver: &mut broadcast::Receiver<TaintValue>,
        mut cancel: watch::Receiver<bool>,
    ) -> Option<TaintValue> {
        tokio::select! {
            biased;
            _ = cancel.changed() => {
                debug!("broadcast recv cancelled");
                None
            }
            result = receiver.recv() => result.ok(),
        }
    }

    /// Lifecycle state: `Populated` once anything has been published.
    /// Re-enterable — a later `put` overwrites.
    pub fn state(&self) -> CarrierState {
        let last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if last.is_some() {
            CarrierState::Populated
        } else {
            CarrierState::Empty
        }
    }
}

impl Default for BroadcastCarrier {
    fn default() -> Self {
        Self::new()
    }
}
