//! Async hand-off carrier — one-shot channel across a task boundary.
//!
//! Models the goroutine/channel idiom: the request task sends the
//! extracted host down a channel and a concurrently scheduled worker picks
//! it up to build and "send" the reset email. The consuming side blocks
//! until the value arrives or a cancellation token fires; cancellation
//! means "carrier drained without delivery", not a fatal error, and never
//! leaves the carrier partially mutated.

use std::sync::Mutex as StdMutex;
use taintwire_types::carrier::CarrierState;
use taintwire_types::taint::TaintValue;
use tokio::sync::{oneshot, watch, Mutex};
use tracing::debug;

/// Single-use one-shot hand-off between two tasks.
#[derive(Debug)]
pub struct AsyncHandoff {
    tx: StdMutex<Option<oneshot::Sender<TaintValue>>>,
    rx: Mutex<Option<oneshot::Receiver<TaintValue>>>,
    state: StdMutex<CarrierState>,
}

impl AsyncHandoff {
    /// Create an empty hand-off pair.
    pub fn new() -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            tx: StdMutex::new(Some(tx)),
            rx: Mutex::new(Some(rx)),
            state: StdMutex::new(CarrierState::Empty),
        }
    }

    /// Send the value to whichever task performs (or will perform) the
    /// `get`. A second `put` is ignored — the channel is one-shot.
    pub fn put(&self, value: TaintValue) {
        let sender = self
            .tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let Some(sender) = sender else {
            return;
        };
        debug!(host = %value.value, "handoff put");
        // The receiver lives in `self`, so the send cannot fail while the
        // carrier is alive; a dropped-receiver race is still non-fatal.
        if sender.send(value).is_ok() {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            *state = CarrierState::Populated;
        }
    }

    /// Await the value, or give up when `cancel` fires.
    ///
    /// On cancellation returns `None` and puts the receiver back, leaving
    /// the carrier `Populated` (if `put` already happened) or `Empty` —
    /// a later `get` can still drain it.
    pub async fn get(&self, mut cancel: watch::Receiver<bool>) -> Option<TaintValue> {
        let mut slot = self.rx.lock().await;
        let mut receiver = slot.take()?;

        // Biased: an already-fired token wins over an already-sent value,
        // so cancelled gets behave deterministically.
        tokio::select! {
            biased;
            _ = cancel.changed() => {
                debug!("handoff get cancelled");
                *slot = Some(receiver);
                None
            }
            result = &mut receiver => match result {
                Ok(value) => {
                    let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                    *state = CarrierState::Consumed;
                    debug!(host = %value.value, "handoff get");
                    Some(value)
                }
                // Sender dropped without a put: drained without delivery.
                Err(_) => None,
            },
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CarrierState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for AsyncHandoff {
    fn default() -> Self {
        Self::new()
    }
}
