//! One scenario: a carrier kind bound to a header set, exercised once.
//!
//! A scenario runs the full source→carrier→sink path and classifies the
//! outcome. Concurrency-crossing carriers (`AsyncHandoff`,
//! `BroadcastChannel`) hand the consuming side to a spawned task and await
//! it under a bounded timeout; everything else runs inline.

use crate::extractor::{headers, Headers, SourceExtractor};
use crate::sink::SinkConsumer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use taintwire_carriers::{
    cancel_pair, process_global_store, AsyncHandoff, BroadcastCarrier, DirectCarrier,
    MetadataBridge, RequestContextStore,
};
use taintwire_types::carrier::{CarrierKind, DeliveryMode};
use taintwire_types::error::{TaintwireError, TaintwireResult};
use taintwire_types::report::{ScenarioRecord, ScenarioStatus};
use taintwire_types::taint::{TaintOrigin, TaintValue};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

/// Key under which keyed carriers store the extracted host.
pub const CONTEXT_KEY: &str = "reset_host";

/// Driver-supplied description of one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// Human-readable label carried into the report.
    pub label: String,
    /// Which carrier to exercise.
    pub kind: CarrierKind,
    /// Simulated inbound request headers.
    pub headers: Headers,
    /// The origin the sink is expected to record.
    pub expected_origin: TaintOrigin,
    /// Subscriber registration order, for broadcast scenarios.
    pub delivery: DeliveryMode,
    /// Fault injection: skip the producer's `put` so the timeout and
    /// drain paths can be exercised deliberately.
    #[serde(default)]
    pub withhold_put: bool,
}

impl ScenarioSpec {
    /// The poisoned header set every carrier is exercised with:
    /// `X-Forwarded-Host` overrides `Host`.
    pub fn poisoned(kind: CarrierKind) -> Self {
        Self {
            label: format!("poisoned/{kind}"),
            kind,
            headers: headers(&[("Host", "good.com"), ("X-Forwarded-Host", "evil.com")]),
            expected_origin: TaintOrigin::ForwardedHostHeader,
            delivery: DeliveryMode::SubscribeBeforePut,
            withhold_put: false,
        }
    }

    /// A clean header set: `Host` only, no forwarded header.
    pub fn clean(kind: CarrierKind) -> Self {
        Self {
            label: format!("clean/{kind}"),
            kind,
            headers: headers(&[("Host", "good.com")]),
            expected_origin: TaintOrigin::HostHeader,
            delivery: DeliveryMode::SubscribeBeforePut,
            withhold_put: false,
        }
    }

    /// Broadcast with the subscriber registering only after the publish:
    /// no replay, so the sink never sees the value.
    pub fn late_subscriber() -> Self {
        Self {
            label: "late-subscriber/broadcast_channel".to_string(),
            kind: CarrierKind::BroadcastChannel,
            headers: headers(&[("Host", "good.com"), ("X-Forwarded-Host", "evil.com")]),
            expected_origin: TaintOrigin::ForwardedHostHeader,
            delivery: DeliveryMode::SubscribeAfterPut,
            withhold_put: false,
        }
    }

    /// Reject malformed specs before any task is scheduled.
    pub fn validate(&self) -> TaintwireResult<()> {
        if self.label.trim().is_empty() {
            return Err(TaintwireError::InvalidScenario {
                label: self.label.clone(),
                reason: "label must not be empty".to_string(),
            });
        }
        if self.headers.iter().any(|(name, _)| name.trim().is_empty()) {
            return Err(TaintwireError::InvalidScenario {
                label: self.label.clone(),
                reason: "header names must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// What came out of the carrier's consuming side.
enum Delivery {
    /// A value arrived.
    Value(TaintValue),
    /// The carrier was drained without delivery (cancellation, no replay).
    Drained,
    /// The bounded wait expired with the consumer still blocked.
    Stalled,
}

/// One instantiated scenario, ready to run.
pub struct Scenario {
    id: Uuid,
    spec: ScenarioSpec,
}

impl Scenario {
    /// Instantiate a scenario from its spec, assigning a fresh id.
    pub fn new(spec: ScenarioSpec) -> Self {
        Self {
            id: Uuid::new_v4(),
            spec,
        }
    }

    /// The id assigned at instantiation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Run the full source→carrier→sink path once and classify the outcome.
    pub async fn run(&self, sink: &SinkConsumer, handoff_timeout: Duration) -> ScenarioRecord {
        let source = SourceExtractor::extract(&self.spec.headers);
        debug!(
            scenario = %self.id,
            carrier = %self.spec.kind,
            host = %source.value,
            "running scenario"
        );

        let delivery = match self.spec.kind {
            CarrierKind::Direct => self.run_direct(&source),
            CarrierKind::RequestScopedContext => self.run_request_context(&source),
            CarrierKind::ProcessGlobalStore => self.run_global_store(&source),
            CarrierKind::MetadataBridge => self.run_metadata_bridge(&source),
            CarrierKind::AsyncHandoff => self.run_async_handoff(&source, handoff_timeout).await,
            CarrierKind::BroadcastChannel => self.run_broadcast(&source, handoff_timeout).await,
        };

        self.verdict(&source, delivery, sink)
    }

    fn run_direct(&self, source: &TaintValue) -> Delivery {
        let mut carrier = DirectCarrier::new();
        if !self.spec.withhold_put {
            carrier.put(source.clone());
        }
        carrier.get().map_or(Delivery::Drained, Delivery::Value)
    }

    fn run_request_context(&self, source: &TaintValue) -> Delivery {
        let store = RequestContextStore::new();
        let ctx = store.begin_request();
        if !self.spec.withhold_put {
            ctx.put(CONTEXT_KEY, source.clone());
        }
        ctx.get(CONTEXT_KEY)
            .map_or(Delivery::Drained, Delivery::Value)
    }

    fn run_global_store(&self, source: &TaintValue) -> Delivery {
        let store = process_global_store();
        if !self.spec.withhold_put {
            store.put(CONTEXT_KEY, source.clone());
        }
        // Whatever the store currently holds is what the handler sees —
        // including a value left behind by an earlier, un-reset scenario.
        store
            .get(CONTEXT_KEY)
            .map_or(Delivery::Drained, Delivery::Value)
    }

    fn run_metadata_bridge(&self, source: &TaintValue) -> Delivery {
        let bridge = MetadataBridge::new();
        if !self.spec.withhold_put {
            bridge.put(source.clone());
        }
        bridge.get().map_or(Delivery::Drained, Delivery::Value)
    }

    async fn run_async_handoff(&self, source: &TaintValue, bound: Duration) -> Delivery {
        let carrier = Arc::new(AsyncHandoff::new());
        let (cancel_tx, cancel_rx) = cancel_pair();

        let consumer = {
            let carrier = carrier.clone();
            tokio::spawn(async move { carrier.get(cancel_rx).await })
        };

        if !self.spec.withhold_put {
            carrier.put(source.clone());
        }
        await_consumer(consumer, cancel_tx, bound).await
    }

    async fn run_broadcast(&self, source: &TaintValue, bound: Duration) -> Delivery {
        let carrier = BroadcastCarrier::new();
        let (cancel_tx, cancel_rx) = cancel_pair();

        match self.spec.delivery {
            DeliveryMode::SubscribeBeforePut => {
                let mut receiver = carrier.subscribe();
                let consumer = tokio::spawn(async move {
                    BroadcastCarrier::recv(&mut receiver, cancel_rx).await
                });
                if !self.spec.withhold_put {
                    carrier.put(source.clone());
                }
                await_consumer(consumer, cancel_tx, bound).await
            }
            DeliveryMode::SubscribeAfterPut => {
                if !self.spec.withhold_put {
                    carrier.put(source.clone());
                }
                let mut receiver = carrier.subscribe();
                let consumer = tokio::spawn(async move {
                    BroadcastCarrier::recv(&mut receiver, cancel_rx).await
                });
                // No replay exists for a late subscriber; drain immediately
                // rather than letting the bounded wait expire.
                let _ = cancel_tx.send(true);
                match consumer.await {
                    Ok(Some(value)) => Delivery::Value(value),
                    _ => Delivery::Drained,
                }
            }
        }
    }

    fn verdict(
        &self,
        source: &TaintValue,
        delivery: Delivery,
        sink: &SinkConsumer,
    ) -> ScenarioRecord {
        let (status, artifact, detail) = match delivery {
            Delivery::Stalled => (
                ScenarioStatus::CarrierStalled,
                None,
                Some("timed out waiting for delivery".to_string()),
            ),
            Delivery::Drained => (
                ScenarioStatus::PropagationMismatch,
                None,
                Some("carrier drained without delivery".to_string()),
            ),
            Delivery::Value(received) => {
                let artifact = sink.consume(&received);
                if received.value != source.value {
                    let detail = format!(
                        "sink received '{}' but source produced '{}'",
                        received.value, source.value
                    );
                    (ScenarioStatus::PropagationMismatch, Some(artifact), Some(detail))
                } else if artifact.recorded_origin != self.spec.expected_origin {
                    let detail = format!(
                        "recorded origin {} but expected {}",
                        artifact.recorded_origin, self.spec.expected_origin
                    );
                    (ScenarioStatus::PropagationMismatch, Some(artifact), Some(detail))
                } else if !artifact.rendered_link.contains(&source.value) {
                    let detail = format!(
                        "rendered link '{}' does not contain '{}'",
                        artifact.rendered_link, source.value
                    );
                    (ScenarioStatus::PropagationMismatch, Some(artifact), Some(detail))
                } else {
                    (ScenarioStatus::Pass, Some(artifact), None)
                }
            }
        };

        ScenarioRecord {
            scenario_id: self.id,
            carrier: self.spec.kind,
            label: self.spec.label.clone(),
            status,
            artifact,
            detail,
        }
    }
}

/// Await a spawned consumer under a bounded timeout. On expiry, fire the
/// cancellation token, let the consumer unwind, and report a stall.
async fn await_consumer(
    mut task: JoinHandle<Option<TaintValue>>,
    cancel_tx: watch::Sender<bool>,
    bound: Duration,
) -> Delivery {
    match tokio::time::timeout(bound, &mut task).await {
        Ok(Ok(Some(value))) => Delivery::Value(value),
        Ok(Ok(None)) => Delivery::Drained,
        // Consumer task panicked: nothing was delivered.
        Ok(Err(_)) => Delivery::Drained,
        Err(_) => {
            let _ = cancel_tx.send(true);
            let _ = task.await;
            Delivery::Stalled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taintwire_carriers::reset_process_global_store;

    const TIMEOUT: Duration = Duration::from_millis(1000);

    #[tokio::test]
    async fn test_direct_clean_end_to_end() {
        let sink = SinkConsumer::new();
        let scenario = Scenario::new(ScenarioSpec::clean(CarrierKind::Direct));
        let record = scenario.run(&sink, TIMEOUT).await;

        assert_eq!(record.status, ScenarioStatus::Pass);
        let link = record.artifact.unwrap().rendered_link;
        assert!(link.contains("good.com"));
    }

    #[tokio::test]
    async fn test_request_context_poisoned_end_to_end() {
        let sink = SinkConsumer::new();
        let scenario = Scenario::new(ScenarioSpec::poisoned(CarrierKind::RequestScopedContext));
        let record = scenario.run(&sink, TIMEOUT).await;

        assert_eq!(record.status, ScenarioStatus::Pass);
        let link = record.artifact.unwrap().rendered_link;
        assert!(link.contains("evil.com"));
        assert!(!link.contains("good.com"));
    }

    #[tokio::test]
    async fn test_async_handoff_poisoned_end_to_end() {
        let sink = SinkConsumer::new();
        let scenario = Scenario::new(ScenarioSpec::poisoned(CarrierKind::AsyncHandoff));
        let record = scenario.run(&sink, TIMEOUT).await;

        assert_eq!(record.status, ScenarioStatus::Pass);
        assert!(record.artifact.unwrap().rendered_link.contains("evil.com"));
    }

    #[tokio::test]
    async fn test_late_subscriber_is_a_mismatch() {
        let sink = SinkConsumer::new();
        let scenario = Scenario::new(ScenarioSpec::late_subscriber());
        let record = scenario.run(&sink, TIMEOUT).await;

        assert_eq!(record.status, ScenarioStatus::PropagationMismatch);
        assert!(record.artifact.is_none());
        // The sink never saw the value at all
        assert!(sink.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_withheld_put_stalls_within_bound() {
        let sink = SinkConsumer::new();
        let mut spec = ScenarioSpec::poisoned(CarrierKind::AsyncHandoff);
        spec.withhold_put = true;
        let scenario = Scenario::new(spec);

        let started = tokio::time::Instant::now();
        let record = scenario.run(&sink, Duration::from_millis(50)).await;
        assert_eq!(record.status, ScenarioStatus::CarrierStalled);
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_global_store_scenario_sees_leftover_state() {
        let _guard = crate::test_support::GLOBAL_STORE_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        reset_process_global_store();
        let sink = SinkConsumer::new();

        // Scenario A leaves evil.com behind
        let a = Scenario::new(ScenarioSpec::poisoned(CarrierKind::ProcessGlobalStore));
        assert_eq!(a.run(&sink, TIMEOUT).await.status, ScenarioStatus::Pass);

        // A handler reading the store without any new put still sees it
        let mut spec = ScenarioSpec::poisoned(CarrierKind::ProcessGlobalStore);
        spec.withhold_put = true;
        spec.label = "leaked/process_global_store".to_string();
        let b = Scenario::new(spec);
        let record = b.run(&sink, TIMEOUT).await;
        assert!(record
            .artifact
            .expect("leaked value reaches the sink")
            .rendered_link
            .contains("evil.com"));

        reset_process_global_store();
    }

    #[test]
    fn test_validate_rejects_empty_label() {
        let mut spec = ScenarioSpec::clean(CarrierKind::Direct);
        spec.label = "  ".to_string();
        assert!(spec.validate().is_err());
    }
}
