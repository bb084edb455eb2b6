//! Scenario registry — enumerates and runs the carrier × header matrix.
//!
//! The registry owns scenario ordering and the lifecycle of the one piece
//! of state that outlives a scenario: the process-global store, which it
//! resets before every run so scenarios stay independent. A failing
//! scenario never aborts the run; every attempt lands in the report.

use crate::scenario::{Scenario, ScenarioSpec};
use crate::sink::SinkConsumer;
use std::time::Duration;
use taintwire_carriers::reset_process_global_store;
use taintwire_types::carrier::CarrierKind;
use taintwire_types::report::{Report, ScenarioRecord, ScenarioStatus};
use tracing::{info, warn};
use uuid::Uuid;

/// Default bound on waiting for a concurrently scheduled consumer.
pub const DEFAULT_HANDOFF_TIMEOUT: Duration = Duration::from_millis(1000);

/// Enumerates scenarios and runs them to completion, collecting results.
pub struct ScenarioRegistry {
    specs: Vec<ScenarioSpec>,
    handoff_timeout: Duration,
}

impl ScenarioRegistry {
    /// An empty registry with the default hand-off timeout.
    pub fn new() -> Self {
        Self {
            specs: Vec::new(),
            handoff_timeout: DEFAULT_HANDOFF_TIMEOUT,
        }
    }

    /// The standard matrix: every carrier kind with the poisoned header
    /// set, a clean `Direct` baseline, and the late-subscriber broadcast
    /// variant.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.push(ScenarioSpec::clean(CarrierKind::Direct));
        for kind in CarrierKind::ALL {
            registry.push(ScenarioSpec::poisoned(kind));
        }
        registry.push(ScenarioSpec::late_subscriber());
        registry
    }

    /// Override the bounded wait for concurrency-crossing carriers.
    pub fn with_handoff_timeout(mut self, timeout: Duration) -> Self {
        self.handoff_timeout = timeout;
        self
    }

    /// Add a scenario to the run list.
    pub fn push(&mut self, spec: ScenarioSpec) {
        self.specs.push(spec);
    }

    /// Keep only scenarios exercising one of the given carrier kinds.
    pub fn retain_kinds(&mut self, kinds: &[CarrierKind]) {
        self.specs.retain(|spec| kinds.contains(&spec.kind));
    }

    /// Number of scenarios queued.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// `true` when no scenarios are queued.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Run every scenario in order and return the aggregate report.
    ///
    /// Malformed specs are recorded as `configuration-error` and skipped
    /// without scheduling any task; all other failures are recorded and
    /// the run continues.
    pub async fn run_all(&self) -> Report {
        let sink = SinkConsumer::new();
        let mut report = Report::new();

        for spec in &self.specs {
            // Registry's serialization responsibility: the global store is
            // the only cross-scenario state, cleared before every run.
            reset_process_global_store();

            if let Err(err) = spec.validate() {
                warn!(label = %spec.label, %err, "rejecting malformed scenario");
                report.push(ScenarioRecord {
                    scenario_id: Uuid::new_v4(),
                    carrier: spec.kind,
                    label: spec.label.clone(),
                    status: ScenarioStatus::ConfigurationError,
                    artifact: None,
                    detail: Some(err.to_string()),
                });
                continue;
            }

            let scenario = Scenario::new(spec.clone());
            let record = scenario.run(&sink, self.handoff_timeout).await;
            match record.status {
                ScenarioStatus::Pass => {
                    info!(label = %record.label, carrier = %record.carrier, "scenario passed")
                }
                status => warn!(
                    label = %record.label,
                    carrier = %record.carrier,
                    %status,
                    detail = record.detail.as_deref().unwrap_or(""),
                    "scenario failed"
                ),
            }
            report.push(record);
        }

        report
    }
}

impl Default for ScenarioRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taintwire_types::carrier::CarrierKind;

    #[tokio::test]
    async fn test_standard_matrix_outcomes() {
        let _guard = crate::test_support::GLOBAL_STORE_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        let registry = ScenarioRegistry::standard();
        let report = registry.run_all().await;

        // clean direct + six poisoned + late subscriber
        assert_eq!(report.records.len(), 8);
        // Everything propagates except the late subscriber
        assert_eq!(report.passed(), 7);
        assert_eq!(report.failed(), 1);

        let late = report
            .records
            .iter()
            .find(|r| r.label.starts_with("late-subscriber"))
            .unwrap();
        assert_eq!(late.status, ScenarioStatus::PropagationMismatch);
    }

    #[tokio::test]
    async fn test_poisoned_artifacts_contain_tainted_host() {
        let _guard = crate::test_support::GLOBAL_STORE_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        let registry = ScenarioRegistry::standard();
        let report = registry.run_all().await;

        for record in report
            .records
            .iter()
            .filter(|r| r.label.starts_with("poisoned") && r.status.is_pass())
        {
            let link = &record.artifact.as_ref().unwrap().rendered_link;
            assert!(link.contains("evil.com"), "{}: {link}", record.label);
            assert!(!link.contains("good.com"), "{}: {link}", record.label);
        }
    }

    #[tokio::test]
    async fn test_malformed_spec_is_skipped_not_fatal() {
        let _guard = crate::test_support::GLOBAL_STORE_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        let mut registry = ScenarioRegistry::new();
        let mut bad = ScenarioSpec::clean(CarrierKind::Direct);
        bad.label = String::new();
        registry.push(bad);
        registry.push(ScenarioSpec::clean(CarrierKind::Direct));

        let report = registry.run_all().await;
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].status, ScenarioStatus::ConfigurationError);
        assert_eq!(report.records[1].status, ScenarioStatus::Pass);
    }

    #[tokio::test]
    async fn test_retain_kinds_filters() {
        let _guard = crate::test_support::GLOBAL_STORE_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        let mut registry = ScenarioRegistry::standard();
        registry.retain_kinds(&[CarrierKind::Direct]);
        assert_eq!(registry.len(), 2); // clean + poisoned

        let report = registry.run_all().await;
        assert!(report.all_passed());
    }

    #[tokio::test]
    async fn test_reset_between_scenarios_keeps_runs_independent() {
        let _guard = crate::test_support::GLOBAL_STORE_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        // A poisoned global-store run followed by a clean one: without the
        // per-scenario reset the second would observe evil.com and fail
        // its origin check.
        let mut registry = ScenarioRegistry::new();
        registry.push(ScenarioSpec::poisoned(CarrierKind::ProcessGlobalStore));
        registry.push(ScenarioSpec::clean(CarrierKind::ProcessGlobalStore));

        let report = registry.run_all().await;
        assert!(report.all_passed());
        let clean = &report.records[1];
        assert!(clean
            .artifact
            .as_ref()
            .unwrap()
            .rendered_link
            .contains("good.com"));
    }
}
