//! Scenario outcomes and the aggregate run report.

use crate::carrier::CarrierKind;
use crate::taint::Artifact;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Outcome of a single scenario run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioStatus {
    /// The sink received the expected tainted value.
    Pass,
    /// The consuming side timed out waiting for delivery.
    CarrierStalled,
    /// The value the sink received diverges from what the source produced
    /// (or nothing arrived at all where something was expected).
    PropagationMismatch,
    /// The scenario spec was rejected before any task was scheduled.
    ConfigurationError,
}

impl ScenarioStatus {
    /// Whether this outcome counts as a successful propagation.
    pub fn is_pass(&self) -> bool {
        matches!(self, ScenarioStatus::Pass)
    }
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioStatus::Pass => write!(f, "pass"),
            ScenarioStatus::CarrierStalled => write!(f, "carrier-stalled"),
            ScenarioStatus::PropagationMismatch => write!(f, "propagation-mismatch"),
            ScenarioStatus::ConfigurationError => write!(f, "configuration-error"),
        }
    }
}

/// One line of the aggregate report: what ran, over which carrier, and how
/// it ended. Failed scenarios are recorded with the same shape as passing
/// ones so partial failure never hides successful runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRecord {
    /// Unique id assigned when the scenario was instantiated.
    pub scenario_id: Uuid,
    /// The carrier the scenario exercised.
    pub carrier: CarrierKind,
    /// Driver-supplied label (e.g. "poisoned/async_handoff").
    pub label: String,
    /// Outcome classification.
    pub status: ScenarioStatus,
    /// The artifact the sink produced, when delivery reached the sink.
    pub artifact: Option<Artifact>,
    /// Human-readable detail for non-pass outcomes.
    pub detail: Option<String>,
}

/// Ordered collection of every scenario the registry attempted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    /// Records in execution order.
    pub records: Vec<ScenarioRecord>,
}

impl Report {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    pub fn push(&mut self, record: ScenarioRecord) {
        self.records.push(record);
    }

    /// Number of scenarios that passed.
    pub fn passed(&self) -> usize {
        self.records.iter().filter(|r| r.status.is_pass()).count()
    }

    /// Number of scenarios that did not pass.
    pub fn failed(&self) -> usize {
        self.records.len() - self.passed()
    }

    /// `true` when every attempted scenario passed.
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            write!(
                f,
                "{:<22} {:<34} {}",
                record.carrier.to_string(),
                record.label,
                record.status
            )?;
            if let Some(detail) = &record.detail {
                write!(f, "  ({detail})")?;
            }
            writeln!(f)?;
        }
        write!(
            f,
            "{} scenarios: {} passed, {} failed",
            self.records.len(),
            self.passed(),
            self.failed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taint::TaintOrigin;

    fn record(status: ScenarioStatus) -> ScenarioRecord {
        ScenarioRecord {
            scenario_id: Uuid::new_v4(),
            carrier: CarrierKind::Direct,
            label: "test".to_string(),
            status,
            artifact: Some(Artifact {
                rendered_link: "http://good.com/reset/tok".to_string(),
                email_body: "<p>Reset your password: <a href='http://good.com/reset/tok'>http://good.com/reset/tok</a></p>".to_string(),
                recorded_origin: TaintOrigin::HostHeader,
            }),
            detail: None,
        }
    }

    #[test]
    fn test_counts() {
        let mut report = Report::new();
        report.push(record(ScenarioStatus::Pass));
        report.push(record(ScenarioStatus::CarrierStalled));
        report.push(record(ScenarioStatus::Pass));

        assert_eq!(report.passed(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.all_passed());
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&ScenarioStatus::PropagationMismatch).unwrap();
        assert_eq!(json, "\"propagation-mismatch\"");
        let json = serde_json::to_string(&ScenarioStatus::CarrierStalled).unwrap();
        assert_eq!(json, "\"carrier-stalled\"");
    }

    #[test]
    fn test_display_includes_summary() {
        let mut report = Report::new();
        report.push(record(ScenarioStatus::Pass));
        let text = report.to_string();
        assert!(text.contains("1 scenarios: 1 passed, 0 failed"));
    }
}
