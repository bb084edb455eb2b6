//! Scenario harness for the taintwire carrier corpus.
//!
//! Wires the pieces together: a [`extractor::SourceExtractor`] derives a
//! tainted host from simulated request headers, a carrier moves it across
//! whatever boundary its kind models, and a [`sink::SinkConsumer`] builds
//! the password-reset link at the far end. The [`registry::ScenarioRegistry`]
//! enumerates one scenario per carrier kind (plus delivery-mode variants),
//! runs them all, and aggregates pass/fail records into a report.

pub mod extractor;
pub mod registry;
pub mod scenario;
pub mod sink;

/// Tests touching the process-global store serialize through this lock so
/// parallel test threads cannot reset it out from under each other.
#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    pub static GLOBAL_STORE_LOCK: Mutex<()> = Mutex::new(());
}
