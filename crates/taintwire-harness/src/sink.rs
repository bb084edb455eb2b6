//! Sink consumption — the sensitive operation at the far end of a carrier.
//!
//! Builds the password-reset link the samples email to the user, with the
//! tainted host substituted verbatim: no escaping, no validation. The
//! actual email delivery is an external collaborator; this sink only
//! constructs the artifact and records what it received.

use std::sync::Mutex;
use taintwire_types::taint::{Artifact, TaintValue};
use tracing::debug;

/// Fixed reset token so the rendered link is deterministic given its input.
const RESET_TOKEN: &str = "3f7a1c9e51b24d0c";

/// The reset-email HTML body, link substituted twice and unescaped —
/// the same template the vulnerable samples email out.
fn reset_email_body(link: &str) -> String {
    format!("<p>Reset your password: <a href='{link}'>{link}</a></p>")
}

/// Consumes tainted hosts and produces reset-link artifacts.
#[derive(Debug, Default)]
pub struct SinkConsumer {
    /// Every artifact produced, in consumption order. Shared with
    /// concurrently scheduled consumer tasks, hence the mutex.
    sent: Mutex<Vec<Artifact>>,
}

impl SinkConsumer {
    /// Create a sink with an empty send log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the reset link from the tainted host, verbatim, and record it.
    ///
    /// Deterministic given its input; the only side effect is the in-memory
    /// send log.
    pub fn consume(&self, value: &TaintValue) -> Artifact {
        let rendered_link = format!("http://{}/reset/{}", value.value, RESET_TOKEN);
        let artifact = Artifact {
            email_body: reset_email_body(&rendered_link),
            rendered_link,
            recorded_origin: value.origin,
        };
        debug!(link = %artifact.rendered_link, "sink consumed");
        let mut sent = self.sent.lock().unwrap_or_else(|e| e.into_inner());
        sent.push(artifact.clone());
        artifact
    }

    /// Copy of everything this sink has produced so far.
    pub fn sent(&self) -> Vec<Artifact> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
