//! Tainted host values and their provenance.
//!
//! Every host string extracted from an inbound request is wrapped in a
//! [`TaintValue`] before it travels anywhere else. The wrapper records
//! which header the value came from and when it was captured, so that a
//! sink at the far end of any carrier can still answer "where did this
//! come from?". The harness deliberately performs no sanitization — the
//! unsanitized pass-through is the vulnerability being modeled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which request header an untrusted host value was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaintOrigin {
    /// The value came from the `Host` header (or no header at all).
    HostHeader,
    /// The value came from a non-empty `X-Forwarded-Host` header, which
    /// overrides `Host` when present.
    ForwardedHostHeader,
}

impl fmt::Display for TaintOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaintOrigin::HostHeader => write!(f, "host_header"),
            TaintOrigin::ForwardedHostHeader => write!(f, "forwarded_host_header"),
        }
    }
}

impl std::str::FromStr for TaintOrigin {
    type Err = crate::error::TaintwireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "host_header" => Ok(TaintOrigin::HostHeader),
            "forwarded_host_header" => Ok(TaintOrigin::ForwardedHostHeader),
            other => Err(crate::error::TaintwireError::InvalidMetadata(format!(
                "unrecognized taint origin '{other}'"
            ))),
        }
    }
}

/// An untrusted host string with provenance metadata.
///
/// Immutable once created: carriers copy, store, or relay a `TaintValue`
/// but never mutate its fields. If a sink ever observes a `value` that
/// differs from what the extractor produced, that is a harness bug, not
/// expected behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaintValue {
    /// The externally controlled host string, verbatim.
    pub value: String,
    /// Which header it was derived from.
    pub origin: TaintOrigin,
    /// When the extractor captured it.
    pub captured_at: DateTime<Utc>,
}

impl TaintValue {
    /// Wrap a freshly extracted host string, stamping it with the current time.
    pub fn new(value: impl Into<String>, origin: TaintOrigin) -> Self {
        Self {
            value: value.into(),
            origin,
            captured_at: Utc::now(),
        }
    }

    /// Returns `true` if the wrapped host string is empty (no usable header
    /// was present on the request).
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Display for TaintValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (from {})", self.value, self.origin)
    }
}

/// The observable output of the sensitive sink: a password-reset email body
/// with the tainted host substituted into the link, plus the provenance the
/// sink saw. Handed unmodified to the (out-of-scope) delivery collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// The rendered reset link, tainted host substituted verbatim.
    pub rendered_link: String,
    /// The reset-email HTML body the link is embedded in, unescaped.
    pub email_body: String,
    /// The origin recorded from the `TaintValue` the sink received.
    pub recorded_origin: TaintOrigin,
}
