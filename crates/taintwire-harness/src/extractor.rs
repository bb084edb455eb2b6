//! Source extraction — where untrusted request data enters the system.
//!
//! The policy is the vulnerability: `Host` is read first, and a present,
//! non-empty `X-Forwarded-Host` overrides it with no validation and no
//! allow-list. A present-but-empty forwarded header does NOT override.
//! This reproduces the ingress middleware shared by all the vulnerable
//! samples and must not be "fixed" — the scenarios depend on it.

use taintwire_types::taint::{TaintOrigin, TaintValue};
use tracing::debug;

/// Simulated request headers: ordered name/value pairs, looked up
/// case-insensitively, first match wins.
pub type Headers = Vec<(String, String)>;

/// Build a header list from string pairs.
pub fn headers(pairs: &[(&str, &str)]) -> Headers {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Derives a [`TaintValue`] from simulated inbound request headers.
pub struct SourceExtractor;

impl SourceExtractor {
    /// Extract the host the reset link will be built against.
    ///
    /// No error conditions: absent headers yield an empty value with
    /// origin [`TaintOrigin::HostHeader`].
    pub fn extract(headers: &Headers) -> TaintValue {
        let host = lookup(headers, "Host").unwrap_or_default();

        match lookup(headers, "X-Forwarded-Host") {
            Some(forwarded) if !forwarded.is_empty() => {
                debug!(host = %host, forwarded = %forwarded, "forwarded host overrides Host");
                TaintValue::new(forwarded, TaintOrigin::ForwardedHostHeader)
            }
            _ => TaintValue::new(host, TaintOrigin::HostHeader),
        }
    }
}

fn lookup(headers: &Headers, name: &str) -> Option<String> {
    headers
        .iter()
        .find(|(header, _)| header.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.clone())
}
