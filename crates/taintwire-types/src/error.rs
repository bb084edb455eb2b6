//! Shared error types for the taintwire harness.

use thiserror::Error;

/// Top-level error type for the taintwire harness.
#[derive(Error, Debug)]
pub enum TaintwireError {
    /// A carrier kind name could not be parsed.
    #[error("Unknown carrier kind: {0}")]
    UnknownCarrier(String),

    /// A scenario spec was rejected before any task was scheduled.
    #[error("Invalid scenario '{label}': {reason}")]
    InvalidScenario {
        /// The scenario's label as supplied by the driver.
        label: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A carrier's channel closed before delivery completed.
    #[error("Carrier channel closed: {0}")]
    ChannelClosed(String),

    /// Metadata entries could not be decoded back into a tainted value.
    #[error("Invalid carrier metadata: {0}")]
    InvalidMetadata(String),
}

/// Alias for Result with TaintwireError.
pub type TaintwireResult<T> = Result<T, TaintwireError>;
