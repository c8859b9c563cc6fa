// ── Core error types ──
//
// Engine-level errors. Controller call failures are carried through
// unchanged in `Api` so callers can still inspect the status code and
// the topology-sync flag; everything else is a coordination or
// translation failure raised by this crate.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Controller ───────────────────────────────────────────────────
    /// A controller call failed. Propagated as-is from `bcfsync-api`.
    #[error(transparent)]
    Api(#[from] bcfsync_api::Error),

    /// No registered controller reported itself master.
    #[error("SDN controller service temporarily unavailable for physical network {physical_network_id}")]
    ClusterUnavailable { physical_network_id: String },

    /// No agent is registered for the device's host.
    #[error("No controller agent registered for host {host}")]
    AgentUnavailable { host: String },

    /// An agent answered with a failed result.
    #[error("Command {command} failed on {host}: {details}")]
    CommandFailed {
        command: String,
        host: String,
        details: String,
    },

    /// A topology-carrying command was dispatched without a topology.
    #[error("Command {command} requires an attached topology")]
    MissingTopology { command: String },

    // ── Translation ──────────────────────────────────────────────────
    #[error("Unsupported protocol in ACL rule {rule}: {protocol}")]
    UnsupportedProtocol { rule: String, protocol: String },

    #[error("Invalid netmask: {mask}")]
    InvalidNetmask { mask: String },

    #[error("Non-contiguous netmask: {mask}")]
    NonContiguousMask { mask: String },

    // ── Inventory ────────────────────────────────────────────────────
    #[error("Inventory error: {message}")]
    Inventory { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Inventory format error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// The underlying controller error, if this failure came from a call.
    pub fn api_error(&self) -> Option<&bcfsync_api::Error> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Returns `true` for the "service temporarily unavailable" condition.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::ClusterUnavailable { .. } | Self::AgentUnavailable { .. }
        )
    }

    /// Returns `true` when the failure is a data or programming error in
    /// the orchestrator's records rather than a controller problem.
    pub fn is_translation_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedProtocol { .. }
                | Self::InvalidNetmask { .. }
                | Self::NonContiguousMask { .. }
        )
    }
}
