use thiserror::Error;

/// Top-level error type for the `bcfsync-api` crate.
///
/// Covers every failure mode of a single controller call: endpoint
/// misconfiguration, transport, hash-protocol rejections, and payload
/// decoding. `bcfsync-core` maps these into engine-level errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Controller API ──────────────────────────────────────────────
    /// The controller rejected or failed the request.
    ///
    /// `topology_sync_required` is set when a write was refused with
    /// HTTP 409: the client's hash is stale and the caller must push
    /// the full topology before further writes will be accepted.
    #[error("Controller API error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    ControllerApi {
        message: String,
        status: Option<u16>,
        topology_sync_required: bool,
    },

    /// HTTP 400. The payload itself is wrong; resending it cannot help.
    #[error("Malformed request rejected by controller: {message}")]
    MalformedRequest { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Shorthand for a controller error that carries no HTTP status.
    pub(crate) fn controller(message: impl Into<String>) -> Self {
        Self::ControllerApi {
            message: message.into(),
            status: None,
            topology_sync_required: false,
        }
    }

    /// Returns `true` if the controller demanded a full topology sync.
    pub fn is_topology_sync_required(&self) -> bool {
        matches!(
            self,
            Self::ControllerApi {
                topology_sync_required: true,
                ..
            }
        )
    }

    /// Returns `true` for client-input errors that must never be retried.
    pub fn is_malformed_request(&self) -> bool {
        matches!(self, Self::MalformedRequest { .. })
    }

    /// Returns `true` if this is a transient transport error.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// The HTTP status the controller answered with, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ControllerApi { status, .. } => *status,
            Self::MalformedRequest { .. } => Some(400),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
