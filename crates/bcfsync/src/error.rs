//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use bcfsync_config::ConfigError;
use bcfsync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Controller ───────────────────────────────────────────────────
    #[error("Could not reach controller: {message}")]
    #[diagnostic(
        code(bcfsync::connection_failed),
        help(
            "Check that the controller is running and reachable on its API port.\n\
             Try: bcfsync status --insecure"
        )
    )]
    ConnectionFailed { message: String },

    #[error("{0}")]
    #[diagnostic(
        code(bcfsync::cluster_unavailable),
        help(
            "No controller reported itself master. Run `bcfsync status` to\n\
             see each controller's state."
        )
    )]
    ClusterUnavailable(String),

    #[error("Controller rejected the request: {message}")]
    #[diagnostic(code(bcfsync::rejected))]
    Rejected { message: String },

    #[error("Controller topology is out of date: {message}")]
    #[diagnostic(
        code(bcfsync::topology_conflict),
        help("Run `bcfsync sync` to push the full topology.")
    )]
    TopologyConflict { message: String },

    // ── Inventory ────────────────────────────────────────────────────
    #[error("Inventory cannot be translated: {message}")]
    #[diagnostic(
        code(bcfsync::translation),
        help("Fix the offending network or rule in the inventory file.")
    )]
    Translation { message: String },

    #[error("Inventory error: {message}")]
    #[diagnostic(code(bcfsync::inventory))]
    Inventory { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(bcfsync::validation))]
    Validation { field: String, reason: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(bcfsync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Config file: {path}"
        )
    )]
    ProfileNotFound {
        name: String,
        available: String,
        path: String,
    },

    #[error("No password configured for controller '{host}' in profile '{profile}'")]
    #[diagnostic(
        code(bcfsync::no_credentials),
        help(
            "Set password_env on the controller entry, store the password in the\n\
             system keyring under service 'bcfsync' as '{profile}/{host}',\n\
             or add a plaintext password to the profile."
        )
    )]
    NoCredentials { profile: String, host: String },

    #[error(transparent)]
    #[diagnostic(code(bcfsync::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(bcfsync::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::ClusterUnavailable(_) => exit_code::CONNECTION,
            Self::NoCredentials { .. } => exit_code::AUTH,
            Self::TopologyConflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::ProfileNotFound { .. } | Self::Translation { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── Error mapping ────────────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        if err.is_unavailable() {
            return Self::ClusterUnavailable(err.to_string());
        }
        if err.is_translation_error() {
            return Self::Translation {
                message: err.to_string(),
            };
        }
        match err {
            CoreError::Api(api) => api.into(),
            CoreError::CommandFailed { .. } => Self::Rejected {
                message: err.to_string(),
            },
            CoreError::Io(e) => Self::Io(e),
            CoreError::Json(e) => Self::Json(e),
            other => Self::Inventory {
                message: other.to_string(),
            },
        }
    }
}

impl From<bcfsync_api::Error> for CliError {
    fn from(err: bcfsync_api::Error) -> Self {
        if err.is_topology_sync_required() {
            return Self::TopologyConflict {
                message: err.to_string(),
            };
        }
        match err {
            bcfsync_api::Error::Transport(_) | bcfsync_api::Error::Tls(_) => {
                Self::ConnectionFailed {
                    message: err.to_string(),
                }
            }
            other => Self::Rejected {
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile, host } => Self::NoCredentials { profile, host },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}
