// Endpoint configuration and per-endpoint session state.
//
// The endpoint description is immutable once built. Everything the hash
// protocol mutates (the last-known topology token and the master flag)
// lives in `SessionState`, which the caller owns and lends to each call.

use std::fmt;
use std::time::Duration;

use secrecy::SecretString;

use crate::transport::{TlsMode, TransportConfig};

/// Default controller REST port.
pub const DEFAULT_PORT: u16 = 8443;

/// Default orchestrator tag sent in the `Instance-ID` header.
pub const DEFAULT_INSTANCE_TAG: &str = "CLOUDSTACK";

// ── HashToken ────────────────────────────────────────────────────────

/// The controller's optimistic-concurrency token, plus the two sentinel
/// outcomes the protocol can produce instead of a real token.
///
/// Sentinels are ordinary enum variants and compare by value. A token
/// string read back from storage is parsed with [`HashToken::parse`], so
/// a persisted `"HASH_IGNORE"` is recognised as the sentinel it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum HashToken {
    /// No token held (fresh session, or 200 without a hash header).
    #[default]
    Empty,
    /// A real topology version returned by the controller.
    Value(String),
    /// A GET was answered with 409: our view of the topology is stale.
    Conflict,
    /// The endpoint answered 303 (not master); hash checking is waived.
    Ignore,
}

impl HashToken {
    pub const CONFLICT_LITERAL: &'static str = "HASH_CONFLICT";
    pub const IGNORE_LITERAL: &'static str = "HASH_IGNORE";

    /// Parse a raw token string (response header or persisted value).
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" => Self::Empty,
            Self::CONFLICT_LITERAL => Self::Conflict,
            Self::IGNORE_LITERAL => Self::Ignore,
            other => Self::Value(other.to_owned()),
        }
    }

    /// The value to send in `X-BSN-BVS-HASH-MATCH`, if any.
    pub fn header_value(&self) -> Option<&str> {
        match self {
            Self::Value(v) => Some(v),
            Self::Ignore => Some(Self::IGNORE_LITERAL),
            Self::Empty | Self::Conflict => None,
        }
    }

    /// `true` for the protocol sentinels (`Conflict`, `Ignore`).
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Conflict | Self::Ignore)
    }

    /// The real token, if this is one. Only real tokens are persisted.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Empty => "",
            Self::Value(v) => v,
            Self::Conflict => Self::CONFLICT_LITERAL,
            Self::Ignore => Self::IGNORE_LITERAL,
        }
    }
}

impl fmt::Display for HashToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── SessionState ─────────────────────────────────────────────────────

/// Mutable protocol state for one controller endpoint.
///
/// Overwritten (never merged) by every call: last writer wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub hash: HashToken,
    pub is_master: bool,
}

impl SessionState {
    /// Resume a session from a previously persisted token.
    pub fn with_hash(raw: &str) -> Self {
        Self {
            hash: HashToken::parse(raw),
            is_master: false,
        }
    }
}

// ── EndpointConfig ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

/// Immutable description of one registered controller host.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub host: String,
    pub port: u16,
    pub scheme: Scheme,
    pub username: String,
    pub password: SecretString,
    /// Availability zone the orchestrator instance serves.
    pub zone_id: String,
    pub physical_network_id: String,
    /// Whether the controller performs NAT (floating IPs) for this zone.
    pub nat_enabled: bool,
    /// Orchestrator tag prefixed to the zone id in `Instance-ID`.
    pub instance_tag: String,
    pub tls: TlsMode,
    pub timeout: Option<Duration>,
}

impl EndpointConfig {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            scheme: Scheme::Https,
            username: username.into(),
            password,
            zone_id: String::new(),
            physical_network_id: String::new(),
            nat_enabled: false,
            instance_tag: DEFAULT_INSTANCE_TAG.into(),
            tls: TlsMode::default(),
            timeout: None,
        }
    }

    /// `Instance-ID` header value: `<instance-tag>-<zoneId>`.
    pub fn instance_id(&self) -> String {
        format!("{}-{}", self.instance_tag, self.zone_id)
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }
}
