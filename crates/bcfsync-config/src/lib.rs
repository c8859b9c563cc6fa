//! Shared configuration for the bcfsync CLI.
//!
//! TOML profiles, controller password resolution (env + keyring +
//! plaintext), and translation to `bcfsync_api::EndpointConfig`. Each
//! profile describes the controller pair serving one physical network.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bcfsync_api::session::{DEFAULT_INSTANCE_TAG, DEFAULT_PORT};
use bcfsync_api::{EndpointConfig, Scheme, TlsMode};

/// Keyring service name; entries are keyed `<profile>/<host>`.
pub const KEYRING_SERVICE: &str = "bcfsync";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("no password configured for controller '{host}' in profile '{profile}'")]
    NoCredentials { profile: String, host: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named profiles, one per physical network.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
            .to_owned();
        match self.profiles.get(&name) {
            Some(profile) => Ok((name, profile)),
            None => Err(ConfigError::ProfileNotFound { name }),
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds; 0 leaves requests unbounded.
    #[serde(default)]
    pub timeout: u64,

    /// Orchestrator tag sent in the `Instance-ID` header.
    #[serde(default = "default_instance_tag")]
    pub instance_tag: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: 0,
            instance_tag: default_instance_tag(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_instance_tag() -> String {
    DEFAULT_INSTANCE_TAG.into()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Controllers serving one physical network.
#[derive(Debug, Deserialize, Serialize)]
pub struct Profile {
    pub physical_network: String,

    /// Availability zone id sent in `Instance-ID`.
    pub zone: String,

    /// Whether the controllers perform NAT for this zone.
    #[serde(default)]
    pub nat: bool,

    /// Inventory JSON used by `snapshot` and `sync`.
    pub inventory: Option<PathBuf>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    #[serde(default)]
    pub controllers: Vec<ControllerEntry>,
}

/// One controller host.
#[derive(Debug, Deserialize, Serialize)]
pub struct ControllerEntry {
    /// Device id in the inventory; defaults to the host.
    pub id: Option<String>,

    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub username: String,

    /// Plaintext password (prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,
}

impl ControllerEntry {
    pub fn device_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.host)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "bcfsync", "bcfsync").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("bcfsync");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, still layered with defaults and env.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("BCFSYNC_").split("__"));

    Ok(figment.extract()?)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a controller password: env var named by the entry, then the
/// system keyring, then plaintext in the config.
pub fn resolve_password(
    entry: &ControllerEntry,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = entry.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(keyring_entry) =
        keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{}", entry.host))
    {
        if let Ok(secret) = keyring_entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    if let Some(ref pw) = entry.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
        host: entry.host.clone(),
    })
}

// ── Translation ─────────────────────────────────────────────────────

fn tls_mode(profile: &Profile, defaults: &Defaults) -> TlsMode {
    if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    }
}

/// Endpoint for one controller of a profile.
pub fn endpoint_config(
    entry: &ControllerEntry,
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<EndpointConfig, ConfigError> {
    if entry.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("empty controller host in profile '{profile_name}'"),
        });
    }
    let password = resolve_password(entry, profile_name)?;

    let mut cfg = EndpointConfig::new(entry.host.clone(), entry.username.clone(), password);
    cfg.port = entry.port;
    cfg.scheme = Scheme::Https;
    cfg.zone_id.clone_from(&profile.zone);
    cfg.physical_network_id.clone_from(&profile.physical_network);
    cfg.nat_enabled = profile.nat;
    cfg.instance_tag.clone_from(&defaults.instance_tag);
    cfg.tls = tls_mode(profile, defaults);
    cfg.timeout = match profile.timeout.unwrap_or(defaults.timeout) {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    Ok(cfg)
}

/// Endpoints for every controller of a profile, paired with device ids.
pub fn profile_to_endpoints(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<Vec<(String, EndpointConfig)>, ConfigError> {
    if profile.controllers.is_empty() {
        return Err(ConfigError::Validation {
            field: "controllers".into(),
            reason: format!("profile '{profile_name}' lists no controllers"),
        });
    }
    profile
        .controllers
        .iter()
        .map(|entry| {
            endpoint_config(entry, profile, profile_name, defaults)
                .map(|cfg| (entry.device_id().to_owned(), cfg))
        })
        .collect()
}
