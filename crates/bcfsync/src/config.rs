//! CLI-side configuration: honors `--config`, `--profile` and the global
//! TLS/timeout overrides on top of `bcfsync-config`.

use std::path::PathBuf;
use std::time::Duration;

use bcfsync_api::{EndpointConfig, TlsMode};
use bcfsync_config::{Config, Profile};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(bcfsync_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(bcfsync_config::load_config_from(&config_path(global))?)
}

/// The selected profile and its name.
pub fn active_profile<'a>(
    cfg: &'a Config,
    global: &GlobalOpts,
) -> Result<(String, &'a Profile), CliError> {
    cfg.profile(global.profile.as_deref()).map_err(|_| {
        let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
        available.sort_unstable();
        CliError::ProfileNotFound {
            name: global
                .profile
                .clone()
                .or_else(|| cfg.default_profile.clone())
                .unwrap_or_else(|| "default".into()),
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
            path: config_path(global).display().to_string(),
        }
    })
}

/// Endpoints of the active profile, keyed by device id, with CLI flag
/// overrides applied.
pub fn endpoints(
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<Vec<(String, EndpointConfig)>, CliError> {
    let (name, profile) = active_profile(cfg, global)?;
    let mut endpoints = bcfsync_config::profile_to_endpoints(profile, &name, &cfg.defaults)?;
    for (_, endpoint) in &mut endpoints {
        if global.insecure {
            endpoint.tls = TlsMode::DangerAcceptInvalid;
        }
        if let Some(secs) = global.timeout {
            endpoint.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
    }
    Ok(endpoints)
}
