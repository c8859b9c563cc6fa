//! Shared helpers for command handlers.

use std::path::PathBuf;

use bcfsync_api::{BcfClient, EndpointConfig};
use bcfsync_config::Profile;
use bcfsync_core::ControllerAgent;

use crate::error::CliError;

/// `--inventory` if given, else the profile's inventory path.
pub fn inventory_path(
    flag: Option<PathBuf>,
    profile: Option<&Profile>,
) -> Result<PathBuf, CliError> {
    flag.or_else(|| profile.and_then(|p| p.inventory.clone()))
        .ok_or_else(|| CliError::Validation {
            field: "inventory".into(),
            reason: "pass --inventory or set `inventory` in the profile".into(),
        })
}

/// One agent per endpoint, each seeded with `hash_of(device_id)`.
pub fn agents(
    endpoints: Vec<(String, EndpointConfig)>,
    hash_of: impl Fn(&str) -> String,
) -> Result<Vec<(String, ControllerAgent)>, CliError> {
    endpoints
        .into_iter()
        .map(|(id, cfg)| {
            let client = BcfClient::new(cfg)?;
            let hash = hash_of(&id);
            Ok((id, ControllerAgent::new(client, &hash)))
        })
        .collect()
}
