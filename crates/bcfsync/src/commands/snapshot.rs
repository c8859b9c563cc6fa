//! `snapshot`: build the desired topology from the inventory and print it.

use tabled::Tabled;

use bcfsync_api::model::{Network, Router, Topology};
use bcfsync_config::{Config, Profile};
use bcfsync_core::{InMemoryInventory, SnapshotBuilder};

use crate::cli::{GlobalOpts, SnapshotArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct NetworkRow {
    #[tabled(rename = "Network")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Tenant")]
    tenant: String,
    #[tabled(rename = "VLAN")]
    vlan: String,
    #[tabled(rename = "Ports")]
    ports: usize,
}

impl From<&Network> for NetworkRow {
    fn from(n: &Network) -> Self {
        Self {
            id: n.id.clone(),
            name: n.name.clone(),
            tenant: n.tenant_name.clone(),
            vlan: n.vlan.map_or_else(|| "untagged".into(), |v| v.to_string()),
            ports: n.ports.len(),
        }
    }
}

#[derive(Tabled)]
struct RouterRow {
    #[tabled(rename = "Router")]
    id: String,
    #[tabled(rename = "Interfaces")]
    interfaces: String,
    #[tabled(rename = "Gateways")]
    gateways: String,
    #[tabled(rename = "Policies")]
    policies: usize,
}

impl From<&Router> for RouterRow {
    fn from(r: &Router) -> Self {
        Self {
            id: r.id.clone(),
            interfaces: r
                .interfaces
                .iter()
                .map(|i| i.cidr.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            gateways: r
                .external_gateways
                .iter()
                .map(|g| g.ip_address.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            policies: r.policies.len(),
        }
    }
}

fn detail(topology: &Topology) -> String {
    let networks: Vec<NetworkRow> = topology.networks.iter().map(NetworkRow::from).collect();
    let routers: Vec<RouterRow> = topology.routers.iter().map(RouterRow::from).collect();
    format!(
        "{}\n{}",
        output::render_table(&networks),
        output::render_table(&routers)
    )
}

// ── Handler ─────────────────────────────────────────────────────────

/// The active profile, if one resolves. An explicit `--profile` that
/// does not exist is an error; a missing default profile is not.
fn optional_profile<'a>(
    cfg: &'a Config,
    global: &GlobalOpts,
) -> Result<Option<&'a Profile>, CliError> {
    match config::active_profile(cfg, global) {
        Ok((_, profile)) => Ok(Some(profile)),
        Err(e) if global.profile.is_some() => Err(e),
        Err(_) => Ok(None),
    }
}

pub fn handle(args: SnapshotArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let profile = optional_profile(&cfg, global)?;

    let path = util::inventory_path(args.inventory, profile)?;
    let physical_network = args
        .physical_network
        .or_else(|| profile.map(|p| p.physical_network.clone()))
        .ok_or_else(|| CliError::Validation {
            field: "physical-network".into(),
            reason: "pass --physical-network or select a profile".into(),
        })?;
    let nat = args.nat || profile.is_some_and(|p| p.nat);

    let inventory = InMemoryInventory::load(&path)?;
    let topology = SnapshotBuilder::new(&inventory, &inventory).build(&physical_network, nat)?;

    let out = output::render_single(global.output, &topology, detail)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
