//! `sync`: push the full topology through the cluster coordinator and
//! write the committed hash back to the inventory.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use bcfsync_core::{
    BcfOperation, ClusterCoordinator, DeviceRecord, InMemoryInventory, InventoryData,
    LocalDispatcher,
};

use crate::cli::{GlobalOpts, SyncArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct SyncReport {
    physical_network: String,
    details: String,
    hash: Option<String>,
    topology_sync_requested: bool,
}

fn detail(report: &SyncReport) -> String {
    [
        format!("Physical network: {}", report.physical_network),
        format!("Result:           {}", report.details),
        format!("Hash:             {}", report.hash.as_deref().unwrap_or("-")),
    ]
    .join("\n")
}

pub async fn handle(args: SyncArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let (_, profile) = config::active_profile(&cfg, global)?;
    let endpoints = config::endpoints(&cfg, global)?;
    let path = util::inventory_path(args.inventory, Some(profile))?;
    let physical_network = profile.physical_network.clone();

    // Every configured controller needs a device record to be dispatched to.
    let mut data = InventoryData::load(&path)?;
    for (id, endpoint) in &endpoints {
        if !data.devices.iter().any(|d| &d.id == id) {
            debug!(device = %id, "adding device record for configured controller");
            data.devices.push(DeviceRecord {
                id: id.clone(),
                physical_network_id: physical_network.clone(),
                host: endpoint.host.clone(),
                nat_enabled: endpoint.nat_enabled,
                hash: String::new(),
            });
        }
    }

    let stored_hash = |id: &str| {
        data.devices
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.hash.clone())
            .unwrap_or_default()
    };
    let dispatcher = LocalDispatcher::new();
    for (id, agent) in util::agents(endpoints, stored_hash)? {
        dispatcher.register(id, agent);
    }

    let inventory = Arc::new(InMemoryInventory::new(data));
    let coordinator = ClusterCoordinator::new(
        Arc::clone(&inventory),
        Arc::clone(&inventory),
        Arc::new(dispatcher),
    );

    let answer = coordinator
        .dispatch(BcfOperation::SyncTopology, &physical_network)
        .await?;
    inventory.save(&path)?;
    info!(physical_network = %physical_network, path = %path.display(), "inventory updated");

    let report = SyncReport {
        physical_network,
        details: answer.details,
        hash: answer.hash.value().map(str::to_owned),
        topology_sync_requested: answer.topology_sync_requested,
    };
    let out = output::render_single(global.output, &report, detail)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
