// ── Cluster coordinator ──
//
// Front door for orchestrator-driven changes on one physical network.
// Finds the master controller, sends it the command together with a fresh
// topology snapshot, follows up with a full sync when the controller asks
// for one, persists the resulting hash, and hands the slave a copy of the
// topology to replay if it takes over.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use bcfsync_api::HashToken;
use bcfsync_api::model::Topology;

use crate::command::{BcfAnswer, BcfCommand, BcfOperation};
use crate::dispatch::AgentDispatcher;
use crate::error::CoreError;
use crate::inventory::{AclDirectory, DeviceRecord, DeviceRegistry, NetworkDirectory};
use crate::snapshot::SnapshotBuilder;

/// Master and slave of a controller pair, as last reported by their agents.
#[derive(Debug, Clone, Default)]
pub struct ControlClusterData {
    pub master: Option<DeviceRecord>,
    pub slave: Option<DeviceRecord>,
}

pub struct ClusterCoordinator<I, R, D> {
    inventory: Arc<I>,
    registry: Arc<R>,
    dispatcher: Arc<D>,
}

impl<I, R, D> ClusterCoordinator<I, R, D>
where
    I: NetworkDirectory + AclDirectory + Send + Sync,
    R: DeviceRegistry + Send + Sync,
    D: AgentDispatcher,
{
    pub fn new(inventory: Arc<I>, registry: Arc<R>, dispatcher: Arc<D>) -> Self {
        Self {
            inventory,
            registry,
            dispatcher,
        }
    }

    /// Ask every device's agent for its mastership. Unreachable agents
    /// are skipped; the first master and first slave found win.
    pub async fn discover_cluster_topology(&self, physical_network_id: &str) -> ControlClusterData {
        let devices = self.registry.devices(physical_network_id);
        let answers = join_all(devices.iter().map(|device| {
            self.dispatcher
                .send(device, BcfCommand::new(BcfOperation::GetControllerData))
        }))
        .await;

        let mut cluster = ControlClusterData::default();
        for (device, answer) in devices.into_iter().zip(answers) {
            let data = match answer {
                Ok(answer) => answer.controller_data,
                Err(e) => {
                    warn!(host = %device.host, error = %e, "controller data unavailable");
                    continue;
                }
            };
            let Some(data) = data else { continue };
            if data.is_master {
                if cluster.master.is_none() {
                    cluster.master = Some(device);
                }
            } else if cluster.slave.is_none() {
                cluster.slave = Some(device);
            }
        }
        debug!(
            physical_network = physical_network_id,
            master = cluster.master.as_ref().map(|d| d.host.as_str()),
            slave = cluster.slave.as_ref().map(|d| d.host.as_str()),
            "discovered control cluster"
        );
        cluster
    }

    /// Fresh desired-state snapshot of the physical network.
    pub fn build_snapshot(
        &self,
        physical_network_id: &str,
        nat_enabled: bool,
    ) -> Result<Topology, CoreError> {
        SnapshotBuilder::new(self.inventory.as_ref(), self.inventory.as_ref())
            .build(physical_network_id, nat_enabled)
    }

    /// Run `operation` on the master controller of the physical network.
    pub async fn dispatch(
        &self,
        operation: BcfOperation,
        physical_network_id: &str,
    ) -> Result<BcfAnswer, CoreError> {
        let cluster = self.discover_cluster_topology(physical_network_id).await;
        let Some(master) = cluster.master else {
            return Err(CoreError::ClusterUnavailable {
                physical_network_id: physical_network_id.to_owned(),
            });
        };

        let snapshot = self.build_snapshot(physical_network_id, master.nat_enabled)?;
        let command = BcfCommand::new(operation).with_topology(snapshot);
        let name = command.name();
        let mut answer = self.send_checked(&master, command).await?;

        if answer.topology_sync_requested {
            info!(host = %master.host, command = name, "following up with full topology sync");
            let snapshot = self.build_snapshot(physical_network_id, master.nat_enabled)?;
            answer = self.send_checked(&master, BcfCommand::sync(snapshot)).await?;
            if answer.topology_sync_requested {
                return Err(CoreError::Api(bcfsync_api::Error::ControllerApi {
                    message: format!("{}: full topology sync was not accepted", master.host),
                    status: None,
                    topology_sync_required: true,
                }));
            }
        }

        self.commit_topology_hash(physical_network_id, &answer.hash)?;

        if let Some(slave) = cluster.slave {
            let snapshot = self.build_snapshot(physical_network_id, slave.nat_enabled)?;
            if let Err(e) = self.send_checked(&slave, BcfCommand::cache(snapshot)).await {
                warn!(host = %slave.host, error = %e, "failed to cache topology on slave");
            }
        }
        Ok(answer)
    }

    /// Persist `hash` on every device of the physical network. Only real
    /// hash values are stored; empty tokens and sentinels are skipped.
    pub fn commit_topology_hash(
        &self,
        physical_network_id: &str,
        hash: &HashToken,
    ) -> Result<usize, CoreError> {
        let Some(value) = hash.value() else {
            return Ok(0);
        };
        let updated = self.registry.commit_hash(physical_network_id, value)?;
        debug!(physical_network = physical_network_id, updated, "committed topology hash");
        Ok(updated)
    }

    async fn send_checked(
        &self,
        device: &DeviceRecord,
        command: BcfCommand,
    ) -> Result<BcfAnswer, CoreError> {
        let name = command.name();
        let answer = self.dispatcher.send(device, command).await?;
        if answer.result {
            Ok(answer)
        } else {
            Err(CoreError::CommandFailed {
                command: name.to_owned(),
                host: device.host.clone(),
                details: answer.details,
            })
        }
    }
}
