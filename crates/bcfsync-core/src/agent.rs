// ── Per-controller agent ──
//
// One agent per registered controller device. It owns the HTTP client and
// the mutable session (hash token + mastership) for that endpoint, runs
// commands against it, and keeps the last topology a slave was asked to
// cache so it can be replayed after a failover.

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use bcfsync_api::model::{ControlClusterStatus, Topology};
use bcfsync_api::{BcfClient, HashToken, SessionState};

use crate::command::{BcfAnswer, BcfCommand, BcfOperation, ControllerData};
use crate::error::CoreError;

pub struct ControllerAgent {
    client: BcfClient,
    session: Mutex<SessionState>,
    cached_topology: Mutex<Option<Topology>>,
}

impl ControllerAgent {
    /// Create an agent seeded with the device's last committed hash.
    pub fn new(client: BcfClient, initial_hash: &str) -> Self {
        Self {
            client,
            session: Mutex::new(SessionState::with_hash(initial_hash)),
            cached_topology: Mutex::new(None),
        }
    }

    pub fn host(&self) -> &str {
        self.client.host()
    }

    /// Copy of the current session state.
    pub async fn session(&self) -> SessionState {
        self.session.lock().await.clone()
    }

    /// Copy of the topology held for replay, if any.
    pub async fn cached_topology(&self) -> Option<Topology> {
        self.cached_topology.lock().await.clone()
    }

    /// Run a command against this controller.
    ///
    /// Controller errors propagate unchanged, with one exception: a write
    /// rejected because the controller wants a full sync is reported as
    /// success with `topology_sync_requested` set, leaving the follow-up
    /// to the caller. A rejected `SyncTopology` is always an error.
    pub async fn execute(&self, command: BcfCommand) -> Result<BcfAnswer, CoreError> {
        let name = command.name();
        debug!(host = %self.host(), command = name, "executing command");

        match command.operation {
            BcfOperation::GetControllerData => return Ok(self.controller_data().await),
            BcfOperation::CacheTopology => {
                let topology = command.topology.ok_or_else(|| CoreError::MissingTopology {
                    command: name.to_owned(),
                })?;
                *self.cached_topology.lock().await = Some(topology);
                return Ok(BcfAnswer::ok(HashToken::Empty, "topology cached"));
            }
            _ => {}
        }

        let is_full_sync = matches!(command.operation, BcfOperation::SyncTopology);
        let mut session = self.session.lock().await;
        let outcome = self
            .run(&mut session, &command.operation, command.topology.as_ref())
            .await;

        match outcome {
            Ok(hash) => Ok(BcfAnswer::ok(hash, format!("{name} succeeded"))),
            Err(CoreError::Api(e)) if e.is_topology_sync_required() && !is_full_sync => {
                info!(host = %self.host(), command = name, "controller requested topology sync");
                Ok(BcfAnswer::sync_required(e.to_string()))
            }
            Err(e) => {
                warn!(host = %self.host(), command = name, error = %e, "command rejected");
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        session: &mut SessionState,
        operation: &BcfOperation,
        topology: Option<&Topology>,
    ) -> Result<HashToken, CoreError> {
        let c = &self.client;
        let hash = match operation {
            BcfOperation::CreateNetwork(network) => c.create_network(session, network).await?,
            BcfOperation::DeleteNetwork {
                tenant_id,
                network_id,
            } => c.delete_network(session, tenant_id, network_id).await?,
            BcfOperation::CreateAttachment {
                tenant_id,
                network_id,
                attachment,
            } => {
                c.create_attachment(session, tenant_id, network_id, attachment)
                    .await?
            }
            BcfOperation::UpdateAttachment {
                tenant_id,
                network_id,
                attachment,
            } => {
                c.modify_attachment(session, tenant_id, network_id, attachment)
                    .await?
            }
            BcfOperation::DeleteAttachment {
                tenant_id,
                network_id,
                port_id,
            } => {
                c.delete_attachment(session, tenant_id, network_id, port_id)
                    .await?
            }
            BcfOperation::CreateRouter { tenant_id, router } => {
                c.create_router(session, tenant_id, router).await?
            }
            BcfOperation::UpdateRouter { tenant_id, router } => {
                c.modify_router(session, tenant_id, router).await?
            }
            BcfOperation::CreateRouterInterface {
                tenant_id,
                router_id,
                interface,
            } => {
                c.create_router_interface(session, tenant_id, router_id, interface)
                    .await?
            }
            BcfOperation::CreateStaticNat {
                tenant_id,
                floating_ip,
            } => c.create_floating_ip(session, tenant_id, floating_ip).await?,
            BcfOperation::DeleteStaticNat {
                tenant_id,
                floating_ip_id,
            } => {
                c.delete_floating_ip(session, tenant_id, floating_ip_id)
                    .await?
            }
            BcfOperation::SyncTopology => {
                let topology = topology.ok_or_else(|| CoreError::MissingTopology {
                    command: operation.name().to_owned(),
                })?;
                c.sync_topology(session, topology).await?
            }
            BcfOperation::CacheTopology | BcfOperation::GetControllerData => HashToken::Empty,
        };
        Ok(hash)
    }

    /// Health check. When the controller signals that it needs a full
    /// sync and a cached topology is held, push it and drop the cache.
    pub async fn ping(&self) -> Result<ControlClusterStatus, CoreError> {
        let mut session = self.session.lock().await;
        let status = self.client.get_control_cluster_status(&mut session).await?;

        if status.topology_sync_requested {
            let mut cache = self.cached_topology.lock().await;
            if let Some(topology) = cache.as_ref() {
                info!(host = %self.host(), "replaying cached topology");
                match self.client.sync_topology(&mut session, topology).await {
                    Ok(_) => *cache = None,
                    Err(e) => warn!(host = %self.host(), error = %e, "cached topology replay failed"),
                }
            }
        }
        Ok(status)
    }

    async fn controller_data(&self) -> BcfAnswer {
        let is_master = match self.ping().await {
            Ok(_) => self.session.lock().await.is_master,
            Err(e) => {
                warn!(host = %self.host(), error = %e, "controller unreachable");
                false
            }
        };
        BcfAnswer {
            controller_data: Some(ControllerData {
                host: self.host().to_owned(),
                is_master,
            }),
            ..BcfAnswer::ok(HashToken::Empty, "controller data")
        }
    }
}
