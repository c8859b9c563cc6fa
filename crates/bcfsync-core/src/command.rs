// ── Command API ──
//
// Every controller change flows through a `BcfCommand`: the operation to
// perform plus, when the coordinator dispatches it, the freshly built
// topology of the physical network. Agents answer with a `BcfAnswer`.

use strum::IntoStaticStr;

use bcfsync_api::HashToken;
use bcfsync_api::model::{Attachment, FloatingIp, Network, Router, RouterInterface, Topology};

/// All operations an agent can run against its controller.
#[derive(Debug, Clone, IntoStaticStr)]
pub enum BcfOperation {
    // ── Networks ─────────────────────────────────────────────────────
    CreateNetwork(Network),
    DeleteNetwork {
        tenant_id: String,
        network_id: String,
    },

    // ── Attachments ──────────────────────────────────────────────────
    CreateAttachment {
        tenant_id: String,
        network_id: String,
        attachment: Attachment,
    },
    UpdateAttachment {
        tenant_id: String,
        network_id: String,
        attachment: Attachment,
    },
    DeleteAttachment {
        tenant_id: String,
        network_id: String,
        port_id: String,
    },

    // ── Routers ──────────────────────────────────────────────────────
    CreateRouter {
        tenant_id: String,
        router: Router,
    },
    UpdateRouter {
        tenant_id: String,
        router: Router,
    },
    CreateRouterInterface {
        tenant_id: String,
        router_id: String,
        interface: RouterInterface,
    },

    // ── Static NAT ───────────────────────────────────────────────────
    CreateStaticNat {
        tenant_id: String,
        floating_ip: FloatingIp,
    },
    DeleteStaticNat {
        tenant_id: String,
        floating_ip_id: String,
    },

    // ── Cluster ──────────────────────────────────────────────────────
    /// Push the attached topology as the controller's full state.
    SyncTopology,
    /// Keep the attached topology for replay if this node becomes master.
    CacheTopology,
    /// Report this endpoint's address and mastership.
    GetControllerData,
}

impl BcfOperation {
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// An operation plus the topology snapshot it travels with.
#[derive(Debug, Clone)]
pub struct BcfCommand {
    pub operation: BcfOperation,
    pub topology: Option<Topology>,
}

impl BcfCommand {
    pub fn new(operation: BcfOperation) -> Self {
        Self {
            operation,
            topology: None,
        }
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = Some(topology);
        self
    }

    pub fn sync(topology: Topology) -> Self {
        Self::new(BcfOperation::SyncTopology).with_topology(topology)
    }

    pub fn cache(topology: Topology) -> Self {
        Self::new(BcfOperation::CacheTopology).with_topology(topology)
    }

    pub fn name(&self) -> &'static str {
        self.operation.name()
    }
}

/// Address and mastership reported by an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerData {
    pub host: String,
    pub is_master: bool,
}

/// Result of executing a [`BcfCommand`].
#[derive(Debug, Clone)]
pub struct BcfAnswer {
    pub result: bool,
    pub details: String,
    pub hash: HashToken,
    /// The controller accepted the change but holds a stale view; the
    /// caller must follow up with a full topology sync.
    pub topology_sync_requested: bool,
    pub controller_data: Option<ControllerData>,
}

impl BcfAnswer {
    pub fn ok(hash: HashToken, details: impl Into<String>) -> Self {
        Self {
            result: true,
            details: details.into(),
            hash,
            topology_sync_requested: false,
            controller_data: None,
        }
    }

    pub fn sync_required(details: impl Into<String>) -> Self {
        Self {
            topology_sync_requested: true,
            ..Self::ok(HashToken::Empty, details)
        }
    }

    pub fn failed(details: impl Into<String>) -> Self {
        Self {
            result: false,
            ..Self::ok(HashToken::Empty, details)
        }
    }
}
