// bcfsync-core: Topology snapshots, ACL translation, and controller cluster
// coordination on top of bcfsync-api.

pub mod acl;
pub mod agent;
pub mod command;
pub mod coordinator;
pub mod dispatch;
pub mod error;
pub mod inventory;
pub mod snapshot;

// ── Primary re-exports ──────────────────────────────────────────────
pub use agent::ControllerAgent;
pub use command::{BcfAnswer, BcfCommand, BcfOperation, ControllerData};
pub use coordinator::{ClusterCoordinator, ControlClusterData};
pub use dispatch::{AgentDispatcher, LocalDispatcher};
pub use error::CoreError;
pub use inventory::{
    AclDirectory, DeviceRecord, DeviceRegistry, InMemoryInventory, InventoryData,
    NetworkDirectory,
};
pub use snapshot::SnapshotBuilder;

// Wire types travel through every layer.
pub use bcfsync_api::model::Topology;
pub use bcfsync_api::{BcfClient, EndpointConfig, HashToken, SessionState};
