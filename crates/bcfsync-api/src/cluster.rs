// Cluster-level endpoints: health (master inference), capabilities, and
// the full topology push.

use serde_json::json;
use tracing::{debug, info};

use crate::client::BcfClient;
use crate::error::Error;
use crate::model::{Capabilities, ControlClusterStatus, Topology};
use crate::session::{HashToken, SessionState};

impl BcfClient {
    /// Replace the controller's entire view with `topology`.
    ///
    /// `POST /topology`
    pub async fn sync_topology(
        &self,
        session: &mut SessionState,
        topology: &Topology,
    ) -> Result<HashToken, Error> {
        info!(
            host = %self.host(),
            networks = topology.networks.len(),
            routers = topology.routers.len(),
            "pushing full topology"
        );
        self.create(
            session,
            &["topology"],
            &json!({ "networks": topology.networks, "routers": topology.routers }),
        )
        .await
    }

    /// Poll cluster health and infer mastership from the response code.
    ///
    /// There is no leader-election call: a 409 read, or a hash value
    /// while this session is not yet master, means this node has taken
    /// over and must receive a full sync. Both mark the session master
    /// and flag the returned status. A reply without a hash promotes
    /// nothing.
    ///
    /// `GET /health`
    pub async fn get_control_cluster_status(
        &self,
        session: &mut SessionState,
    ) -> Result<ControlClusterStatus, Error> {
        let (hash, status) = self
            .get::<ControlClusterStatus>(session, &["health"])
            .await?;
        let mut status = status.unwrap_or_default();

        if hash == HashToken::Conflict || (hash.value().is_some() && !session.is_master) {
            info!(host = %self.host(), ?hash, "controller is master, topology sync requested");
            session.is_master = true;
            status.topology_sync_requested = true;
        }
        debug!(host = %self.host(), is_master = session.is_master, "cluster status");
        Ok(status)
    }

    /// `GET /capabilities`
    pub async fn get_capabilities(
        &self,
        session: &mut SessionState,
    ) -> Result<Capabilities, Error> {
        let (_, caps) = self.get::<Capabilities>(session, &["capabilities"]).await?;
        Ok(caps.unwrap_or_default())
    }
}
