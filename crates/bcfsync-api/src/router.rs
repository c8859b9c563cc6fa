// Router, router interface, and floating IP endpoints

use serde_json::json;
use tracing::debug;

use crate::client::BcfClient;
use crate::error::Error;
use crate::model::{FloatingIp, Router, RouterInterface};
use crate::session::{HashToken, SessionState};

impl BcfClient {
    /// `POST /tenants/{tenantId}/routers`
    pub async fn create_router(
        &self,
        session: &mut SessionState,
        tenant_id: &str,
        router: &Router,
    ) -> Result<HashToken, Error> {
        debug!(router = %router.id, tenant = tenant_id, "creating router");
        self.create(
            session,
            &["tenants", tenant_id, "routers"],
            &json!({ "router": router }),
        )
        .await
    }

    /// Replace a tenant router (policies, gateways, interfaces).
    ///
    /// The controller treats a POST of an existing router id as a full
    /// replace, so this shares the create path.
    ///
    /// `POST /tenants/{tenantId}/routers`
    pub async fn modify_router(
        &self,
        session: &mut SessionState,
        tenant_id: &str,
        router: &Router,
    ) -> Result<HashToken, Error> {
        debug!(
            router = %router.id,
            tenant = tenant_id,
            policies = router.policies.len(),
            "modifying router"
        );
        self.create(
            session,
            &["tenants", tenant_id, "routers"],
            &json!({ "router": router }),
        )
        .await
    }

    /// `POST /tenants/{tenantId}/routers/{routerId}/interfaces`
    pub async fn create_router_interface(
        &self,
        session: &mut SessionState,
        tenant_id: &str,
        router_id: &str,
        interface: &RouterInterface,
    ) -> Result<HashToken, Error> {
        debug!(router = router_id, network = %interface.network_id, "creating router interface");
        self.create(
            session,
            &["tenants", tenant_id, "routers", router_id, "interfaces"],
            &json!({ "interface": interface }),
        )
        .await
    }

    /// `POST /tenants/{tenantId}/floatingips`
    pub async fn create_floating_ip(
        &self,
        session: &mut SessionState,
        tenant_id: &str,
        floating_ip: &FloatingIp,
    ) -> Result<HashToken, Error> {
        debug!(id = %floating_ip.id, fixed = %floating_ip.fixed_ip, "creating floating ip");
        self.create(
            session,
            &["tenants", tenant_id, "floatingips"],
            &json!({ "floatingip": floating_ip }),
        )
        .await
    }

    /// `DELETE /tenants/{tenantId}/floatingips/{id}`
    pub async fn delete_floating_ip(
        &self,
        session: &mut SessionState,
        tenant_id: &str,
        floating_ip_id: &str,
    ) -> Result<HashToken, Error> {
        debug!(id = floating_ip_id, "deleting floating ip");
        self.delete(session, &["tenants", tenant_id, "floatingips", floating_ip_id])
            .await
    }
}
