// Network and attachment endpoints
//
// Networks live under `/tenants/{tenantId}/networks`; each VM NIC is an
// attachment on a port of one of those networks.

use serde_json::json;
use tracing::debug;

use crate::client::BcfClient;
use crate::error::Error;
use crate::model::{Attachment, Network};
use crate::session::{HashToken, SessionState};

impl BcfClient {
    /// Create (or replace) a network.
    ///
    /// `POST /tenants/{tenantId}/networks`
    pub async fn create_network(
        &self,
        session: &mut SessionState,
        network: &Network,
    ) -> Result<HashToken, Error> {
        debug!(network = %network.id, tenant = %network.tenant_id, "creating network");
        self.create(
            session,
            &["tenants", &network.tenant_id, "networks"],
            &json!({ "network": network }),
        )
        .await
    }

    /// `DELETE /tenants/{tenantId}/networks/{networkId}`
    pub async fn delete_network(
        &self,
        session: &mut SessionState,
        tenant_id: &str,
        network_id: &str,
    ) -> Result<HashToken, Error> {
        debug!(network = network_id, tenant = tenant_id, "deleting network");
        self.delete(session, &["tenants", tenant_id, "networks", network_id])
            .await
    }

    /// `POST /tenants/{tenantId}/networks/{networkId}/ports/{portId}/attachment`
    pub async fn create_attachment(
        &self,
        session: &mut SessionState,
        tenant_id: &str,
        network_id: &str,
        attachment: &Attachment,
    ) -> Result<HashToken, Error> {
        debug!(port = %attachment.id, network = network_id, "creating attachment");
        self.create(
            session,
            &attachment_path(tenant_id, network_id, &attachment.id),
            &json!({ "attachment": attachment }),
        )
        .await
    }

    /// `PUT /tenants/{tenantId}/networks/{networkId}/ports/{portId}/attachment`
    pub async fn modify_attachment(
        &self,
        session: &mut SessionState,
        tenant_id: &str,
        network_id: &str,
        attachment: &Attachment,
    ) -> Result<HashToken, Error> {
        debug!(port = %attachment.id, network = network_id, "modifying attachment");
        self.modify(
            session,
            &attachment_path(tenant_id, network_id, &attachment.id),
            &json!({ "attachment": attachment }),
        )
        .await
    }

    /// `DELETE /tenants/{tenantId}/networks/{networkId}/ports/{portId}/attachment`
    pub async fn delete_attachment(
        &self,
        session: &mut SessionState,
        tenant_id: &str,
        network_id: &str,
        port_id: &str,
    ) -> Result<HashToken, Error> {
        debug!(port = port_id, network = network_id, "deleting attachment");
        self.delete(session, &attachment_path(tenant_id, network_id, port_id))
            .await
    }
}

fn attachment_path<'a>(tenant_id: &'a str, network_id: &'a str, port_id: &'a str) -> [&'a str; 7] {
    [
        "tenants",
        tenant_id,
        "networks",
        network_id,
        "ports",
        port_id,
        "attachment",
    ]
}
