// Controller wire types
//
// Value types matching the controller's network-service JSON schema.
// Parent/child links are explicit fields (`Port::network`), never
// references, so every value can be cloned into any snapshot.

use serde::{Deserialize, Serialize};

pub const STATE_UP: &str = "UP";

// ── Topology ─────────────────────────────────────────────────────────

/// Full desired state for one physical network, pushed wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub networks: Vec<Network>,
    #[serde(default)]
    pub routers: Vec<Router>,
}

impl Topology {
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty() && self.routers.is_empty()
    }
}

// ── Network / Port ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub tenant_id: String,
    pub tenant_name: String,
    /// `None` means untagged.
    pub vlan: Option<u16>,
    pub state: String,
    #[serde(default)]
    pub ports: Vec<Port>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Network {
    /// A network with no ports and a single VLAN segment mirroring `vlan`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        tenant_id: impl Into<String>,
        tenant_name: impl Into<String>,
        vlan: Option<u16>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tenant_id: tenant_id.into(),
            tenant_name: tenant_name.into(),
            vlan,
            state: STATE_UP.into(),
            ports: Vec::new(),
            segments: vec![Segment::vlan(vlan)],
        }
    }

    /// Denormalized back-reference carried by this network's ports.
    pub fn port_network(&self) -> PortNetwork {
        PortNetwork {
            id: self.id.clone(),
            name: self.name.clone(),
            tenant_id: self.tenant_id.clone(),
            tenant_name: self.tenant_name.clone(),
            state: self.state.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub segmentation_type: String,
    pub segmentation_id: Option<u16>,
}

impl Segment {
    pub fn vlan(vlan: Option<u16>) -> Self {
        Self {
            segmentation_type: "vlan".into(),
            segmentation_id: vlan,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    pub mac_address: String,
    /// Owner tag, e.g. `compute`.
    pub owner: String,
    /// Hypervisor-specific attachment point name.
    pub host_id: String,
    pub bound_segment: BoundSegment,
    #[serde(default)]
    pub fixed_ips: Vec<FixedIp>,
    pub network: PortNetwork,
    pub state: String,
}

/// Copy of the owning network's identity, carried on each port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortNetwork {
    pub id: String,
    pub name: String,
    pub tenant_id: String,
    pub tenant_name: String,
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundSegment {
    pub segmentation_id: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedIp {
    pub ip_address: String,
}

impl FixedIp {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip_address: ip.into(),
        }
    }
}

// ── Attachment ───────────────────────────────────────────────────────

/// A VM NIC plugged into a network, sent to the per-port attachment path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Port id (the NIC uuid).
    pub id: String,
    pub tenant_name: String,
    pub vlan: Option<u16>,
    pub fixed_ips: Vec<FixedIp>,
    pub mac: String,
    pub host_id: String,
    pub state: String,
    pub bound_segment: BoundSegment,
}

impl Attachment {
    pub fn new(
        id: impl Into<String>,
        tenant_name: impl Into<String>,
        vlan: Option<u16>,
        mac: impl Into<String>,
        host_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tenant_name: tenant_name.into(),
            vlan,
            fixed_ips: Vec::new(),
            mac: mac.into(),
            host_id: host_id.into(),
            state: STATE_UP.into(),
            bound_segment: BoundSegment {
                segmentation_id: vlan,
            },
        }
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.fixed_ips.push(FixedIp::new(ip));
        self
    }
}

// ── ACL ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AclAction {
    Permit,
    Deny,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEndpoint {
    /// Empty string means any address.
    pub cidr: String,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acl {
    pub id: String,
    pub priority: i64,
    pub action: AclAction,
    /// IANA protocol number; `None` matches every protocol.
    pub ip_proto: Option<String>,
    pub source: AclEndpoint,
    pub destination: AclEndpoint,
}

// ── Router ───────────────────────────────────────────────────────────

/// One router per tenant, aggregating all of the tenant's networks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Router {
    pub id: String,
    pub tenant_id: String,
    #[serde(default)]
    pub external_gateways: Vec<ExternalGateway>,
    #[serde(default)]
    pub interfaces: Vec<RouterInterface>,
    #[serde(default)]
    pub policies: Vec<Acl>,
}

impl Router {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        let tenant_id = tenant_id.into();
        Self {
            id: tenant_id.clone(),
            tenant_id,
            external_gateways: Vec::new(),
            interfaces: Vec::new(),
            policies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalGateway {
    pub network_id: String,
    pub ip_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterInterface {
    /// Interfaces are keyed by the network they attach.
    pub id: String,
    pub network_id: String,
    pub network_name: String,
    /// Gateway address of the network on this router.
    pub ip_address: String,
    pub cidr: String,
}

impl RouterInterface {
    pub fn new(
        network_id: impl Into<String>,
        network_name: impl Into<String>,
        ip_address: impl Into<String>,
        cidr: impl Into<String>,
    ) -> Self {
        let network_id = network_id.into();
        Self {
            id: network_id.clone(),
            network_id,
            network_name: network_name.into(),
            ip_address: ip_address.into(),
            cidr: cidr.into(),
        }
    }
}

// ── Floating IP ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloatingIp {
    pub id: String,
    pub router_id: String,
    pub tenant_id: String,
    pub network_id: String,
    pub fixed_ip: String,
    pub floating_ip: String,
    pub mac: String,
}

impl FloatingIp {
    pub fn new(
        router_id: impl Into<String>,
        tenant_id: impl Into<String>,
        network_id: impl Into<String>,
        fixed_ip: impl Into<String>,
        floating_ip: impl Into<String>,
        mac: impl Into<String>,
    ) -> Self {
        let floating_ip = floating_ip.into();
        Self {
            id: Self::id_for(&floating_ip),
            router_id: router_id.into(),
            tenant_id: tenant_id.into(),
            network_id: network_id.into(),
            fixed_ip: fixed_ip.into(),
            floating_ip,
            mac: mac.into(),
        }
    }

    /// Wire identity of a floating IP: the address with `.` replaced by `-`.
    pub fn id_for(floating_ip: &str) -> String {
        floating_ip.replace('.', "-")
    }
}

// ── Cluster ──────────────────────────────────────────────────────────

/// Body of `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlClusterStatus {
    #[serde(default)]
    pub status: bool,
    /// Set locally when the hash protocol infers this node just became
    /// master or saw a conflicting read. Never sent by the controller.
    #[serde(skip)]
    pub topology_sync_requested: bool,
}

/// Body of `GET /capabilities`: a flat list of feature names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(pub Vec<String>);

impl Capabilities {
    pub const FLOATING_IP: &'static str = "floatingip";

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    /// The controller can host floating IPs, so NAT is delegated to it.
    pub fn supports_nat(&self) -> bool {
        self.contains(Self::FLOATING_IP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floating_ip_id_replaces_dots() {
        let fip = FloatingIp::new("r1", "t1", "n1", "192.168.0.10", "10.0.0.5", "aa:bb");
        assert_eq!(fip.id, "10-0-0-5");
        let again = FloatingIp::new("r1", "t1", "n1", "192.168.0.10", "10.0.0.5", "aa:bb");
        assert_eq!(fip, again);
    }

    #[test]
    fn attachment_mirrors_vlan_into_bound_segment() {
        let att = Attachment::new("p1", "tenant", Some(100), "aa:bb", "kvm1").with_ip("10.1.1.4");
        assert_eq!(att.bound_segment.segmentation_id, Some(100));
        assert_eq!(att.fixed_ips, vec![FixedIp::new("10.1.1.4")]);
    }

    #[test]
    fn capabilities_detect_nat() {
        let caps: Capabilities =
            serde_json::from_str(r#"["l3", "FloatingIP"]"#).expect("valid capabilities json");
        assert!(caps.supports_nat());
        assert!(!Capabilities(vec!["l3".into()]).supports_nat());
    }

    #[test]
    fn acl_action_serializes_lowercase() {
        let json = serde_json::to_string(&AclAction::Permit).expect("serializable");
        assert_eq!(json, "\"permit\"");
    }
}
