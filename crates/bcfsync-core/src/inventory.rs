// ── Orchestrator inventory ──
//
// The records the engine reads from the orchestrator (networks, VPCs,
// NICs, VMs, hosts, public IPs, firewall rules, ACL items) and the
// device registry it writes topology hashes into. Each concern is a
// narrow trait; `InMemoryInventory` implements all of them and can be
// loaded from a JSON document.

use std::path::Path;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CoreError;

// ── Network records ──────────────────────────────────────────────────

/// A guest network on a physical network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestNetwork {
    pub id: String,
    pub name: String,
    pub physical_network_id: String,
    /// Broadcast domain URI, e.g. `vlan://100` or `vlan://untagged`.
    #[serde(default)]
    pub broadcast_uri: Option<String>,
    #[serde(default)]
    pub vpc_id: Option<String>,
    pub gateway: String,
    pub netmask: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vpc {
    pub id: String,
    pub name: String,
}

/// A VM network interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nic {
    pub id: String,
    pub network_id: String,
    pub vm_id: String,
    pub mac: String,
    #[serde(default)]
    pub ipv4: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualMachine {
    pub id: String,
    pub name: String,
    /// Host the VM runs on; `None` while stopped or migrating.
    #[serde(default)]
    pub host_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum HypervisorType {
    #[serde(rename = "KVM", alias = "kvm")]
    #[strum(serialize = "KVM")]
    Kvm,
    #[serde(alias = "vmware")]
    VMware,
    XenServer,
    Hyperv,
    Simulator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub id: String,
    pub name: String,
    pub hypervisor: HypervisorType,
}

/// A public address owned by a VPC or an isolated network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIp {
    pub address: String,
    #[serde(default)]
    pub network_id: Option<String>,
    #[serde(default)]
    pub vpc_id: Option<String>,
    #[serde(default)]
    pub source_nat: bool,
}

/// Per-physical-network settings the snapshot needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSettings {
    pub physical_network_id: String,
    /// Id of the orchestrator's shared public network.
    #[serde(default)]
    pub public_network_id: String,
    /// Broadcast URI of the public subnet (`vlan://50`, `vlan://untagged`).
    #[serde(default)]
    pub public_broadcast_uri: Option<String>,
    /// Guest-traffic label for VMware hosts, e.g. `vSwitch1,,vmwaresvs`.
    #[serde(default)]
    pub vmware_guest_label: Option<String>,
}

impl ZoneSettings {
    /// First element of the comma-separated VMware guest traffic label.
    pub fn vswitch_label(&self) -> Option<&str> {
        self.vmware_guest_label
            .as_deref()
            .and_then(|label| label.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// ── Rule records ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleAction {
    #[default]
    Allow,
    Deny,
}

/// A legacy per-network firewall rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    pub id: i64,
    pub network_id: String,
    /// `tcp`, `udp`, `icmp`, `all`, or unset.
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub start_port: Option<u16>,
    #[serde(default)]
    pub end_port: Option<u16>,
    #[serde(default)]
    pub source_cidrs: Vec<String>,
    #[serde(default)]
    pub action: RuleAction,
}

/// One item of the network ACL list assigned to a VPC tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclItem {
    pub id: String,
    pub network_id: String,
    /// Explicit ordering number within the ACL list.
    pub number: i64,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub start_port: Option<u16>,
    #[serde(default)]
    pub end_port: Option<u16>,
    #[serde(default)]
    pub source_cidrs: Vec<String>,
    pub action: RuleAction,
}

// ── Device registry records ──────────────────────────────────────────

/// A controller host registered against a physical network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Also the key its agent is registered under.
    pub id: String,
    pub physical_network_id: String,
    /// Controller hostname.
    pub host: String,
    #[serde(default)]
    pub nat_enabled: bool,
    /// Last committed topology hash.
    #[serde(default)]
    pub hash: String,
}

// ── Collaborator traits ──────────────────────────────────────────────

/// Read access to networks, VMs, hosts and addressing.
pub trait NetworkDirectory {
    fn guest_networks(&self, physical_network_id: &str) -> Vec<GuestNetwork>;
    fn vpc(&self, vpc_id: &str) -> Option<Vpc>;
    fn nics(&self, network_id: &str) -> Vec<Nic>;
    fn vm(&self, vm_id: &str) -> Option<VirtualMachine>;
    fn host(&self, host_id: &str) -> Option<Host>;
    fn vpc_public_ips(&self, vpc_id: &str) -> Vec<PublicIp>;
    fn network_public_ips(&self, network_id: &str) -> Vec<PublicIp>;
    fn zone_settings(&self, physical_network_id: &str) -> ZoneSettings;
}

/// Read access to the two rule sources.
pub trait AclDirectory {
    fn firewall_rules(&self, network_id: &str) -> Vec<FirewallRule>;
    fn acl_items(&self, network_id: &str) -> Vec<AclItem>;
}

/// Controller devices per physical network, and hash persistence.
pub trait DeviceRegistry {
    fn devices(&self, physical_network_id: &str) -> Vec<DeviceRecord>;

    /// Overwrite the stored hash on every device of the physical network
    /// as one transaction. Returns the number of records updated.
    fn commit_hash(&self, physical_network_id: &str, hash: &str) -> Result<usize, CoreError>;
}

// ── In-memory implementation ─────────────────────────────────────────

/// Serializable contents of an [`InMemoryInventory`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryData {
    #[serde(default)]
    pub zones: Vec<ZoneSettings>,
    #[serde(default)]
    pub networks: Vec<GuestNetwork>,
    #[serde(default)]
    pub vpcs: Vec<Vpc>,
    #[serde(default)]
    pub nics: Vec<Nic>,
    #[serde(default)]
    pub vms: Vec<VirtualMachine>,
    #[serde(default)]
    pub hosts: Vec<Host>,
    #[serde(default)]
    pub public_ips: Vec<PublicIp>,
    #[serde(default)]
    pub firewall_rules: Vec<FirewallRule>,
    #[serde(default)]
    pub acl_items: Vec<AclItem>,
    #[serde(default)]
    pub devices: Vec<DeviceRecord>,
}

impl InventoryData {
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
    }
}

/// Inventory held in memory. Device records sit behind a lock so hash
/// commits are atomic across all devices of a physical network.
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    data: InventoryData,
    devices: RwLock<Vec<DeviceRecord>>,
}

impl InMemoryInventory {
    pub fn new(mut data: InventoryData) -> Self {
        let devices = std::mem::take(&mut data.devices);
        Self {
            data,
            devices: RwLock::new(devices),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        InventoryData::load(path).map(Self::new)
    }

    /// Write the inventory, including current device hashes, back to disk.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// A copy of the full inventory with the current device records.
    pub fn snapshot(&self) -> InventoryData {
        let mut data = self.data.clone();
        data.devices = self
            .devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        data
    }
}

impl NetworkDirectory for InMemoryInventory {
    fn guest_networks(&self, physical_network_id: &str) -> Vec<GuestNetwork> {
        self.data
            .networks
            .iter()
            .filter(|n| n.physical_network_id == physical_network_id)
            .cloned()
            .collect()
    }

    fn vpc(&self, vpc_id: &str) -> Option<Vpc> {
        self.data.vpcs.iter().find(|v| v.id == vpc_id).cloned()
    }

    fn nics(&self, network_id: &str) -> Vec<Nic> {
        self.data
            .nics
            .iter()
            .filter(|n| n.network_id == network_id)
            .cloned()
            .collect()
    }

    fn vm(&self, vm_id: &str) -> Option<VirtualMachine> {
        self.data.vms.iter().find(|v| v.id == vm_id).cloned()
    }

    fn host(&self, host_id: &str) -> Option<Host> {
        self.data.hosts.iter().find(|h| h.id == host_id).cloned()
    }

    fn vpc_public_ips(&self, vpc_id: &str) -> Vec<PublicIp> {
        self.data
            .public_ips
            .iter()
            .filter(|ip| ip.vpc_id.as_deref() == Some(vpc_id))
            .cloned()
            .collect()
    }

    fn network_public_ips(&self, network_id: &str) -> Vec<PublicIp> {
        self.data
            .public_ips
            .iter()
            .filter(|ip| ip.network_id.as_deref() == Some(network_id))
            .cloned()
            .collect()
    }

    fn zone_settings(&self, physical_network_id: &str) -> ZoneSettings {
        self.data
            .zones
            .iter()
            .find(|z| z.physical_network_id == physical_network_id)
            .cloned()
            .unwrap_or_else(|| ZoneSettings {
                physical_network_id: physical_network_id.to_owned(),
                ..ZoneSettings::default()
            })
    }
}

impl AclDirectory for InMemoryInventory {
    fn firewall_rules(&self, network_id: &str) -> Vec<FirewallRule> {
        self.data
            .firewall_rules
            .iter()
            .filter(|r| r.network_id == network_id)
            .cloned()
            .collect()
    }

    fn acl_items(&self, network_id: &str) -> Vec<AclItem> {
        self.data
            .acl_items
            .iter()
            .filter(|i| i.network_id == network_id)
            .cloned()
            .collect()
    }
}

impl DeviceRegistry for InMemoryInventory {
    fn devices(&self, physical_network_id: &str) -> Vec<DeviceRecord> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|d| d.physical_network_id == physical_network_id)
            .cloned()
            .collect()
    }

    fn commit_hash(&self, physical_network_id: &str, hash: &str) -> Result<usize, CoreError> {
        let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        let mut updated = 0;
        for device in devices
            .iter_mut()
            .filter(|d| d.physical_network_id == physical_network_id)
        {
            device.hash = hash.to_owned();
            updated += 1;
        }
        Ok(updated)
    }
}
