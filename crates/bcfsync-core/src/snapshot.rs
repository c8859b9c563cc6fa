// ── Topology snapshot builder ──
//
// Reads the orchestrator's view of one physical network and produces the
// complete `Topology` document the controller should hold. Every call
// builds from scratch; routers are grouped per tenant in a local map and
// flattened at the end, so nothing mutable escapes a build.

use indexmap::IndexMap;
use tracing::{debug, warn};

use bcfsync_api::model::{
    BoundSegment, ExternalGateway, FixedIp, Network, Port, Router, RouterInterface, STATE_UP,
    Topology,
};

use crate::acl::{AclTranslator, network_cidr};
use crate::error::CoreError;
use crate::inventory::{
    AclDirectory, GuestNetwork, Host, HypervisorType, NetworkDirectory, PublicIp, ZoneSettings,
};

/// Tenant id and name of the synthetic shared public network.
pub const EXTERNAL_TENANT: &str = "external";

/// Parse a broadcast domain URI into a VLAN tag.
///
/// `vlan://100` and `100` are tagged; anything non-numeric
/// (`vlan://untagged`, missing) is untagged.
pub fn vlan_from_uri(uri: Option<&str>) -> Option<u16> {
    let raw = uri?.trim();
    let tag = raw
        .split_once("://")
        .map_or(raw, |(_, rest)| rest)
        .trim_end_matches('/');
    tag.parse().ok()
}

/// Controller-side name of the hypervisor host a port lives on.
///
/// KVM hosts use the bare hostname; VMware hosts append the zone's guest
/// vSwitch label (`esx-01-vSwitch1`), which is how the controller finds
/// the physical attachment point.
pub fn host_identifier(host: &Host, zone: &ZoneSettings) -> String {
    match host.hypervisor {
        HypervisorType::VMware => match zone.vswitch_label() {
            Some(label) => format!("{}-{label}", host.name),
            None => {
                warn!(host = %host.name, "no VMware guest vSwitch label configured, using bare hostname");
                host.name.clone()
            }
        },
        _ => host.name.clone(),
    }
}

struct Tenant {
    id: String,
    name: String,
}

/// Builds a [`Topology`] from directory reads.
pub struct SnapshotBuilder<'a, N, A> {
    networks: &'a N,
    acls: &'a A,
}

impl<'a, N: NetworkDirectory, A: AclDirectory> SnapshotBuilder<'a, N, A> {
    pub fn new(networks: &'a N, acls: &'a A) -> Self {
        Self { networks, acls }
    }

    /// Full desired state of `physical_network_id`.
    ///
    /// `nat_enabled` adds the synthetic `external` network when at least
    /// one guest network exists.
    pub fn build(&self, physical_network_id: &str, nat_enabled: bool) -> Result<Topology, CoreError> {
        let zone = self.networks.zone_settings(physical_network_id);
        let guest_networks = self.networks.guest_networks(physical_network_id);

        let mut networks: IndexMap<String, Network> = IndexMap::new();
        let mut routers: IndexMap<String, Router> = IndexMap::new();

        if nat_enabled && !guest_networks.is_empty() {
            let external = external_network(&zone);
            networks.insert(external.id.clone(), external);
        }

        for guest in &guest_networks {
            if networks.contains_key(&guest.id) {
                continue;
            }
            let tenant = self.tenant_of(guest);
            let mut network = Network::new(
                guest.id.clone(),
                guest.name.clone(),
                tenant.id.clone(),
                tenant.name,
                vlan_from_uri(guest.broadcast_uri.as_deref()),
            );
            network.ports = self.ports(&network, &zone);

            let router = routers
                .entry(tenant.id.clone())
                .or_insert_with(|| Router::new(tenant.id));
            self.merge_into_router(router, guest, &zone)?;

            networks.insert(network.id.clone(), network);
        }

        let topology = Topology {
            networks: networks.into_values().collect(),
            routers: routers.into_values().collect(),
        };
        debug!(
            physical_network = physical_network_id,
            networks = topology.networks.len(),
            routers = topology.routers.len(),
            "built topology snapshot"
        );
        Ok(topology)
    }

    /// VPC tiers share their VPC's tenant; isolated networks are their own.
    fn tenant_of(&self, guest: &GuestNetwork) -> Tenant {
        match guest.vpc_id.as_deref().and_then(|id| self.networks.vpc(id)) {
            Some(vpc) => Tenant {
                id: vpc.id,
                name: vpc.name,
            },
            None => Tenant {
                id: guest.id.clone(),
                name: guest.name.clone(),
            },
        }
    }

    fn ports(&self, network: &Network, zone: &ZoneSettings) -> Vec<Port> {
        self.networks
            .nics(&network.id)
            .into_iter()
            .filter_map(|nic| {
                let vm = self.networks.vm(&nic.vm_id)?;
                let Some(host) = vm.host_id.as_deref().and_then(|h| self.networks.host(h)) else {
                    debug!(nic = %nic.id, vm = %vm.id, "skipping port with no resolvable host");
                    return None;
                };
                Some(Port {
                    id: nic.id,
                    mac_address: nic.mac,
                    owner: vm.id,
                    host_id: host_identifier(&host, zone),
                    bound_segment: BoundSegment {
                        segmentation_id: network.vlan,
                    },
                    fixed_ips: nic.ipv4.into_iter().map(FixedIp::new).collect(),
                    network: network.port_network(),
                    state: STATE_UP.into(),
                })
            })
            .collect()
    }

    fn merge_into_router(
        &self,
        router: &mut Router,
        guest: &GuestNetwork,
        zone: &ZoneSettings,
    ) -> Result<(), CoreError> {
        let translator = AclTranslator::new(guest)?;
        let acls = translator.translate(
            &self.acls.firewall_rules(&guest.id),
            &self.acls.acl_items(&guest.id),
        )?;
        for acl in acls {
            if !router
                .policies
                .iter()
                .any(|p| p.id == acl.id && p.destination.cidr == acl.destination.cidr)
            {
                router.policies.push(acl);
            }
        }

        if !router.interfaces.iter().any(|i| i.network_id == guest.id) {
            router.interfaces.push(RouterInterface::new(
                guest.id.clone(),
                guest.name.clone(),
                guest.gateway.clone(),
                network_cidr(&guest.gateway, &guest.netmask)?,
            ));
        }

        if let Some(ip) = self.source_nat_ip(guest) {
            if !router.external_gateways.iter().any(|g| g.ip_address == ip.address) {
                router.external_gateways.push(ExternalGateway {
                    network_id: zone.public_network_id.clone(),
                    ip_address: ip.address,
                });
            }
        }
        Ok(())
    }

    fn source_nat_ip(&self, guest: &GuestNetwork) -> Option<PublicIp> {
        let candidates = match guest.vpc_id.as_deref() {
            Some(vpc_id) => self.networks.vpc_public_ips(vpc_id),
            None => self.networks.network_public_ips(&guest.id),
        };
        candidates.into_iter().find(|ip| ip.source_nat)
    }
}

fn external_network(zone: &ZoneSettings) -> Network {
    let id = if zone.public_network_id.is_empty() {
        EXTERNAL_TENANT.to_owned()
    } else {
        zone.public_network_id.clone()
    };
    Network::new(
        id,
        EXTERNAL_TENANT,
        EXTERNAL_TENANT,
        EXTERNAL_TENANT,
        vlan_from_uri(zone.public_broadcast_uri.as_deref()),
    )
}
