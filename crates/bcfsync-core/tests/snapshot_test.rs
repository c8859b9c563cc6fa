#![allow(clippy::unwrap_used)]
// Snapshot builder tests over an in-memory inventory.

use pretty_assertions::assert_eq;
use serde_json::json;

use bcfsync_api::model::AclAction;
use bcfsync_core::snapshot::EXTERNAL_TENANT;
use bcfsync_core::{CoreError, InMemoryInventory, SnapshotBuilder, Topology};

const PN: &str = "pn-1";

fn build(inventory: &InMemoryInventory, nat: bool) -> Result<Topology, CoreError> {
    SnapshotBuilder::new(inventory, inventory).build(PN, nat)
}

/// A VPC with two tiers, a source-NAT address, three VMs (one stopped),
/// one KVM host and one VMware host.
fn vpc_inventory() -> InMemoryInventory {
    InMemoryInventory::new(
        serde_json::from_value(json!({
            "zones": [{
                "physical_network_id": PN,
                "public_network_id": "public-1",
                "public_broadcast_uri": "vlan://untagged",
                "vmware_guest_label": "vSwitch1,,vmwaresvs"
            }],
            "vpcs": [{ "id": "vpc-1", "name": "acme" }],
            "networks": [
                {
                    "id": "tier-web",
                    "name": "web",
                    "physical_network_id": PN,
                    "broadcast_uri": "vlan://100",
                    "vpc_id": "vpc-1",
                    "gateway": "10.1.1.1",
                    "netmask": "255.255.255.0"
                },
                {
                    "id": "tier-db",
                    "name": "db",
                    "physical_network_id": PN,
                    "broadcast_uri": "vlan://101",
                    "vpc_id": "vpc-1",
                    "gateway": "10.1.2.1",
                    "netmask": "255.255.254.0"
                },
                {
                    "id": "other-pn",
                    "name": "elsewhere",
                    "physical_network_id": "pn-2",
                    "gateway": "10.9.0.1",
                    "netmask": "255.255.0.0"
                }
            ],
            "hosts": [
                { "id": "h-kvm", "name": "kvm-01", "hypervisor": "KVM" },
                { "id": "h-esx", "name": "esx-01", "hypervisor": "VMware" }
            ],
            "vms": [
                { "id": "vm-1", "name": "web-1", "host_id": "h-kvm" },
                { "id": "vm-2", "name": "db-1", "host_id": "h-esx" },
                { "id": "vm-3", "name": "stopped" }
            ],
            "nics": [
                { "id": "nic-1", "network_id": "tier-web", "vm_id": "vm-1", "mac": "02:00:00:00:00:01", "ipv4": "10.1.1.10" },
                { "id": "nic-2", "network_id": "tier-db", "vm_id": "vm-2", "mac": "02:00:00:00:00:02", "ipv4": "10.1.2.10" },
                { "id": "nic-3", "network_id": "tier-web", "vm_id": "vm-3", "mac": "02:00:00:00:00:03" }
            ],
            "public_ips": [
                { "address": "203.0.113.5", "vpc_id": "vpc-1", "source_nat": true },
                { "address": "203.0.113.6", "vpc_id": "vpc-1", "source_nat": false }
            ],
            "acl_items": [
                {
                    "id": "item-1",
                    "network_id": "tier-web",
                    "number": 1,
                    "protocol": "tcp",
                    "start_port": 443,
                    "end_port": 443,
                    "source_cidrs": ["0.0.0.0/0"],
                    "action": "Allow"
                },
                {
                    "id": "item-2",
                    "network_id": "tier-db",
                    "number": 2,
                    "protocol": "tcp",
                    "start_port": 5432,
                    "end_port": 5432,
                    "source_cidrs": ["10.1.1.0/24"],
                    "action": "Deny"
                }
            ]
        }))
        .unwrap(),
    )
}

#[test]
fn test_vpc_tiers_share_one_router() {
    let topology = build(&vpc_inventory(), false).unwrap();

    let ids: Vec<&str> = topology.networks.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["tier-web", "tier-db"]);
    assert!(topology.networks.iter().all(|n| n.tenant_id == "vpc-1" && n.tenant_name == "acme"));

    assert_eq!(topology.routers.len(), 1);
    let router = &topology.routers[0];
    assert_eq!(router.id, "vpc-1");
    assert_eq!(router.tenant_id, "vpc-1");

    let cidrs: Vec<&str> = router.interfaces.iter().map(|i| i.cidr.as_str()).collect();
    assert_eq!(cidrs, vec!["10.1.1.0/24", "10.1.2.0/23"]);

    assert_eq!(router.external_gateways.len(), 1);
    assert_eq!(router.external_gateways[0].ip_address, "203.0.113.5");
    assert_eq!(router.external_gateways[0].network_id, "public-1");
}

#[test]
fn test_acl_items_become_router_policies() {
    let topology = build(&vpc_inventory(), false).unwrap();
    let policies = &topology.routers[0].policies;

    assert_eq!(policies.len(), 2);
    assert_eq!(policies[0].id, "item-1");
    assert_eq!(policies[0].action, AclAction::Permit);
    assert_eq!(policies[0].source.cidr, "");
    assert_eq!(policies[0].source.port, Some(443));
    assert_eq!(policies[0].destination.cidr, "10.1.1.0/24");

    assert_eq!(policies[1].action, AclAction::Deny);
    assert_eq!(policies[1].source.cidr, "10.1.1.0/24");
    assert_eq!(policies[1].destination.cidr, "10.1.2.0/23");
}

#[test]
fn test_shared_acl_list_covers_every_tier() {
    let item = |network_id: &str| {
        json!({
            "id": "shared-1",
            "network_id": network_id,
            "number": 1,
            "protocol": "icmp",
            "source_cidrs": ["192.0.2.0/24"],
            "action": "Allow"
        })
    };
    let inventory = InMemoryInventory::new(
        serde_json::from_value(json!({
            "zones": [{ "physical_network_id": PN }],
            "vpcs": [{ "id": "vpc-1", "name": "acme" }],
            "networks": [
                {
                    "id": "tier-a", "name": "a", "physical_network_id": PN, "vpc_id": "vpc-1",
                    "broadcast_uri": "vlan://10", "gateway": "10.2.1.1", "netmask": "255.255.255.0"
                },
                {
                    "id": "tier-b", "name": "b", "physical_network_id": PN, "vpc_id": "vpc-1",
                    "broadcast_uri": "vlan://11", "gateway": "10.2.2.1", "netmask": "255.255.255.0"
                }
            ],
            "acl_items": [item("tier-a"), item("tier-b")]
        }))
        .unwrap(),
    );

    let topology = build(&inventory, false).unwrap();
    let destinations: Vec<&str> = topology.routers[0]
        .policies
        .iter()
        .map(|p| p.destination.cidr.as_str())
        .collect();
    assert_eq!(destinations, vec!["10.2.1.0/24", "10.2.2.0/24"]);
    assert!(topology.routers[0].policies.iter().all(|p| p.id == "shared-1"));
}

#[test]
fn test_ports_resolve_hosts_and_skip_stopped_vms() {
    let topology = build(&vpc_inventory(), false).unwrap();

    let web = &topology.networks[0];
    assert_eq!(web.vlan, Some(100));
    assert_eq!(web.ports.len(), 1);
    let port = &web.ports[0];
    assert_eq!(port.id, "nic-1");
    assert_eq!(port.owner, "vm-1");
    assert_eq!(port.host_id, "kvm-01");
    assert_eq!(port.bound_segment.segmentation_id, Some(100));
    assert_eq!(port.fixed_ips[0].ip_address, "10.1.1.10");
    assert_eq!(port.network.id, "tier-web");

    let db = &topology.networks[1];
    assert_eq!(db.ports[0].host_id, "esx-01-vSwitch1");
}

#[test]
fn test_nat_adds_external_network_first() {
    let topology = build(&vpc_inventory(), true).unwrap();

    let external = &topology.networks[0];
    assert_eq!(external.id, "public-1");
    assert_eq!(external.tenant_id, EXTERNAL_TENANT);
    assert_eq!(external.tenant_name, EXTERNAL_TENANT);
    assert_eq!(external.vlan, None);
    assert_eq!(topology.networks.len(), 3);
}

#[test]
fn test_empty_physical_network_has_no_external_network() {
    let inventory = vpc_inventory();
    let topology = SnapshotBuilder::new(&inventory, &inventory)
        .build("pn-empty", true)
        .unwrap();

    assert!(topology.is_empty());
}

#[test]
fn test_snapshot_is_idempotent() {
    let inventory = vpc_inventory();

    let first = build(&inventory, true).unwrap();
    let second = build(&inventory, true).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_isolated_network_is_its_own_tenant() {
    let inventory = InMemoryInventory::new(
        serde_json::from_value(json!({
            "networks": [{
                "id": "iso-1",
                "name": "isolated",
                "physical_network_id": PN,
                "broadcast_uri": "vlan://200",
                "gateway": "192.168.0.1",
                "netmask": "255.255.255.0"
            }],
            "public_ips": [
                { "address": "198.51.100.7", "network_id": "iso-1", "source_nat": true }
            ],
            "firewall_rules": [
                { "id": 7, "network_id": "iso-1", "protocol": "tcp", "start_port": 22, "end_port": 22, "source_cidrs": ["198.51.100.0/24"] },
                { "id": 8, "network_id": "iso-1", "protocol": "tcp", "start_port": 80, "end_port": 90, "source_cidrs": ["198.51.100.0/24"] }
            ]
        }))
        .unwrap(),
    );

    let topology = build(&inventory, false).unwrap();

    let network = &topology.networks[0];
    assert_eq!(network.tenant_id, "iso-1");
    assert_eq!(network.tenant_name, "isolated");
    let router = &topology.routers[0];
    assert_eq!(router.id, "iso-1");
    assert_eq!(router.external_gateways[0].ip_address, "198.51.100.7");
    // The port-range rule cannot be expressed and is dropped.
    assert_eq!(router.policies.len(), 1);
    assert_eq!(router.policies[0].priority, 7);
}

#[test]
fn test_invalid_netmask_fails_the_build() {
    let inventory = InMemoryInventory::new(
        serde_json::from_value(json!({
            "networks": [{
                "id": "bad",
                "name": "bad",
                "physical_network_id": PN,
                "gateway": "10.0.0.1",
                "netmask": "255.0.255.0"
            }]
        }))
        .unwrap(),
    );

    let err = build(&inventory, false).unwrap_err();

    assert!(err.is_translation_error());
}
