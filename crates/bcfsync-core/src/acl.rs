// ── ACL translation ──
//
// Turns the orchestrator's firewall rules and network-ACL items into
// controller `Acl` entries. The controller accepts one source CIDR and
// one port per entry; rules it cannot represent are dropped (and logged),
// while unknown protocols and malformed masks fail the whole build.

use std::net::Ipv4Addr;

use tracing::warn;

use bcfsync_api::model::{Acl, AclAction, AclEndpoint};

use crate::error::CoreError;
use crate::inventory::{AclItem, FirewallRule, GuestNetwork, RuleAction};

const ANY_CIDR: &str = "0.0.0.0/0";

/// IANA protocol number for a protocol name. `None` matches everything.
pub fn protocol_number(rule: &str, protocol: Option<&str>) -> Result<Option<String>, CoreError> {
    let Some(name) = protocol.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    match name.to_ascii_lowercase().as_str() {
        "tcp" => Ok(Some("6".into())),
        "udp" => Ok(Some("17".into())),
        "icmp" => Ok(Some("1".into())),
        "all" => Ok(None),
        _ => Err(CoreError::UnsupportedProtocol {
            rule: rule.to_owned(),
            protocol: name.to_owned(),
        }),
    }
}

pub fn acl_action(action: RuleAction) -> AclAction {
    match action {
        RuleAction::Allow => AclAction::Permit,
        RuleAction::Deny => AclAction::Deny,
    }
}

/// Prefix length of a dotted netmask (`255.255.255.0` → 24).
///
/// Octets must come from the contiguous-mask table and every octet
/// after the first partial one must be zero.
pub fn subnet_mask_length(mask: &str) -> Result<u8, CoreError> {
    let addr: Ipv4Addr = mask.trim().parse().map_err(|_| CoreError::InvalidNetmask {
        mask: mask.to_owned(),
    })?;
    let non_contiguous = || CoreError::NonContiguousMask {
        mask: mask.to_owned(),
    };

    let mut length = 0;
    let mut ended = false;
    for octet in addr.octets() {
        if ended {
            if octet != 0 {
                return Err(non_contiguous());
            }
            continue;
        }
        let bits = match octet {
            255 => 8,
            254 => 7,
            252 => 6,
            248 => 5,
            240 => 4,
            224 => 3,
            192 => 2,
            128 => 1,
            0 => 0,
            _ => return Err(non_contiguous()),
        };
        length += bits;
        ended = bits < 8;
    }
    Ok(length)
}

/// `gateway` + `netmask` → `a.b.c.d/len` of the enclosing network.
pub fn network_cidr(gateway: &str, netmask: &str) -> Result<String, CoreError> {
    let length = subnet_mask_length(netmask)?;
    let gateway: Ipv4Addr = gateway.trim().parse().map_err(|_| CoreError::Inventory {
        message: format!("invalid gateway address: {gateway}"),
    })?;
    let network = Ipv4Addr::from(u32::from(gateway) & prefix_mask(length));
    Ok(format!("{network}/{length}"))
}

fn prefix_mask(length: u8) -> u32 {
    if length == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(length.min(32)))
    }
}

/// Normalize a source CIDR, or `None` when the controller cannot take it.
///
/// Empty and `0.0.0.0/0` become the empty string (any source). A CIDR
/// whose address is not aligned to its own prefix is rejected.
fn normalize_cidr(cidr: &str) -> Option<String> {
    let cidr = cidr.trim();
    if cidr.is_empty() || cidr == ANY_CIDR {
        return Some(String::new());
    }
    let (addr, length) = match cidr.split_once('/') {
        Some((addr, length)) => (addr, length.parse::<u8>().ok()?),
        None => (cidr, 32),
    };
    let addr: Ipv4Addr = addr.parse().ok()?;
    if length > 32 {
        return None;
    }
    if length == 32 {
        return Some(cidr.to_owned());
    }
    let bits = u32::from(addr);
    (bits & prefix_mask(length) == bits).then(|| cidr.to_owned())
}

/// Common view over both rule sources.
struct RuleView<'a> {
    id: String,
    priority: i64,
    protocol: Option<&'a str>,
    start_port: Option<u16>,
    end_port: Option<u16>,
    cidrs: &'a [String],
    action: RuleAction,
}

impl<'a> From<&'a FirewallRule> for RuleView<'a> {
    fn from(rule: &'a FirewallRule) -> Self {
        Self {
            id: rule.id.to_string(),
            priority: rule.id,
            protocol: rule.protocol.as_deref(),
            start_port: rule.start_port,
            end_port: rule.end_port,
            cidrs: &rule.source_cidrs,
            action: rule.action,
        }
    }
}

impl<'a> From<&'a AclItem> for RuleView<'a> {
    fn from(item: &'a AclItem) -> Self {
        Self {
            id: item.id.clone(),
            priority: item.number,
            protocol: item.protocol.as_deref(),
            start_port: item.start_port,
            end_port: item.end_port,
            cidrs: &item.source_cidrs,
            action: item.action,
        }
    }
}

/// Translates one network's rules into controller ACL entries.
pub struct AclTranslator<'a> {
    network: &'a GuestNetwork,
    destination_cidr: String,
}

impl<'a> AclTranslator<'a> {
    pub fn new(network: &'a GuestNetwork) -> Result<Self, CoreError> {
        Ok(Self {
            network,
            destination_cidr: network_cidr(&network.gateway, &network.netmask)?,
        })
    }

    /// Legacy firewall rules first, then ACL items.
    pub fn translate(
        &self,
        firewall_rules: &[FirewallRule],
        acl_items: &[AclItem],
    ) -> Result<Vec<Acl>, CoreError> {
        let mut acls = Vec::with_capacity(firewall_rules.len() + acl_items.len());
        let views = firewall_rules
            .iter()
            .map(RuleView::from)
            .chain(acl_items.iter().map(RuleView::from));
        for view in views {
            if let Some(acl) = self.translate_rule(&view)? {
                acls.push(acl);
            }
        }
        Ok(acls)
    }

    fn translate_rule(&self, rule: &RuleView<'_>) -> Result<Option<Acl>, CoreError> {
        let ip_proto = protocol_number(&rule.id, rule.protocol)?;

        if rule.cidrs.len() > 1 {
            self.dropped(rule, "more than one source CIDR");
            return Ok(None);
        }
        let ports_match = rule.start_port == rule.end_port;
        if !rule.cidrs.is_empty() && !ports_match {
            self.dropped(rule, "port range spans more than one port");
            return Ok(None);
        }
        let cidr = match rule.cidrs.first() {
            Some(raw) => {
                let Some(cidr) = normalize_cidr(raw) else {
                    self.dropped(rule, "source CIDR is not aligned to its prefix");
                    return Ok(None);
                };
                cidr
            }
            None => String::new(),
        };

        Ok(Some(Acl {
            id: rule.id.clone(),
            priority: rule.priority,
            action: acl_action(rule.action),
            ip_proto,
            source: AclEndpoint {
                cidr,
                port: if ports_match { rule.start_port } else { None },
            },
            destination: AclEndpoint {
                cidr: self.destination_cidr.clone(),
                port: None,
            },
        }))
    }

    fn dropped(&self, rule: &RuleView<'_>, reason: &str) {
        warn!(
            rule = %rule.id,
            network = %self.network.id,
            reason,
            "dropping ACL rule the controller cannot represent"
        );
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn network() -> GuestNetwork {
        GuestNetwork {
            id: "net-1".into(),
            name: "web".into(),
            physical_network_id: "pn-1".into(),
            broadcast_uri: Some("vlan://100".into()),
            vpc_id: None,
            gateway: "10.1.1.1".into(),
            netmask: "255.255.255.0".into(),
        }
    }

    fn rule(id: i64, cidrs: &[&str], start: u16, end: u16) -> FirewallRule {
        FirewallRule {
            id,
            network_id: "net-1".into(),
            protocol: Some("tcp".into()),
            start_port: Some(start),
            end_port: Some(end),
            source_cidrs: cidrs.iter().map(|c| (*c).to_owned()).collect(),
            action: RuleAction::Allow,
        }
    }

    fn translate(rules: &[FirewallRule]) -> Vec<Acl> {
        let network = network();
        AclTranslator::new(&network)
            .expect("valid network")
            .translate(rules, &[])
            .expect("translatable")
    }

    #[test]
    fn mask_lengths() {
        assert_eq!(subnet_mask_length("255.255.255.0").ok(), Some(24));
        assert_eq!(subnet_mask_length("255.255.254.0").ok(), Some(23));
        assert_eq!(subnet_mask_length("255.255.255.255").ok(), Some(32));
        assert_eq!(subnet_mask_length("0.0.0.0").ok(), Some(0));
    }

    #[test]
    fn non_contiguous_mask_fails() {
        assert!(matches!(
            subnet_mask_length("255.0.255.0"),
            Err(CoreError::NonContiguousMask { .. })
        ));
        assert!(matches!(
            subnet_mask_length("255.255.253.0"),
            Err(CoreError::NonContiguousMask { .. })
        ));
        assert!(matches!(
            subnet_mask_length("255.255.0"),
            Err(CoreError::InvalidNetmask { .. })
        ));
    }

    #[test]
    fn network_cidr_masks_gateway() {
        assert_eq!(
            network_cidr("10.1.1.1", "255.255.255.0").ok().as_deref(),
            Some("10.1.1.0/24")
        );
    }

    #[test]
    fn protocol_normalization() {
        assert_eq!(protocol_number("r", Some("TCP")).ok(), Some(Some("6".into())));
        assert_eq!(protocol_number("r", Some("udp")).ok(), Some(Some("17".into())));
        assert_eq!(protocol_number("r", Some("icmp")).ok(), Some(Some("1".into())));
        assert_eq!(protocol_number("r", Some("all")).ok(), Some(None));
        assert_eq!(protocol_number("r", None).ok(), Some(None));
        assert!(matches!(
            protocol_number("r", Some("gre")),
            Err(CoreError::UnsupportedProtocol { .. })
        ));
    }

    #[test]
    fn multiple_cidrs_are_dropped() {
        let acls = translate(&[rule(1, &["10.0.0.0/24", "10.0.1.0/24"], 80, 80)]);
        assert!(acls.is_empty());
    }

    #[test]
    fn single_cidr_single_port_is_kept() {
        let acls = translate(&[rule(7, &["10.0.0.0/24"], 80, 80)]);
        assert_eq!(acls.len(), 1);
        let acl = &acls[0];
        assert_eq!(acl.id, "7");
        assert_eq!(acl.priority, 7);
        assert_eq!(acl.action, AclAction::Permit);
        assert_eq!(acl.ip_proto.as_deref(), Some("6"));
        assert_eq!(acl.source.cidr, "10.0.0.0/24");
        assert_eq!(acl.source.port, Some(80));
        assert_eq!(acl.destination.cidr, "10.1.1.0/24");
    }

    #[test]
    fn port_range_with_cidr_is_dropped() {
        assert!(translate(&[rule(1, &["10.0.0.0/24"], 80, 90)]).is_empty());
    }

    #[test]
    fn any_cidr_becomes_empty() {
        let acls = translate(&[rule(1, &["0.0.0.0/0"], 22, 22), rule(2, &[""], 22, 22)]);
        assert_eq!(acls.len(), 2);
        assert!(acls.iter().all(|a| a.source.cidr.is_empty()));
    }

    #[test]
    fn misaligned_cidr_is_dropped_but_host_route_is_kept() {
        let acls = translate(&[
            rule(1, &["10.0.0.5/24"], 22, 22),
            rule(2, &["10.0.0.5/32"], 22, 22),
        ]);
        assert_eq!(acls.len(), 1);
        assert_eq!(acls[0].source.cidr, "10.0.0.5/32");
    }

    #[test]
    fn firewall_rules_precede_acl_items() {
        let network = network();
        let item = AclItem {
            id: "item-a".into(),
            network_id: "net-1".into(),
            number: 3,
            protocol: None,
            start_port: None,
            end_port: None,
            source_cidrs: Vec::new(),
            action: RuleAction::Deny,
        };
        let acls = AclTranslator::new(&network)
            .expect("valid network")
            .translate(&[rule(40, &["10.2.0.0/16"], 443, 443)], &[item])
            .expect("translatable");

        let ids: Vec<_> = acls.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["40", "item-a"]);
        assert_eq!(acls[1].priority, 3);
        assert_eq!(acls[1].action, AclAction::Deny);
        assert_eq!(acls[1].ip_proto, None);
    }

    #[test]
    fn unsupported_protocol_fails_translation() {
        let mut bad = rule(9, &[], 0, 0);
        bad.protocol = Some("sctp".into());
        let network = network();
        let result = AclTranslator::new(&network)
            .expect("valid network")
            .translate(&[bad], &[]);
        assert!(matches!(result, Err(CoreError::UnsupportedProtocol { .. })));
    }
}
