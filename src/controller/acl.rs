//! # ACL Compiler
//!
//! Pure compilation of declarative firewall rules into the provider's rule
//! set. Identical input always yields identical output, which the firewall
//! update path relies on for idempotent diffing.
//!
//! Constraints honored:
//! - at most [`MAX_ADDRESSES_PER_RULE`] addresses per provider rule; larger
//!   rules are chunked per address family, preserving input order
//! - at most [`MAX_RULES_PER_FIREWALL`] compiled rules across inbound and
//!   outbound combined; exceeding the limit is a capacity error, never a
//!   silent truncation
//! - rule labels are truncated to [`MAX_RULE_LABEL_LEN`] with a numeric
//!   suffix distinguishing chunks
//! - the declared policy expresses allow-list/deny-list intent, so the
//!   effective default for unmatched traffic is its inversion

use std::net::{Ipv4Addr, Ipv6Addr};

use thiserror::Error;

use crate::controller::error::ReconcileError;
use crate::crd::{CloudFirewallSpec, FirewallRuleSpec, RuleAction, RulePolicy, RuleProtocol};
use crate::provider::types::{FirewallRuleSet, ProviderRule, ProviderRuleAddresses};

/// Maximum number of addresses a single provider rule accepts
pub const MAX_ADDRESSES_PER_RULE: usize = 255;

/// Maximum number of compiled rules per firewall, inbound plus outbound
pub const MAX_RULES_PER_FIREWALL: usize = 25;

/// Maximum length of a provider rule label
pub const MAX_RULE_LABEL_LEN: usize = 32;

/// Compilation failures
#[derive(Debug, Error)]
pub enum AclError {
    /// A declared rule is malformed
    #[error("rule {label:?}: {problem}")]
    InvalidRule { label: String, problem: String },
    /// The compiled rule set exceeds the provider's rule-count limit
    #[error("compiled rule count {compiled} exceeds the provider limit of {max}")]
    TooManyRules { compiled: usize, max: usize },
}

impl From<AclError> for ReconcileError {
    fn from(err: AclError) -> Self {
        match err {
            AclError::TooManyRules { .. } => Self::Capacity(err.to_string()),
            AclError::InvalidRule { .. } => Self::Validation(err.to_string()),
        }
    }
}

/// Compile a firewall spec into the provider rule set plus effective default
/// policies.
pub fn compile(spec: &CloudFirewallSpec) -> Result<FirewallRuleSet, AclError> {
    let inbound = compile_direction(&spec.inbound)?;
    let outbound = compile_direction(&spec.outbound)?;

    let compiled = inbound.len() + outbound.len();
    if compiled > MAX_RULES_PER_FIREWALL {
        return Err(AclError::TooManyRules {
            compiled,
            max: MAX_RULES_PER_FIREWALL,
        });
    }

    Ok(FirewallRuleSet {
        inbound,
        inbound_policy: render_policy(spec.inbound_policy.invert()),
        outbound,
        outbound_policy: render_policy(spec.outbound_policy.invert()),
    })
}

fn compile_direction(rules: &[FirewallRuleSpec]) -> Result<Vec<ProviderRule>, AclError> {
    let mut out = Vec::new();
    for rule in rules {
        compile_rule(rule, &mut out)?;
    }
    Ok(out)
}

fn compile_rule(rule: &FirewallRuleSpec, out: &mut Vec<ProviderRule>) -> Result<(), AclError> {
    validate_rule(rule)?;

    let ipv4 = rule.addresses.ipv4.as_deref().unwrap_or_default();
    let ipv6 = rule.addresses.ipv6.as_deref().unwrap_or_default();

    // IPv4 and IPv6 are chunked independently, IPv4 chunks first, both in
    // input order
    let mut chunks: Vec<ProviderRuleAddresses> = Vec::new();
    for chunk in ipv4.chunks(MAX_ADDRESSES_PER_RULE) {
        chunks.push(ProviderRuleAddresses {
            ipv4: Some(chunk.to_vec()),
            ipv6: None,
        });
    }
    for chunk in ipv6.chunks(MAX_ADDRESSES_PER_RULE) {
        chunks.push(ProviderRuleAddresses {
            ipv4: None,
            ipv6: Some(chunk.to_vec()),
        });
    }

    let suffixed = chunks.len() > 1;
    for (idx, addresses) in chunks.into_iter().enumerate() {
        out.push(ProviderRule {
            action: render_action(rule.action),
            label: chunk_label(&rule.label, idx, suffixed),
            protocol: render_protocol(rule.protocol),
            ports: rule.ports.clone(),
            addresses,
        });
    }
    Ok(())
}

/// Label for one chunk: the rule label truncated so that the numeric suffix
/// still fits inside [`MAX_RULE_LABEL_LEN`]. Single-chunk rules keep the
/// plain truncated label.
fn chunk_label(base: &str, idx: usize, suffixed: bool) -> String {
    if !suffixed {
        return truncate(base, MAX_RULE_LABEL_LEN);
    }
    let suffix = format!("-{idx}");
    let budget = MAX_RULE_LABEL_LEN.saturating_sub(suffix.len());
    format!("{}{suffix}", truncate(base, budget))
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn validate_rule(rule: &FirewallRuleSpec) -> Result<(), AclError> {
    let invalid = |problem: String| AclError::InvalidRule {
        label: rule.label.clone(),
        problem,
    };

    if rule.label.trim().is_empty() {
        return Err(invalid("label must not be empty".to_string()));
    }

    match (rule.protocol, rule.ports.as_deref()) {
        (RuleProtocol::Icmp, Some(_)) => {
            return Err(invalid("ICMP rules cannot declare ports".to_string()));
        }
        (_, Some(ports)) => validate_ports(ports).map_err(invalid)?,
        (_, None) => {}
    }

    for cidr in rule.addresses.ipv4.as_deref().unwrap_or_default() {
        validate_cidr::<Ipv4Addr>(cidr, 32).map_err(invalid)?;
    }
    for cidr in rule.addresses.ipv6.as_deref().unwrap_or_default() {
        validate_cidr::<Ipv6Addr>(cidr, 128).map_err(invalid)?;
    }
    Ok(())
}

/// Ports syntax: comma-separated ports or ranges ("443", "80,443",
/// "8000-8080")
fn validate_ports(ports: &str) -> Result<(), String> {
    if ports.trim().is_empty() {
        return Err("ports string must not be empty".to_string());
    }
    for segment in ports.split(',') {
        let segment = segment.trim();
        match segment.split_once('-') {
            Some((lo, hi)) => {
                let lo = parse_port(lo)?;
                let hi = parse_port(hi)?;
                if lo > hi {
                    return Err(format!("invalid port range {segment:?}"));
                }
            }
            None => {
                parse_port(segment)?;
            }
        }
    }
    Ok(())
}

fn parse_port(s: &str) -> Result<u16, String> {
    let port: u16 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid port {s:?}"))?;
    if port == 0 {
        return Err("port 0 is not routable".to_string());
    }
    Ok(port)
}

fn validate_cidr<A: std::str::FromStr>(cidr: &str, max_prefix: u8) -> Result<(), String> {
    let (addr, prefix) = match cidr.split_once('/') {
        Some((addr, prefix)) => {
            let prefix: u8 = prefix
                .parse()
                .map_err(|_| format!("invalid prefix length in {cidr:?}"))?;
            (addr, prefix)
        }
        // A bare address is shorthand for a host route
        None => (cidr, max_prefix),
    };
    if addr.parse::<A>().is_err() {
        return Err(format!("invalid address in {cidr:?}"));
    }
    if prefix > max_prefix {
        return Err(format!("prefix length out of range in {cidr:?}"));
    }
    Ok(())
}

fn render_action(action: RuleAction) -> String {
    match action {
        RuleAction::Accept => "ACCEPT".to_string(),
        RuleAction::Drop => "DROP".to_string(),
    }
}

fn render_policy(policy: RulePolicy) -> String {
    match policy {
        RulePolicy::Accept => "ACCEPT".to_string(),
        RulePolicy::Drop => "DROP".to_string(),
    }
}

fn render_protocol(protocol: RuleProtocol) -> String {
    match protocol {
        RuleProtocol::Tcp => "TCP".to_string(),
        RuleProtocol::Udp => "UDP".to_string(),
        RuleProtocol::Icmp => "ICMP".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::RuleAddresses;

    fn rule(label: &str, ipv4: Vec<String>, ipv6: Vec<String>) -> FirewallRuleSpec {
        FirewallRuleSpec {
            action: RuleAction::Accept,
            label: label.to_string(),
            protocol: RuleProtocol::Tcp,
            ports: Some("443".to_string()),
            addresses: RuleAddresses {
                ipv4: Some(ipv4),
                ipv6: Some(ipv6),
            },
        }
    }

    fn spec_with_inbound(rules: Vec<FirewallRuleSpec>) -> CloudFirewallSpec {
        CloudFirewallSpec {
            external_id: None,
            label: None,
            tags: Vec::new(),
            inbound: rules,
            inbound_policy: RulePolicy::Accept,
            outbound: Vec::new(),
            outbound_policy: RulePolicy::Accept,
        }
    }

    fn ipv4_addrs(count: usize) -> Vec<String> {
        (0..count)
            .map(|i| format!("10.0.{}.{}/32", i / 256, i % 256))
            .collect()
    }

    #[test]
    fn test_small_rule_compiles_to_one_rule_per_family() {
        let spec = spec_with_inbound(vec![rule(
            "web",
            vec!["192.0.2.0/24".to_string()],
            vec!["2001:db8::/64".to_string()],
        )]);

        let compiled = compile(&spec).expect("compiles");
        // Mixed families always split: one rule per non-empty family
        assert_eq!(compiled.inbound.len(), 2);
        assert_eq!(
            compiled.inbound[0].addresses.ipv4.as_deref(),
            Some(&["192.0.2.0/24".to_string()][..])
        );
        assert!(compiled.inbound[0].addresses.ipv6.is_none());
        assert_eq!(
            compiled.inbound[1].addresses.ipv6.as_deref(),
            Some(&["2001:db8::/64".to_string()][..])
        );
        assert!(compiled.inbound[1].addresses.ipv4.is_none());
    }

    #[test]
    fn test_single_family_small_rule_keeps_plain_label() {
        let spec = spec_with_inbound(vec![rule("web", ipv4_addrs(255), Vec::new())]);

        let compiled = compile(&spec).expect("compiles");
        assert_eq!(compiled.inbound.len(), 1);
        assert_eq!(compiled.inbound[0].label, "web");
        assert_eq!(
            compiled.inbound[0].addresses.ipv4.as_ref().map(Vec::len),
            Some(255)
        );
    }

    #[test]
    fn test_300_addresses_chunk_into_255_plus_45() {
        let spec = spec_with_inbound(vec![rule("api-servers", ipv4_addrs(300), Vec::new())]);

        let compiled = compile(&spec).expect("compiles");
        assert_eq!(compiled.inbound.len(), 2);
        assert_eq!(
            compiled.inbound[0].addresses.ipv4.as_ref().map(Vec::len),
            Some(255)
        );
        assert_eq!(
            compiled.inbound[1].addresses.ipv4.as_ref().map(Vec::len),
            Some(45)
        );
        // Chunks share the label prefix and carry distinct numeric suffixes
        assert_eq!(compiled.inbound[0].label, "api-servers-0");
        assert_eq!(compiled.inbound[1].label, "api-servers-1");
        // Input order is preserved across the chunk boundary
        assert_eq!(
            compiled.inbound[0].addresses.ipv4.as_ref().and_then(|a| a.first()),
            Some(&"10.0.0.0/32".to_string())
        );
        assert_eq!(
            compiled.inbound[1].addresses.ipv4.as_ref().and_then(|a| a.first()),
            Some(&"10.0.0.255/32".to_string())
        );
    }

    #[test]
    fn test_long_labels_truncate_with_suffix_intact() {
        let long_label = "a".repeat(64);
        let spec = spec_with_inbound(vec![rule(&long_label, ipv4_addrs(300), Vec::new())]);

        let compiled = compile(&spec).expect("compiles");
        for provider_rule in &compiled.inbound {
            assert!(provider_rule.label.len() <= MAX_RULE_LABEL_LEN);
        }
        assert!(compiled.inbound[0].label.ends_with("-0"));
        assert!(compiled.inbound[1].label.ends_with("-1"));
    }

    #[test]
    fn test_policy_inversion() {
        let mut spec = spec_with_inbound(Vec::new());
        spec.inbound_policy = RulePolicy::Accept;
        spec.outbound_policy = RulePolicy::Drop;

        let compiled = compile(&spec).expect("compiles");
        // Allow-list semantics: declared ACCEPT means unmatched traffic drops
        assert_eq!(compiled.inbound_policy, "DROP");
        assert_eq!(compiled.outbound_policy, "ACCEPT");
    }

    #[test]
    fn test_capacity_boundary_at_exactly_25_rules() {
        let inbound: Vec<_> = (0..13)
            .map(|i| rule(&format!("in-{i}"), vec!["192.0.2.1/32".to_string()], Vec::new()))
            .collect();
        let outbound: Vec<_> = (0..12)
            .map(|i| rule(&format!("out-{i}"), vec!["192.0.2.2/32".to_string()], Vec::new()))
            .collect();
        let mut spec = spec_with_inbound(inbound);
        spec.outbound = outbound;

        let compiled = compile(&spec).expect("exactly 25 compiled rules must succeed");
        assert_eq!(compiled.inbound.len() + compiled.outbound.len(), 25);
    }

    #[test]
    fn test_capacity_boundary_fails_at_26_rules() {
        let inbound: Vec<_> = (0..13)
            .map(|i| rule(&format!("in-{i}"), vec!["192.0.2.1/32".to_string()], Vec::new()))
            .collect();
        let outbound: Vec<_> = (0..13)
            .map(|i| rule(&format!("out-{i}"), vec!["192.0.2.2/32".to_string()], Vec::new()))
            .collect();
        let mut spec = spec_with_inbound(inbound);
        spec.outbound = outbound;

        match compile(&spec) {
            Err(AclError::TooManyRules { compiled, max }) => {
                assert_eq!(compiled, 26);
                assert_eq!(max, 25);
            }
            other => panic!("expected TooManyRules, got {other:?}"),
        }
    }

    #[test]
    fn test_rule_without_addresses_emits_nothing() {
        let spec = spec_with_inbound(vec![rule("empty", Vec::new(), Vec::new())]);

        let compiled = compile(&spec).expect("compiles");
        assert!(compiled.inbound.is_empty());
    }

    #[test]
    fn test_identical_input_yields_identical_output() {
        let spec = spec_with_inbound(vec![rule(
            "deterministic",
            ipv4_addrs(300),
            vec!["2001:db8::/64".to_string()],
        )]);

        let first = compile(&spec).expect("compiles");
        let second = compile(&spec).expect("compiles");
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_cidr_is_rejected() {
        let spec = spec_with_inbound(vec![rule(
            "broken",
            vec!["not-an-address/24".to_string()],
            Vec::new(),
        )]);

        assert!(matches!(compile(&spec), Err(AclError::InvalidRule { .. })));
    }

    #[test]
    fn test_icmp_with_ports_is_rejected() {
        let mut bad = rule("ping", vec!["192.0.2.0/24".to_string()], Vec::new());
        bad.protocol = RuleProtocol::Icmp;
        let spec = spec_with_inbound(vec![bad]);

        assert!(matches!(compile(&spec), Err(AclError::InvalidRule { .. })));
    }

    #[test]
    fn test_port_range_validation() {
        assert!(validate_ports("443").is_ok());
        assert!(validate_ports("80,443").is_ok());
        assert!(validate_ports("8000-8080").is_ok());
        assert!(validate_ports("8080-8000").is_err());
        assert!(validate_ports("0").is_err());
        assert!(validate_ports("http").is_err());
    }
}
