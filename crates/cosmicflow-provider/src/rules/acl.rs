//! Network ACL rules
//!
//! A configured `rule` block may list several ports. The platform stores one
//! ACL item per port, so every block is expanded into one [`AclRule`] per
//! port before reconciling, and folded back into blocks for the state.

use crate::api::{AclItem, CreateAclRule};
use cosmicflow_cloud::{CloudError, Result, Rule};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

static SPLIT_PORTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(?:-(\d+))?$").expect("valid port regex"));

/// ICMP type and code meaning "any"
pub const ICMP_ANY: i32 = -1;

fn default_action() -> String {
    "allow".to_string()
}

fn default_traffic_type() -> String {
    "ingress".to_string()
}

/// One configured `rule` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AclRuleBlock {
    #[serde(default = "default_action")]
    pub action: String,
    pub cidr_list: Vec<String>,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmp_type: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmp_code: Option<i32>,
    #[serde(default)]
    pub ports: Vec<String>,
    #[serde(default = "default_traffic_type")]
    pub traffic_type: String,
    /// Remote ids by port, or by protocol for rules without ports
    #[serde(default)]
    pub uuids: BTreeMap<String, String>,
}

/// Inclusive port range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || CloudError::validation(format!("{} is not a valid port value", value));

        let caps = SPLIT_PORTS.captures(value).ok_or_else(invalid)?;
        let start: u16 = caps[1].parse().map_err(|_| invalid())?;
        let end: u16 = match caps.get(2) {
            Some(m) => m.as_str().parse().map_err(|_| invalid())?,
            None => start,
        };

        if start == 0 || end < start {
            return Err(invalid());
        }
        Ok(PortRange { start, end })
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Protocol classes with different port and ICMP handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProtocolClass {
    Ported,
    Icmp,
    Portless,
}

fn classify_protocol(protocol: &str) -> Result<ProtocolClass> {
    match protocol {
        "tcp" | "udp" => Ok(ProtocolClass::Ported),
        "icmp" => Ok(ProtocolClass::Icmp),
        "all" => Ok(ProtocolClass::Portless),
        other => match other.parse::<u16>() {
            Ok(n) if n <= 255 => Ok(ProtocolClass::Portless),
            _ => Err(CloudError::validation(format!(
                "{} is not a valid protocol. Valid options are 'tcp', 'udp', \
                 'icmp', 'all' or a valid protocol number",
                other
            ))),
        },
    }
}

impl AclRuleBlock {
    pub fn validate(&self) -> Result<()> {
        if self.action != "allow" && self.action != "deny" {
            return Err(CloudError::validation(format!(
                "{} is not a valid action. Valid options are 'allow' and 'deny'",
                self.action
            )));
        }
        if self.traffic_type != "ingress" && self.traffic_type != "egress" {
            return Err(CloudError::validation(format!(
                "{} is not a valid traffic type. Valid options are 'ingress' and 'egress'",
                self.traffic_type
            )));
        }
        if self.cidr_list.is_empty() {
            return Err(CloudError::validation("cidr_list must contain at least one CIDR"));
        }

        match classify_protocol(&self.protocol)? {
            ProtocolClass::Ported => {
                if self.ports.is_empty() {
                    return Err(CloudError::validation(format!(
                        "the ports parameter is required for protocol '{}'",
                        self.protocol
                    )));
                }
                for port in &self.ports {
                    PortRange::parse(port)?;
                }
            }
            ProtocolClass::Icmp | ProtocolClass::Portless => {
                if !self.ports.is_empty() {
                    return Err(CloudError::validation(format!(
                        "the ports parameter is not supported for protocol '{}'",
                        self.protocol
                    )));
                }
            }
        }
        Ok(())
    }

    /// One rule per port, carrying the remote ids known for this block
    pub fn expand(&self) -> Result<Vec<AclRule>> {
        let mut cidr_list = self.cidr_list.clone();
        cidr_list.sort();
        let base = AclRule {
            action: self.action.clone(),
            cidr_list,
            protocol: self.protocol.clone(),
            icmp_type: None,
            icmp_code: None,
            port: None,
            traffic_type: self.traffic_type.clone(),
            uuid: String::new(),
        };

        let uuid_of = |key: &str| self.uuids.get(key).cloned().unwrap_or_default();

        match classify_protocol(&self.protocol)? {
            ProtocolClass::Ported => {
                let mut rules = Vec::with_capacity(self.ports.len());
                for port in &self.ports {
                    let range = PortRange::parse(port)?;
                    rules.push(AclRule {
                        port: Some(range),
                        uuid: uuid_of(&range.to_string()),
                        ..base.clone()
                    });
                }
                Ok(rules)
            }
            ProtocolClass::Icmp => Ok(vec![AclRule {
                icmp_type: Some(self.icmp_type.unwrap_or(ICMP_ANY)),
                icmp_code: Some(self.icmp_code.unwrap_or(ICMP_ANY)),
                uuid: uuid_of(&self.protocol),
                ..base
            }]),
            ProtocolClass::Portless => Ok(vec![AclRule {
                uuid: uuid_of(&self.protocol),
                ..base
            }]),
        }
    }

    /// Group rules back into blocks, one per distinct set of non-port fields.
    /// Only rules carrying a remote id are kept.
    pub fn fold(rules: impl IntoIterator<Item = AclRule>) -> Vec<AclRuleBlock> {
        type BlockKey = (String, Vec<String>, String, Option<i32>, Option<i32>, String);

        let mut blocks: BTreeMap<BlockKey, (Vec<PortRange>, BTreeMap<String, String>)> = BTreeMap::new();
        for rule in rules.into_iter().filter(|r| r.is_created()) {
            let key = (
                rule.action.clone(),
                rule.cidr_list.clone(),
                rule.protocol.clone(),
                rule.icmp_type,
                rule.icmp_code,
                rule.traffic_type.clone(),
            );
            let (ports, uuids) = blocks.entry(key).or_default();
            if let Some(port) = rule.port {
                ports.push(port);
            }
            uuids.insert(rule.uuid_key(), rule.uuid);
        }

        blocks
            .into_iter()
            .map(
                |((action, cidr_list, protocol, icmp_type, icmp_code, traffic_type), (mut ports, uuids))| {
                    ports.sort();
                    ports.dedup();
                    AclRuleBlock {
                        action,
                        cidr_list,
                        protocol,
                        icmp_type,
                        icmp_code,
                        ports: ports.iter().map(PortRange::to_string).collect(),
                        traffic_type,
                        uuids,
                    }
                },
            )
            .collect()
    }
}

/// A single remote ACL item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclRule {
    pub action: String,
    /// Sorted
    pub cidr_list: Vec<String>,
    pub protocol: String,
    pub icmp_type: Option<i32>,
    pub icmp_code: Option<i32>,
    pub port: Option<PortRange>,
    pub traffic_type: String,
    pub uuid: String,
}

/// Identifying fields of an [`AclRule`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AclRuleKey {
    pub action: String,
    pub cidr_list: Vec<String>,
    pub protocol: String,
    pub icmp_type: Option<i32>,
    pub icmp_code: Option<i32>,
    pub port: Option<PortRange>,
    pub traffic_type: String,
}

impl AclRule {
    /// Key of this rule in its block's `uuids` map
    pub fn uuid_key(&self) -> String {
        match self.port {
            Some(port) => port.to_string(),
            None => self.protocol.clone(),
        }
    }

    pub fn to_create_params(&self, acl_id: &str) -> CreateAclRule {
        CreateAclRule {
            acl_id: acl_id.to_string(),
            action: self.action.clone(),
            cidr_list: self.cidr_list.clone(),
            protocol: self.protocol.clone(),
            icmp_type: self.icmp_type,
            icmp_code: self.icmp_code,
            start_port: self.port.map(|p| p.start),
            end_port: self.port.map(|p| p.end),
            traffic_type: self.traffic_type.clone(),
        }
    }
}

impl From<AclItem> for AclRule {
    fn from(item: AclItem) -> Self {
        let protocol = item.protocol.to_lowercase();
        let mut cidr_list = item.cidr_list;
        cidr_list.sort();

        let (icmp_type, icmp_code) = if protocol == "icmp" {
            (
                Some(item.icmp_type.unwrap_or(ICMP_ANY)),
                Some(item.icmp_code.unwrap_or(ICMP_ANY)),
            )
        } else {
            (None, None)
        };

        let port = match (protocol.as_str(), item.start_port) {
            ("tcp" | "udp", Some(start)) => Some(PortRange {
                start,
                end: item.end_port.unwrap_or(start),
            }),
            _ => None,
        };

        AclRule {
            action: item.action.to_lowercase(),
            cidr_list,
            protocol,
            icmp_type,
            icmp_code,
            port,
            traffic_type: item.traffic_type.to_lowercase(),
            uuid: item.id,
        }
    }
}

impl Rule for AclRule {
    type Key = AclRuleKey;

    fn key(&self) -> AclRuleKey {
        AclRuleKey {
            action: self.action.clone(),
            cidr_list: self.cidr_list.clone(),
            protocol: self.protocol.clone(),
            icmp_type: self.icmp_type,
            icmp_code: self.icmp_code,
            port: self.port,
            traffic_type: self.traffic_type.clone(),
        }
    }

    fn remote_id(&self) -> &str {
        &self.uuid
    }

    fn set_remote_id(&mut self, id: String) {
        self.uuid = id;
    }

    fn describe(&self) -> String {
        let target = match (self.port, self.icmp_type) {
            (Some(port), _) => format!(" port {}", port),
            (None, Some(t)) => format!(" type {} code {}", t, self.icmp_code.unwrap_or(ICMP_ANY)),
            (None, None) => String::new(),
        };
        format!(
            "{} {} {}{} from {}",
            self.action,
            self.traffic_type,
            self.protocol,
            target,
            self.cidr_list.join(",")
        )
    }
}
