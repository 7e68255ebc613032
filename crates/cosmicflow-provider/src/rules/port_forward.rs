//! Port forwarding rules of one public IP address

use crate::api::PortForwardingRule;
use cosmicflow_cloud::{CloudError, Result, Rule};
use serde::{Deserialize, Serialize};

/// One `forward` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortForward {
    pub protocol: String,
    pub private_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_end_port: Option<u16>,
    pub public_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_end_port: Option<u16>,
    pub virtual_machine_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_guest_ip: Option<String>,
    /// Remote id, empty until created
    #[serde(default)]
    pub uuid: String,
}

/// Identifying fields of a [`PortForward`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortForwardKey {
    pub protocol: String,
    pub private_port: u16,
    pub private_end_port: Option<u16>,
    pub public_port: u16,
    pub public_end_port: Option<u16>,
    pub virtual_machine_id: String,
    pub vm_guest_ip: Option<String>,
}

impl PortForward {
    pub fn validate(&self) -> Result<()> {
        if self.protocol != "tcp" && self.protocol != "udp" {
            return Err(CloudError::validation(format!(
                "{} is not a valid protocol. Valid options are 'tcp' and 'udp'",
                self.protocol
            )));
        }
        check_range("private", self.private_port, self.private_end_port)?;
        check_range("public", self.public_port, self.public_end_port)?;
        if self.virtual_machine_id.is_empty() {
            return Err(CloudError::validation("virtual_machine_id must not be empty"));
        }
        Ok(())
    }

    /// The same rule with end ports equal to their start port dropped
    pub fn normalized(mut self) -> Self {
        self.private_end_port = self.private_end_port.filter(|p| *p != self.private_port);
        self.public_end_port = self.public_end_port.filter(|p| *p != self.public_port);
        self.vm_guest_ip = self.vm_guest_ip.filter(|ip| !ip.is_empty());
        self
    }
}

fn check_range(side: &str, start: u16, end: Option<u16>) -> Result<()> {
    if start == 0 {
        return Err(CloudError::validation(format!(
            "{} port must be between 1 and 65535",
            side
        )));
    }
    if let Some(end) = end {
        if end < start {
            return Err(CloudError::validation(format!(
                "{} end port {} is lower than start port {}",
                side, end, start
            )));
        }
    }
    Ok(())
}

impl From<PortForwardingRule> for PortForward {
    fn from(rule: PortForwardingRule) -> Self {
        PortForward {
            protocol: rule.protocol,
            private_port: rule.private_port,
            private_end_port: Some(rule.private_end_port),
            public_port: rule.public_port,
            public_end_port: Some(rule.public_end_port),
            virtual_machine_id: rule.virtual_machine_id,
            vm_guest_ip: Some(rule.vm_guest_ip),
            uuid: rule.id,
        }
        .normalized()
    }
}

impl Rule for PortForward {
    type Key = PortForwardKey;

    fn key(&self) -> PortForwardKey {
        let rule = self.clone().normalized();
        PortForwardKey {
            protocol: rule.protocol,
            private_port: rule.private_port,
            private_end_port: rule.private_end_port,
            public_port: rule.public_port,
            public_end_port: rule.public_end_port,
            virtual_machine_id: rule.virtual_machine_id,
            vm_guest_ip: rule.vm_guest_ip,
        }
    }

    fn remote_id(&self) -> &str {
        &self.uuid
    }

    fn set_remote_id(&mut self, id: String) {
        self.uuid = id;
    }

    fn describe(&self) -> String {
        let range = |start: u16, end: Option<u16>| match end {
            Some(end) => format!("{}-{}", start, end),
            None => start.to_string(),
        };
        format!(
            "{} {} -> {}:{}",
            self.protocol,
            range(self.public_port, self.public_end_port),
            self.virtual_machine_id,
            range(self.private_port, self.private_end_port)
        )
    }

    /// The guest IP is only tracked when it was configured
    fn refresh(&self, remote: Self) -> Self {
        let mut refreshed = remote.normalized();
        if self.vm_guest_ip.is_none() {
            refreshed.vm_guest_ip = None;
        }
        refreshed
    }
}
