//! Resource type names as the host addresses them

use cosmicflow_cloud::CloudError;
use std::fmt;
use std::str::FromStr;

const PREFIX: &str = "cosmic_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    PortForward,
    NetworkAclRule,
    NetworkAcl,
    Vpc,
    Network,
    IpAddress,
    Instance,
    LoadbalancerRule,
    VpnGateway,
    VpnCustomerGateway,
    VpnConnection,
    SshKeypair,
    Template,
    Disk,
    Nic,
    SecondaryIpAddress,
    StaticNat,
    StaticRoute,
    PrivateGateway,
    AffinityGroup,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 20] = [
        ResourceKind::PortForward,
        ResourceKind::NetworkAclRule,
        ResourceKind::NetworkAcl,
        ResourceKind::Vpc,
        ResourceKind::Network,
        ResourceKind::IpAddress,
        ResourceKind::Instance,
        ResourceKind::LoadbalancerRule,
        ResourceKind::VpnGateway,
        ResourceKind::VpnCustomerGateway,
        ResourceKind::VpnConnection,
        ResourceKind::SshKeypair,
        ResourceKind::Template,
        ResourceKind::Disk,
        ResourceKind::Nic,
        ResourceKind::SecondaryIpAddress,
        ResourceKind::StaticNat,
        ResourceKind::StaticRoute,
        ResourceKind::PrivateGateway,
        ResourceKind::AffinityGroup,
    ];

    /// Name without the `cosmic_` prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::PortForward => "port_forward",
            ResourceKind::NetworkAclRule => "network_acl_rule",
            ResourceKind::NetworkAcl => "network_acl",
            ResourceKind::Vpc => "vpc",
            ResourceKind::Network => "network",
            ResourceKind::IpAddress => "ipaddress",
            ResourceKind::Instance => "instance",
            ResourceKind::LoadbalancerRule => "loadbalancer_rule",
            ResourceKind::VpnGateway => "vpn_gateway",
            ResourceKind::VpnCustomerGateway => "vpn_customer_gateway",
            ResourceKind::VpnConnection => "vpn_connection",
            ResourceKind::SshKeypair => "ssh_keypair",
            ResourceKind::Template => "template",
            ResourceKind::Disk => "disk",
            ResourceKind::Nic => "nic",
            ResourceKind::SecondaryIpAddress => "secondary_ipaddress",
            ResourceKind::StaticNat => "static_nat",
            ResourceKind::StaticRoute => "static_route",
            ResourceKind::PrivateGateway => "private_gateway",
            ResourceKind::AffinityGroup => "affinity_group",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PREFIX, self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix(PREFIX).unwrap_or(s);
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| CloudError::InvalidConfig(format!("unknown resource type: {}", s)))
    }
}
