//! Cosmic control-plane API surface
//!
//! The provider talks to the platform through [`CosmicApi`]. Request signing,
//! transport and async job polling belong to the client implementing it; a
//! call returns once the remote job finished, or fails with
//! [`ApiError::AsyncTimeout`] when the job outlived the client's window.

use async_trait::async_trait;
use cosmicflow_cloud::ApiError;
use serde::{Deserialize, Serialize};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Named objects resolvable to an id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    ServiceOffering,
    NetworkOffering,
    VpcOffering,
    DiskOffering,
    Zone,
    OsType,
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupKind::ServiceOffering => write!(f, "service_offering"),
            LookupKind::NetworkOffering => write!(f, "network_offering"),
            LookupKind::VpcOffering => write!(f, "vpc_offering"),
            LookupKind::DiskOffering => write!(f, "disk_offering"),
            LookupKind::Zone => write!(f, "zone"),
            LookupKind::OsType => write!(f, "os_type"),
        }
    }
}

/// Remote operations used by the resource adapters
#[async_trait]
pub trait CosmicApi: Send + Sync {
    // Port forwarding rules
    async fn create_port_forward(&self, params: &CreatePortForward) -> ApiResult<String>;
    async fn delete_port_forward(&self, id: &str) -> ApiResult<()>;
    async fn list_port_forwards(&self, ip_address_id: &str) -> ApiResult<Vec<PortForwardingRule>>;
    async fn get_port_forward(&self, id: &str) -> ApiResult<PortForwardingRule>;

    // Network ACL items
    async fn create_acl_rule(&self, params: &CreateAclRule) -> ApiResult<String>;
    async fn delete_acl_rule(&self, id: &str) -> ApiResult<()>;
    async fn list_acl_rules(&self, acl_id: &str) -> ApiResult<Vec<AclItem>>;

    // Network ACL lists
    async fn create_acl_list(&self, name: &str, description: &str, vpc_id: &str) -> ApiResult<String>;
    async fn get_acl_list(&self, id: &str) -> ApiResult<AclList>;
    async fn list_acl_lists(&self) -> ApiResult<Vec<AclList>>;
    async fn update_acl_list(&self, id: &str, name: &str, description: &str) -> ApiResult<()>;
    async fn delete_acl_list(&self, id: &str) -> ApiResult<()>;
    async fn replace_acl_list(&self, acl_id: &str, target: AclTarget<'_>) -> ApiResult<()>;

    // Public IP addresses
    async fn associate_ip_address(&self, params: &AssociateIpAddress) -> ApiResult<String>;
    async fn get_public_ip(&self, id: &str) -> ApiResult<PublicIpAddress>;
    async fn list_source_nat_ips(&self, vpc_id: &str) -> ApiResult<Vec<PublicIpAddress>>;
    async fn disassociate_ip_address(&self, id: &str) -> ApiResult<()>;
    async fn enable_static_nat(&self, params: &EnableStaticNat) -> ApiResult<()>;
    async fn disable_static_nat(&self, ip_address_id: &str) -> ApiResult<()>;

    // VPCs
    async fn create_vpc(&self, params: &CreateVpc) -> ApiResult<String>;
    async fn get_vpc(&self, id: &str) -> ApiResult<Vpc>;
    async fn get_vpc_offering(&self, id: &str) -> ApiResult<Offering>;
    async fn update_vpc(&self, params: &UpdateVpc) -> ApiResult<()>;
    async fn delete_vpc(&self, id: &str) -> ApiResult<()>;
    async fn create_private_gateway(&self, params: &CreatePrivateGateway) -> ApiResult<String>;
    async fn get_private_gateway(&self, id: &str) -> ApiResult<PrivateGateway>;
    async fn delete_private_gateway(&self, id: &str) -> ApiResult<()>;
    async fn create_static_route(&self, cidr: &str, nexthop: &str, vpc_id: &str) -> ApiResult<String>;
    async fn get_static_route(&self, id: &str) -> ApiResult<StaticRoute>;
    async fn delete_static_route(&self, id: &str) -> ApiResult<()>;

    // Networks
    async fn create_network(&self, params: &CreateNetwork) -> ApiResult<String>;
    async fn get_network(&self, id: &str) -> ApiResult<Network>;
    async fn update_network(&self, params: &UpdateNetwork) -> ApiResult<()>;
    async fn delete_network(&self, id: &str) -> ApiResult<()>;

    // Virtual machines
    async fn deploy_vm(&self, params: &DeployVm) -> ApiResult<VirtualMachine>;
    async fn get_vm(&self, id: &str) -> ApiResult<VirtualMachine>;
    async fn update_vm(&self, params: &UpdateVm) -> ApiResult<()>;
    async fn stop_vm(&self, id: &str) -> ApiResult<()>;
    async fn start_vm(&self, id: &str) -> ApiResult<()>;
    async fn change_service_offering(&self, id: &str, offering_id: &str) -> ApiResult<()>;
    async fn reset_ssh_key(&self, id: &str, keypair: &str) -> ApiResult<()>;
    async fn destroy_vm(&self, id: &str, expunge: bool) -> ApiResult<()>;
    async fn get_zone(&self, id: &str) -> ApiResult<Zone>;

    // NICs and their secondary addresses
    async fn add_nic_to_vm(
        &self,
        vm_id: &str,
        network_id: &str,
        ip_address: Option<&str>,
    ) -> ApiResult<VirtualMachine>;
    async fn remove_nic_from_vm(&self, nic_id: &str, vm_id: &str) -> ApiResult<()>;
    async fn add_ip_to_nic(&self, nic_id: &str, ip_address: Option<&str>) -> ApiResult<SecondaryIp>;
    async fn remove_ip_from_nic(&self, id: &str) -> ApiResult<()>;

    // Volumes
    async fn create_volume(&self, params: &CreateVolume) -> ApiResult<String>;
    async fn get_volume(&self, id: &str) -> ApiResult<Volume>;
    /// Returns the id of the resized volume
    async fn resize_volume(&self, params: &ResizeVolume) -> ApiResult<String>;
    /// Returns the id of the attached volume
    async fn attach_volume(&self, id: &str, vm_id: &str, device_id: Option<u64>) -> ApiResult<String>;
    async fn detach_volume(&self, id: &str) -> ApiResult<()>;
    async fn delete_volume(&self, id: &str) -> ApiResult<()>;

    // Affinity groups
    async fn create_affinity_group(
        &self,
        name: &str,
        description: &str,
        group_type: &str,
    ) -> ApiResult<String>;
    async fn get_affinity_group(&self, id: &str) -> ApiResult<AffinityGroup>;
    async fn delete_affinity_group(&self, id: &str) -> ApiResult<()>;

    // Load balancer rules
    async fn create_lb_rule(&self, params: &CreateLbRule) -> ApiResult<String>;
    async fn assign_to_lb_rule(&self, id: &str, vm_ids: &[String]) -> ApiResult<()>;
    async fn remove_from_lb_rule(&self, id: &str, vm_ids: &[String]) -> ApiResult<()>;
    async fn get_lb_rule(&self, id: &str) -> ApiResult<LbRule>;
    async fn update_lb_rule(&self, params: &UpdateLbRule) -> ApiResult<()>;
    async fn delete_lb_rule(&self, id: &str) -> ApiResult<()>;

    // VPN gateways
    async fn create_vpn_gateway(&self, vpc_id: &str) -> ApiResult<String>;
    async fn get_vpn_gateway(&self, id: &str) -> ApiResult<VpnGateway>;
    async fn delete_vpn_gateway(&self, id: &str) -> ApiResult<()>;
    async fn create_vpn_customer_gateway(&self, params: &VpnCustomerGatewayParams) -> ApiResult<String>;
    async fn get_vpn_customer_gateway(&self, id: &str) -> ApiResult<VpnCustomerGateway>;
    async fn update_vpn_customer_gateway(&self, id: &str, params: &VpnCustomerGatewayParams) -> ApiResult<()>;
    async fn delete_vpn_customer_gateway(&self, id: &str) -> ApiResult<()>;
    async fn create_vpn_connection(
        &self,
        customer_gateway_id: &str,
        vpn_gateway_id: &str,
    ) -> ApiResult<String>;
    async fn get_vpn_connection(&self, id: &str) -> ApiResult<VpnConnection>;
    async fn delete_vpn_connection(&self, id: &str) -> ApiResult<()>;

    // SSH key pairs, addressed by name
    async fn register_ssh_keypair(&self, name: &str, public_key: &str) -> ApiResult<SshKeyPair>;
    async fn create_ssh_keypair(&self, name: &str) -> ApiResult<SshKeyPair>;
    async fn list_ssh_keypairs(&self, name: &str) -> ApiResult<Vec<SshKeyPair>>;
    async fn delete_ssh_keypair(&self, name: &str) -> ApiResult<()>;

    // Templates
    async fn register_template(&self, params: &RegisterTemplate) -> ApiResult<String>;
    async fn get_template(&self, id: &str) -> ApiResult<Template>;
    async fn update_template(&self, params: &UpdateTemplate) -> ApiResult<()>;
    async fn delete_template(&self, id: &str) -> ApiResult<()>;

    // Name to id lookups, failing unless there is exactly one match
    async fn lookup_id(&self, kind: LookupKind, name: &str) -> ApiResult<String>;
    async fn lookup_template_id(&self, name: &str, zone_id: &str) -> ApiResult<String>;
}

/// Object an ACL list is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclTarget<'a> {
    PublicIp(&'a str),
    Network(&'a str),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortForwardingRule {
    pub id: String,
    #[serde(rename = "ipaddressid")]
    pub ip_address_id: String,
    pub protocol: String,
    #[serde(rename = "privateport")]
    pub private_port: u16,
    #[serde(rename = "privateendport")]
    pub private_end_port: u16,
    #[serde(rename = "publicport")]
    pub public_port: u16,
    #[serde(rename = "publicendport")]
    pub public_end_port: u16,
    #[serde(rename = "virtualmachineid")]
    pub virtual_machine_id: String,
    #[serde(rename = "vmguestip", default)]
    pub vm_guest_ip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatePortForward {
    pub ip_address_id: String,
    pub protocol: String,
    pub private_port: u16,
    pub private_end_port: Option<u16>,
    pub public_port: u16,
    pub public_end_port: Option<u16>,
    pub virtual_machine_id: String,
    pub vm_guest_ip: Option<String>,
    pub network_id: Option<String>,
    pub open_firewall: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclItem {
    pub id: String,
    #[serde(rename = "aclid")]
    pub acl_id: String,
    pub action: String,
    #[serde(rename = "cidrlist")]
    pub cidr_list: Vec<String>,
    pub protocol: String,
    #[serde(rename = "icmptype", default)]
    pub icmp_type: Option<i32>,
    #[serde(rename = "icmpcode", default)]
    pub icmp_code: Option<i32>,
    #[serde(rename = "startport", default)]
    pub start_port: Option<u16>,
    #[serde(rename = "endport", default)]
    pub end_port: Option<u16>,
    #[serde(rename = "traffictype")]
    pub traffic_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateAclRule {
    pub acl_id: String,
    pub action: String,
    pub cidr_list: Vec<String>,
    pub protocol: String,
    pub icmp_type: Option<i32>,
    pub icmp_code: Option<i32>,
    pub start_port: Option<u16>,
    pub end_port: Option<u16>,
    pub traffic_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "vpcid")]
    pub vpc_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIpAddress {
    pub id: String,
    #[serde(rename = "ipaddress")]
    pub ip_address: String,
    #[serde(rename = "associatednetworkid", default)]
    pub associated_network_id: String,
    #[serde(rename = "vpcid", default)]
    pub vpc_id: String,
    #[serde(rename = "aclid", default)]
    pub acl_id: String,
    #[serde(rename = "issourcenat", default)]
    pub is_source_nat: bool,
    #[serde(rename = "isstaticnat", default)]
    pub is_static_nat: bool,
    /// Static NAT target
    #[serde(rename = "virtualmachineid", default)]
    pub virtual_machine_id: String,
    #[serde(rename = "vmipaddress", default)]
    pub vm_ip_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociateIpAddress {
    pub network_id: Option<String>,
    pub vpc_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vpc {
    pub id: String,
    pub name: String,
    #[serde(rename = "displaytext", default)]
    pub display_text: String,
    pub cidr: String,
    #[serde(rename = "networkdomain", default)]
    pub network_domain: String,
    #[serde(rename = "sourcenatlist", default)]
    pub source_nat_list: String,
    #[serde(rename = "syslogserverlist", default)]
    pub syslog_server_list: String,
    #[serde(rename = "vpcofferingid")]
    pub vpc_offering_id: String,
    #[serde(rename = "zoneid")]
    pub zone_id: String,
    #[serde(rename = "zonename", default)]
    pub zone_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateVpc {
    pub name: String,
    pub display_text: String,
    pub cidr: String,
    pub vpc_offering_id: String,
    pub zone_id: String,
    pub network_domain: Option<String>,
    pub source_nat_list: Option<String>,
    pub syslog_server_list: Option<String>,
}

/// Only the fields that are `Some` are changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateVpc {
    pub id: String,
    pub name: Option<String>,
    pub display_text: Option<String>,
    pub source_nat_list: Option<String>,
    pub syslog_server_list: Option<String>,
    pub vpc_offering_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offering {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
    #[serde(rename = "displaytext", default)]
    pub display_text: String,
    pub cidr: String,
    #[serde(default)]
    pub gateway: String,
    #[serde(rename = "networkofferingid")]
    pub network_offering_id: String,
    #[serde(rename = "networkofferingname", default)]
    pub network_offering_name: String,
    #[serde(rename = "vpcid", default)]
    pub vpc_id: String,
    #[serde(rename = "aclid", default)]
    pub acl_id: String,
    #[serde(rename = "zoneid")]
    pub zone_id: String,
    #[serde(rename = "zonename", default)]
    pub zone_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateNetwork {
    pub name: String,
    pub display_text: String,
    pub cidr: String,
    pub gateway: Option<String>,
    pub network_offering_id: String,
    pub zone_id: String,
    pub vpc_id: String,
    pub acl_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateNetwork {
    pub id: String,
    pub name: Option<String>,
    pub display_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nic {
    pub id: String,
    #[serde(rename = "networkid")]
    pub network_id: String,
    #[serde(rename = "ipaddress")]
    pub ip_address: String,
    #[serde(rename = "secondaryip", default)]
    pub secondary_ips: Vec<SecondaryIp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryIp {
    pub id: String,
    #[serde(rename = "ipaddress")]
    pub ip_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualMachine {
    pub id: String,
    pub name: String,
    #[serde(rename = "displayname", default)]
    pub display_name: String,
    #[serde(default)]
    pub group: String,
    #[serde(rename = "serviceofferingid")]
    pub service_offering_id: String,
    #[serde(rename = "serviceofferingname", default)]
    pub service_offering_name: String,
    #[serde(rename = "templateid")]
    pub template_id: String,
    #[serde(rename = "templatename", default)]
    pub template_name: String,
    #[serde(rename = "zoneid")]
    pub zone_id: String,
    #[serde(rename = "zonename", default)]
    pub zone_name: String,
    #[serde(rename = "keypair", default)]
    pub keypair: String,
    #[serde(default)]
    pub nic: Vec<Nic>,
    /// Only returned by a deploy
    #[serde(default)]
    pub password: String,
}

impl VirtualMachine {
    /// Network of the NIC holding `ip`, as a primary or secondary address
    pub fn network_for_ip(&self, ip: &str) -> Option<&str> {
        self.nic
            .iter()
            .find(|n| n.ip_address == ip || n.secondary_ips.iter().any(|s| s.ip_address == ip))
            .map(|n| n.network_id.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployVm {
    pub service_offering_id: String,
    pub template_id: String,
    pub zone_id: String,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub network_ids: Vec<String>,
    pub ip_address: Option<String>,
    pub root_disk_size: Option<u64>,
    pub group: Option<String>,
    pub keypair: Option<String>,
    /// Base64 encoded
    pub user_data: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateVm {
    pub id: String,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub group: Option<String>,
    pub user_data: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(rename = "networktype")]
    pub network_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LbRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub algorithm: String,
    #[serde(rename = "publicipid")]
    pub public_ip_id: String,
    #[serde(rename = "networkid", default)]
    pub network_id: String,
    #[serde(rename = "privateport")]
    pub private_port: u16,
    #[serde(rename = "publicport")]
    pub public_port: u16,
    #[serde(default)]
    pub protocol: String,
    #[serde(rename = "clienttimeout", default)]
    pub client_timeout: Option<u32>,
    #[serde(rename = "servertimeout", default)]
    pub server_timeout: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateLbRule {
    pub name: String,
    pub description: String,
    pub algorithm: String,
    pub public_ip_id: String,
    pub network_id: Option<String>,
    pub private_port: u16,
    pub public_port: u16,
    pub protocol: Option<String>,
    pub client_timeout: Option<u32>,
    pub server_timeout: Option<u32>,
    pub open_firewall: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateLbRule {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub algorithm: Option<String>,
    pub client_timeout: Option<u32>,
    pub server_timeout: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpnGateway {
    pub id: String,
    #[serde(rename = "vpcid")]
    pub vpc_id: String,
    #[serde(rename = "publicip")]
    pub public_ip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKeyPair {
    pub name: String,
    pub fingerprint: String,
    /// Only returned when the platform generated the key
    #[serde(rename = "privatekey", default)]
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(rename = "displaytext", default)]
    pub display_text: String,
    pub format: String,
    pub hypervisor: String,
    #[serde(rename = "ostypeid")]
    pub os_type_id: String,
    #[serde(rename = "ostypename", default)]
    pub os_type_name: String,
    #[serde(rename = "isdynamicallyscalable", default)]
    pub is_dynamically_scalable: bool,
    #[serde(rename = "isextractable", default)]
    pub is_extractable: bool,
    #[serde(rename = "isfeatured", default)]
    pub is_featured: bool,
    #[serde(rename = "ispublic", default)]
    pub is_public: bool,
    #[serde(rename = "passwordenabled", default)]
    pub password_enabled: bool,
    #[serde(rename = "isready", default)]
    pub is_ready: bool,
    #[serde(rename = "zoneid")]
    pub zone_id: String,
    #[serde(rename = "zonename", default)]
    pub zone_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterTemplate {
    pub name: String,
    pub display_text: String,
    pub format: String,
    pub hypervisor: String,
    pub os_type_id: String,
    pub url: String,
    pub zone_id: String,
    pub is_dynamically_scalable: Option<bool>,
    pub is_extractable: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_public: Option<bool>,
    pub password_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTemplate {
    pub id: String,
    pub name: Option<String>,
    pub display_text: Option<String>,
    pub format: Option<String>,
    pub os_type_id: Option<String>,
    pub is_dynamically_scalable: Option<bool>,
    pub password_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnableStaticNat {
    pub ip_address_id: String,
    pub virtual_machine_id: String,
    pub vm_guest_ip: Option<String>,
    pub network_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateGateway {
    pub id: String,
    #[serde(rename = "ipaddress")]
    pub ip_address: String,
    #[serde(rename = "networkid")]
    pub network_id: String,
    #[serde(rename = "aclid", default)]
    pub acl_id: String,
    #[serde(rename = "vpcid")]
    pub vpc_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatePrivateGateway {
    pub ip_address: String,
    pub network_id: String,
    pub vpc_id: String,
    pub acl_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRoute {
    pub id: String,
    pub cidr: String,
    pub nexthop: String,
    #[serde(rename = "vpcid")]
    pub vpc_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    pub name: String,
    #[serde(rename = "diskofferingid")]
    pub disk_offering_id: String,
    #[serde(rename = "diskofferingname", default)]
    pub disk_offering_name: String,
    /// Bytes
    pub size: u64,
    #[serde(rename = "diskcontroller", default)]
    pub disk_controller: String,
    #[serde(rename = "zoneid")]
    pub zone_id: String,
    #[serde(rename = "zonename", default)]
    pub zone_name: String,
    /// Attach timestamp, empty while detached
    #[serde(default)]
    pub attached: String,
    #[serde(rename = "deviceid", default)]
    pub device_id: u64,
    #[serde(rename = "virtualmachineid", default)]
    pub virtual_machine_id: String,
}

impl Volume {
    pub fn is_attached(&self) -> bool {
        !self.attached.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateVolume {
    pub name: String,
    pub disk_offering_id: String,
    /// GB
    pub size: Option<u64>,
    pub disk_controller: Option<String>,
    pub zone_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResizeVolume {
    pub id: String,
    pub disk_offering_id: String,
    /// GB
    pub size: Option<u64>,
    pub shrink_ok: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffinityGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub group_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpnCustomerGateway {
    pub id: String,
    pub name: String,
    /// Comma separated
    #[serde(rename = "cidrlist")]
    pub cidr_list: String,
    #[serde(rename = "esppolicy")]
    pub esp_policy: String,
    pub gateway: String,
    #[serde(rename = "ikepolicy")]
    pub ike_policy: String,
    #[serde(rename = "ipsecpsk")]
    pub ipsec_psk: String,
    #[serde(default)]
    pub dpd: bool,
    #[serde(rename = "esplifetime", default)]
    pub esp_lifetime: u64,
    #[serde(rename = "ikelifetime", default)]
    pub ike_lifetime: u64,
}

/// Create and update share the same parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VpnCustomerGatewayParams {
    pub name: String,
    pub cidr_list: Vec<String>,
    pub esp_policy: String,
    pub gateway: String,
    pub ike_policy: String,
    pub ipsec_psk: String,
    pub dpd: Option<bool>,
    pub esp_lifetime: Option<u64>,
    pub ike_lifetime: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpnConnection {
    pub id: String,
    #[serde(rename = "s2scustomergatewayid")]
    pub customer_gateway_id: String,
    #[serde(rename = "s2svpngatewayid")]
    pub vpn_gateway_id: String,
    #[serde(default)]
    pub state: String,
}
