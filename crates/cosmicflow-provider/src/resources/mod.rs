//! Resource adapters
//!
//! Every resource kind is a strongly typed attribute struct implementing
//! [`Resource`]. The same struct is the configuration the host hands in and
//! the state handed back, computed fields included.

pub mod affinity_group;
pub mod disk;
pub mod instance;
pub mod ipaddress;
pub mod loadbalancer_rule;
pub mod network;
pub mod network_acl;
pub mod network_acl_rule;
pub mod nic;
pub mod port_forward;
pub mod private_gateway;
pub mod secondary_ipaddress;
pub mod ssh_keypair;
pub mod static_nat;
pub mod static_route;
pub mod template;
pub mod vpc;
pub mod vpn_connection;
pub mod vpn_customer_gateway;
pub mod vpn_gateway;

pub use affinity_group::AffinityGroupResource;
pub use disk::DiskResource;
pub use instance::InstanceResource;
pub use ipaddress::IpAddressResource;
pub use loadbalancer_rule::LoadBalancerRuleResource;
pub use network::NetworkResource;
pub use network_acl::NetworkAclResource;
pub use network_acl_rule::NetworkAclRuleResource;
pub use nic::NicResource;
pub use port_forward::PortForwardResource;
pub use private_gateway::PrivateGatewayResource;
pub use secondary_ipaddress::SecondaryIpAddressResource;
pub use ssh_keypair::SshKeyPairResource;
pub use static_nat::StaticNatResource;
pub use static_route::StaticRouteResource;
pub use template::TemplateResource;
pub use vpc::VpcResource;
pub use vpn_connection::VpnConnectionResource;
pub use vpn_customer_gateway::VpnCustomerGatewayResource;
pub use vpn_gateway::VpnGatewayResource;

use crate::api::{ApiResult, CosmicApi};
use crate::kind::ResourceKind;
use async_trait::async_trait;
use cosmicflow_cloud::{ApplyResult, CloudError, Result, classify};
use cosmicflow_config::ProviderConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Everything an adapter needs to reach the platform
#[derive(Clone)]
pub struct ResourceContext {
    pub api: Arc<dyn CosmicApi>,
    pub config: Arc<ProviderConfig>,
}

impl ResourceContext {
    pub fn new(api: Arc<dyn CosmicApi>, config: Arc<ProviderConfig>) -> Self {
        Self { api, config }
    }
}

/// Lifecycle of one resource kind
///
/// `None` state in a returned [`ApplyResult`] means the resource does not
/// exist. Whenever the resource exists after a failed call, the state is
/// returned together with the error.
#[async_trait]
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + Sized + 'static {
    const KIND: ResourceKind;

    /// Checks that need no remote call
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    async fn create(self, ctx: &ResourceContext) -> ApplyResult<Self>;

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self>;

    async fn update(prior: Self, desired: Self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let _ = (desired, ctx);
        ApplyResult::partial(
            prior,
            CloudError::InvalidConfig(format!("{} does not support in-place updates", Self::KIND)),
        )
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self>;
}

/// Deserialize host attributes, rejecting unknown or mistyped fields
pub(crate) fn parse<T: DeserializeOwned>(kind: ResourceKind, attrs: serde_json::Value) -> Result<T> {
    serde_json::from_value(attrs)
        .map_err(|e| CloudError::validation(format!("invalid {} attributes: {}", kind, e)))
}

/// Treat an "already gone" answer of a get-by-id as absence
pub(crate) fn found<T>(result: ApiResult<T>, id: &str) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if classify::is_gone(&e, id) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Read back after a successful create or update. A failed read keeps the
/// state known so far.
pub(crate) async fn read_back<R: Resource>(state: R, ctx: &ResourceContext) -> ApplyResult<R> {
    let known = state.clone();
    match state.read(ctx).await {
        ApplyResult {
            state: None,
            error: Some(e),
        } => ApplyResult::partial(known, e),
        result => result,
    }
}

/// Pick `value` unless it is empty
pub(crate) fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
