//! Host runtime entry points
//!
//! The host hands over attributes as JSON and persists whatever state comes
//! back. Each call is routed to the typed adapter of its resource kind.

use crate::api::CosmicApi;
use crate::data_source::{self, Filter, NetworkAclData};
use crate::kind::ResourceKind;
use crate::resources::{
    AffinityGroupResource, DiskResource, InstanceResource, IpAddressResource,
    LoadBalancerRuleResource, NetworkAclResource, NetworkAclRuleResource, NetworkResource,
    NicResource, PortForwardResource, PrivateGatewayResource, Resource, ResourceContext,
    SecondaryIpAddressResource, SshKeyPairResource, StaticNatResource, StaticRouteResource,
    TemplateResource, VpcResource, VpnConnectionResource, VpnCustomerGatewayResource,
    VpnGatewayResource, ipaddress, parse, port_forward, secondary_ipaddress,
};
use cosmicflow_cloud::{ActionType, ApplyResult, CloudError, Result};
use cosmicflow_config::ProviderConfig;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Cosmic provider
pub struct CosmicProvider {
    ctx: ResourceContext,
}

impl CosmicProvider {
    pub fn new(api: Arc<dyn CosmicApi>, config: Arc<ProviderConfig>) -> Self {
        Self {
            ctx: ResourceContext::new(api, config),
        }
    }

    pub fn context(&self) -> &ResourceContext {
        &self.ctx
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.ctx.config
    }

    pub async fn create(&self, kind: ResourceKind, attrs: Value) -> ApplyResult<Value> {
        self.dispatch(ActionType::Create, kind, None, attrs).await
    }

    /// `None` state means the resource vanished outside of the host's control
    pub async fn read(&self, kind: ResourceKind, state: Value) -> ApplyResult<Value> {
        self.dispatch(ActionType::Read, kind, None, state).await
    }

    pub async fn update(&self, kind: ResourceKind, prior: Value, desired: Value) -> ApplyResult<Value> {
        self.dispatch(ActionType::Update, kind, Some(prior), desired).await
    }

    pub async fn delete(&self, kind: ResourceKind, state: Value) -> ApplyResult<Value> {
        self.dispatch(ActionType::Delete, kind, None, state).await
    }

    /// Import existing port forwarding rules given as comma separated ids
    pub async fn import_port_forwards(&self, ids: &str) -> Result<Value> {
        let state = port_forward::import(&self.ctx, ids).await?;
        Ok(serde_json::to_value(state)?)
    }

    pub async fn import_ip_address(&self, id: &str) -> Result<Value> {
        let state = ipaddress::import(&self.ctx, id).await?;
        Ok(serde_json::to_value(state)?)
    }

    /// Import a secondary address given as `<instance id>/<ip address>`
    pub async fn import_secondary_ip_address(&self, id: &str) -> Result<Value> {
        let state = secondary_ipaddress::import(&self.ctx, id).await?;
        Ok(serde_json::to_value(state)?)
    }

    /// `cosmic_network_acl` data source
    pub async fn lookup_network_acl(&self, filters: &[Filter]) -> Result<NetworkAclData> {
        data_source::lookup_network_acl(self.ctx.api.as_ref(), filters).await
    }

    async fn dispatch(
        &self,
        action: ActionType,
        kind: ResourceKind,
        prior: Option<Value>,
        attrs: Value,
    ) -> ApplyResult<Value> {
        tracing::debug!(kind = %kind, action = %action, "dispatching");
        match kind {
            ResourceKind::PortForward => self.apply::<PortForwardResource>(action, prior, attrs).await,
            ResourceKind::NetworkAclRule => {
                self.apply::<NetworkAclRuleResource>(action, prior, attrs).await
            }
            ResourceKind::NetworkAcl => self.apply::<NetworkAclResource>(action, prior, attrs).await,
            ResourceKind::Vpc => self.apply::<VpcResource>(action, prior, attrs).await,
            ResourceKind::Network => self.apply::<NetworkResource>(action, prior, attrs).await,
            ResourceKind::IpAddress => self.apply::<IpAddressResource>(action, prior, attrs).await,
            ResourceKind::Instance => self.apply::<InstanceResource>(action, prior, attrs).await,
            ResourceKind::LoadbalancerRule => {
                self.apply::<LoadBalancerRuleResource>(action, prior, attrs).await
            }
            ResourceKind::VpnGateway => self.apply::<VpnGatewayResource>(action, prior, attrs).await,
            ResourceKind::VpnCustomerGateway => {
                self.apply::<VpnCustomerGatewayResource>(action, prior, attrs).await
            }
            ResourceKind::VpnConnection => {
                self.apply::<VpnConnectionResource>(action, prior, attrs).await
            }
            ResourceKind::PrivateGateway => {
                self.apply::<PrivateGatewayResource>(action, prior, attrs).await
            }
            ResourceKind::StaticRoute => self.apply::<StaticRouteResource>(action, prior, attrs).await,
            ResourceKind::StaticNat => self.apply::<StaticNatResource>(action, prior, attrs).await,
            ResourceKind::SshKeypair => self.apply::<SshKeyPairResource>(action, prior, attrs).await,
            ResourceKind::Template => self.apply::<TemplateResource>(action, prior, attrs).await,
            ResourceKind::Disk => self.apply::<DiskResource>(action, prior, attrs).await,
            ResourceKind::Nic => self.apply::<NicResource>(action, prior, attrs).await,
            ResourceKind::SecondaryIpAddress => {
                self.apply::<SecondaryIpAddressResource>(action, prior, attrs).await
            }
            ResourceKind::AffinityGroup => {
                self.apply::<AffinityGroupResource>(action, prior, attrs).await
            }
        }
    }

    async fn apply<R: Resource>(
        &self,
        action: ActionType,
        prior: Option<Value>,
        attrs: Value,
    ) -> ApplyResult<Value> {
        // State the host already holds stays persisted when the call is rejected
        let kept = match action {
            ActionType::Create => None,
            ActionType::Update => prior.clone(),
            ActionType::Read | ActionType::Delete => Some(attrs.clone()),
        };

        let desired: R = match parse(R::KIND, attrs) {
            Ok(desired) => desired,
            Err(e) => return rejected(kept, e),
        };
        if matches!(action, ActionType::Create | ActionType::Update) {
            if let Err(e) = desired.validate() {
                return rejected(kept, e);
            }
        }

        let ctx = &self.ctx;
        let result = match action {
            ActionType::Create => desired.create(ctx).await,
            ActionType::Read => desired.read(ctx).await,
            ActionType::Update => {
                let prior: R = match prior.map(|p| parse(R::KIND, p)) {
                    Some(Ok(prior)) => prior,
                    Some(Err(e)) => return rejected(kept, e),
                    None => {
                        let err = CloudError::InvalidConfig(format!("updating {} requires its prior state", R::KIND));
                        return rejected(kept, err);
                    }
                };
                R::update(prior, desired, ctx).await
            }
            ActionType::Delete => desired.delete(ctx).await,
        };

        if let Some(e) = &result.error {
            tracing::warn!(kind = %R::KIND, action = %action, error = %e, "operation failed");
        }
        into_value(result)
    }
}

fn rejected(kept: Option<Value>, error: CloudError) -> ApplyResult<Value> {
    ApplyResult {
        state: kept,
        error: Some(error),
    }
}

fn into_value<S: Serialize>(result: ApplyResult<S>) -> ApplyResult<Value> {
    let ApplyResult { state, error } = result;
    match state.map(serde_json::to_value).transpose() {
        Ok(state) => ApplyResult { state, error },
        Err(e) => ApplyResult {
            state: None,
            error: Some(error.unwrap_or_else(|| e.into())),
        },
    }
}
