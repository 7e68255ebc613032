//! `cosmic_vpn_gateway`: the site-to-site VPN endpoint of a VPC

use super::{Resource, ResourceContext, found, read_back};
use crate::kind::ResourceKind;
use async_trait::async_trait;
use cosmicflow_cloud::{ApplyResult, CloudError, Result, classify};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VpnGatewayResource {
    #[serde(default)]
    pub id: String,
    pub vpc_id: String,
    /// Computed
    #[serde(default)]
    pub public_ip: String,
}

#[async_trait]
impl Resource for VpnGatewayResource {
    const KIND: ResourceKind = ResourceKind::VpnGateway;

    fn validate(&self) -> Result<()> {
        if self.vpc_id.is_empty() {
            return Err(CloudError::validation("vpc_id must not be empty"));
        }
        Ok(())
    }

    async fn create(mut self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(vpc_id = %self.vpc_id, "creating VPN gateway");
        match ctx.api.create_vpn_gateway(&self.vpc_id).await {
            Ok(id) => {
                self.id = id;
                read_back(self, ctx).await
            }
            Err(e) => ApplyResult::failed(CloudError::operation(
                format!("creating VPN Gateway for VPC ID {}", self.vpc_id),
                e,
            )),
        }
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        match found(ctx.api.get_vpn_gateway(&self.id).await, &self.id) {
            Ok(Some(gateway)) => ApplyResult::ok(VpnGatewayResource {
                id: gateway.id,
                vpc_id: gateway.vpc_id,
                public_ip: gateway.public_ip,
            }),
            Ok(None) => {
                tracing::debug!(vpc_id = %self.vpc_id, "VPN gateway does no longer exist");
                ApplyResult::gone()
            }
            Err(e) => ApplyResult::partial(self, e),
        }
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(id = %self.id, vpc_id = %self.vpc_id, "deleting VPN gateway");
        let result = ctx.api.delete_vpn_gateway(&self.id).await;
        match classify::ignore_gone(result, &self.id) {
            Ok(()) => ApplyResult::gone(),
            Err(e) => {
                let err = CloudError::operation(format!("deleting VPN Gateway for VPC {}", self.vpc_id), e);
                ApplyResult::partial(self, err)
            }
        }
    }
}
