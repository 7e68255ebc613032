//! `cosmic_vpn_connection`: links a VPN gateway to a customer gateway

use super::{Resource, ResourceContext, found, read_back};
use crate::kind::ResourceKind;
use async_trait::async_trait;
use cosmicflow_cloud::{ApplyResult, CloudError, Result, classify};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VpnConnectionResource {
    #[serde(default)]
    pub id: String,
    pub customer_gateway_id: String,
    pub vpn_gateway_id: String,
}

#[async_trait]
impl Resource for VpnConnectionResource {
    const KIND: ResourceKind = ResourceKind::VpnConnection;

    fn validate(&self) -> Result<()> {
        if self.customer_gateway_id.is_empty() || self.vpn_gateway_id.is_empty() {
            return Err(CloudError::validation(
                "customer_gateway_id and vpn_gateway_id must not be empty",
            ));
        }
        Ok(())
    }

    async fn create(mut self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(
            customer_gateway_id = %self.customer_gateway_id,
            vpn_gateway_id = %self.vpn_gateway_id,
            "creating VPN connection"
        );
        match ctx
            .api
            .create_vpn_connection(&self.customer_gateway_id, &self.vpn_gateway_id)
            .await
        {
            Ok(id) => {
                self.id = id;
                read_back(self, ctx).await
            }
            Err(e) => ApplyResult::failed(CloudError::operation("creating VPN Connection", e)),
        }
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        match found(ctx.api.get_vpn_connection(&self.id).await, &self.id) {
            Ok(Some(connection)) => ApplyResult::ok(VpnConnectionResource {
                id: connection.id,
                customer_gateway_id: connection.customer_gateway_id,
                vpn_gateway_id: connection.vpn_gateway_id,
            }),
            Ok(None) => {
                tracing::debug!(id = %self.id, "VPN connection does no longer exist");
                ApplyResult::gone()
            }
            Err(e) => ApplyResult::partial(self, e),
        }
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(id = %self.id, "deleting VPN connection");
        let result = ctx.api.delete_vpn_connection(&self.id).await;
        match classify::ignore_gone(result, &self.id) {
            Ok(()) => ApplyResult::gone(),
            Err(e) => ApplyResult::partial(self, CloudError::operation("deleting VPN Connection", e)),
        }
    }
}
