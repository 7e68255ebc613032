//! `cosmic_private_gateway`

use super::{Resource, ResourceContext, found, read_back};
use crate::api::CreatePrivateGateway;
use crate::kind::ResourceKind;
use async_trait::async_trait;
use cosmicflow_cloud::{ApplyResult, CloudError, Result, classify};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrivateGatewayResource {
    #[serde(default)]
    pub id: String,
    pub ip_address: String,
    pub network_id: String,
    pub acl_id: String,
    pub vpc_id: String,
}

#[async_trait]
impl Resource for PrivateGatewayResource {
    const KIND: ResourceKind = ResourceKind::PrivateGateway;

    fn validate(&self) -> Result<()> {
        let required = [
            ("ip_address", &self.ip_address),
            ("network_id", &self.network_id),
            ("acl_id", &self.acl_id),
            ("vpc_id", &self.vpc_id),
        ];
        match required.iter().find(|(_, value)| value.is_empty()) {
            Some((field, _)) => Err(CloudError::validation(format!("{} must not be empty", field))),
            None => Ok(()),
        }
    }

    async fn create(mut self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let params = CreatePrivateGateway {
            ip_address: self.ip_address.clone(),
            network_id: self.network_id.clone(),
            vpc_id: self.vpc_id.clone(),
            acl_id: self.acl_id.clone(),
        };

        tracing::info!(ip_address = %self.ip_address, vpc_id = %self.vpc_id, "creating private gateway");
        match ctx.api.create_private_gateway(&params).await {
            Ok(id) => {
                self.id = id;
                read_back(self, ctx).await
            }
            Err(e) => ApplyResult::failed(CloudError::operation(
                format!("creating private gateway for {}", self.ip_address),
                e,
            )),
        }
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        match found(ctx.api.get_private_gateway(&self.id).await, &self.id) {
            Ok(Some(gateway)) => ApplyResult::ok(PrivateGatewayResource {
                id: gateway.id,
                ip_address: gateway.ip_address,
                network_id: gateway.network_id,
                acl_id: gateway.acl_id,
                vpc_id: gateway.vpc_id,
            }),
            Ok(None) => {
                tracing::debug!(id = %self.id, "private gateway does no longer exist");
                ApplyResult::gone()
            }
            Err(e) => ApplyResult::partial(self, e),
        }
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(id = %self.id, ip_address = %self.ip_address, "deleting private gateway");
        let result = ctx.api.delete_private_gateway(&self.id).await;
        match classify::ignore_gone(result, &self.id) {
            Ok(()) => ApplyResult::gone(),
            Err(e) => {
                let err = CloudError::operation(format!("deleting private gateway {}", self.id), e);
                ApplyResult::partial(self, err)
            }
        }
    }
}
