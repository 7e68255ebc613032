//! `cosmic_static_route`: a VPC route towards a private gateway

use super::{Resource, ResourceContext, found, read_back};
use crate::kind::ResourceKind;
use async_trait::async_trait;
use cosmicflow_cloud::{ApplyResult, CloudError, Result, classify};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticRouteResource {
    #[serde(default)]
    pub id: String,
    pub cidr: String,
    pub nexthop: String,
    pub vpc_id: String,
}

#[async_trait]
impl Resource for StaticRouteResource {
    const KIND: ResourceKind = ResourceKind::StaticRoute;

    fn validate(&self) -> Result<()> {
        for (field, value) in [("cidr", &self.cidr), ("nexthop", &self.nexthop), ("vpc_id", &self.vpc_id)] {
            if value.is_empty() {
                return Err(CloudError::validation(format!("{} must not be empty", field)));
            }
        }
        Ok(())
    }

    async fn create(mut self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(
            cidr = %self.cidr,
            nexthop = %self.nexthop,
            vpc_id = %self.vpc_id,
            "creating static route"
        );
        match ctx
            .api
            .create_static_route(&self.cidr, &self.nexthop, &self.vpc_id)
            .await
        {
            Ok(id) => {
                self.id = id;
                read_back(self, ctx).await
            }
            Err(e) => ApplyResult::failed(CloudError::operation(
                format!("creating static route for {}", self.cidr),
                e,
            )),
        }
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        match found(ctx.api.get_static_route(&self.id).await, &self.id) {
            Ok(Some(route)) => ApplyResult::ok(StaticRouteResource {
                id: route.id,
                cidr: route.cidr,
                nexthop: route.nexthop,
                vpc_id: route.vpc_id,
            }),
            Ok(None) => {
                tracing::debug!(id = %self.id, "static route does no longer exist");
                ApplyResult::gone()
            }
            Err(e) => ApplyResult::partial(self, e),
        }
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(id = %self.id, cidr = %self.cidr, "deleting static route");
        let result = ctx.api.delete_static_route(&self.id).await;
        match classify::ignore_gone(result, &self.id) {
            Ok(()) => ApplyResult::gone(),
            Err(e) => {
                let err = CloudError::operation(format!("deleting static route for {}", self.cidr), e);
                ApplyResult::partial(self, err)
            }
        }
    }
}
