//! `cosmic_network_acl`: an ACL list inside a VPC

use super::{Resource, ResourceContext, found, read_back};
use crate::kind::ResourceKind;
use async_trait::async_trait;
use cosmicflow_cloud::{ApplyResult, CloudError, Result, RetryConfig, classify, retry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkAclResource {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub vpc_id: String,
}

impl NetworkAclResource {
    fn description(&self) -> String {
        super::non_empty(&self.description).unwrap_or_else(|| self.name.clone())
    }
}

#[async_trait]
impl Resource for NetworkAclResource {
    const KIND: ResourceKind = ResourceKind::NetworkAcl;

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(CloudError::validation("name must not be empty"));
        }
        if self.vpc_id.is_empty() {
            return Err(CloudError::validation("vpc_id must not be empty"));
        }
        Ok(())
    }

    async fn create(mut self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(name = %self.name, vpc_id = %self.vpc_id, "creating network ACL list");
        match ctx
            .api
            .create_acl_list(&self.name, &self.description(), &self.vpc_id)
            .await
        {
            Ok(id) => {
                self.id = id;
                read_back(self, ctx).await
            }
            Err(e) => ApplyResult::failed(CloudError::operation(
                format!("creating network ACL list {}", self.name),
                e,
            )),
        }
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        match found(ctx.api.get_acl_list(&self.id).await, &self.id) {
            Ok(Some(list)) => ApplyResult::ok(NetworkAclResource {
                id: list.id,
                name: list.name,
                description: Some(list.description),
                vpc_id: list.vpc_id,
            }),
            Ok(None) => {
                tracing::debug!(name = %self.name, "network ACL list does no longer exist");
                ApplyResult::gone()
            }
            Err(e) => ApplyResult::partial(self, e),
        }
    }

    async fn update(prior: Self, desired: Self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let state = NetworkAclResource {
            id: prior.id.clone(),
            ..desired
        };

        if state.name != prior.name || state.description() != prior.description() {
            if let Err(e) = ctx
                .api
                .update_acl_list(&state.id, &state.name, &state.description())
                .await
            {
                return ApplyResult::partial(
                    prior,
                    CloudError::operation(format!("updating network ACL {}", state.name), e),
                );
            }
        }
        read_back(state, ctx).await
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let policy = RetryConfig {
            max_attempts: 3,
            ..ctx.config.retry
        };
        let id = self.id.as_str();
        tracing::info!(id, name = %self.name, "deleting network ACL list");

        // A vanished list ends the loop as success
        let result = retry(&policy, "delete network ACL list", || async move {
            classify::ignore_gone(ctx.api.delete_acl_list(id).await, id)
        })
        .await;
        match result {
            Ok(()) => ApplyResult::gone(),
            Err(e) => {
                let err = CloudError::operation(format!("deleting network ACL list {}", self.name), e);
                ApplyResult::partial(self, err)
            }
        }
    }
}
