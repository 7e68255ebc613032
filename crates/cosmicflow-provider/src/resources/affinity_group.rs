//! `cosmic_affinity_group`

use super::{Resource, ResourceContext, found, non_empty, read_back};
use crate::kind::ResourceKind;
use async_trait::async_trait;
use cosmicflow_cloud::{ApplyResult, CloudError, Result, classify};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AffinityGroupResource {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `host affinity` or `host anti-affinity`
    #[serde(rename = "type")]
    pub group_type: String,
}

#[async_trait]
impl Resource for AffinityGroupResource {
    const KIND: ResourceKind = ResourceKind::AffinityGroup;

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(CloudError::validation("name must not be empty"));
        }
        if self.group_type.is_empty() {
            return Err(CloudError::validation("type must not be empty"));
        }
        Ok(())
    }

    async fn create(mut self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let description = non_empty(&self.description).unwrap_or_else(|| self.name.clone());

        tracing::info!(name = %self.name, group_type = %self.group_type, "creating affinity group");
        match ctx
            .api
            .create_affinity_group(&self.name, &description, &self.group_type)
            .await
        {
            Ok(id) => {
                self.id = id;
                read_back(self, ctx).await
            }
            Err(e) => ApplyResult::failed(CloudError::operation(
                format!("creating affinity group {}", self.name),
                e,
            )),
        }
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        match found(ctx.api.get_affinity_group(&self.id).await, &self.id) {
            Ok(Some(group)) => ApplyResult::ok(AffinityGroupResource {
                id: group.id,
                name: group.name,
                description: Some(group.description),
                group_type: group.group_type,
            }),
            Ok(None) => {
                tracing::debug!(name = %self.name, "affinity group does no longer exist");
                ApplyResult::gone()
            }
            Err(e) => ApplyResult::partial(self, e),
        }
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(id = %self.id, name = %self.name, "deleting affinity group");
        let result = ctx.api.delete_affinity_group(&self.id).await;
        match classify::ignore_gone(result, &self.id) {
            Ok(()) => ApplyResult::gone(),
            Err(e) => ApplyResult::partial(self, CloudError::operation("deleting affinity group", e)),
        }
    }
}
