//! `cosmic_ssh_keypair`: addressed by name, the name is its id

use super::{Resource, ResourceContext, non_empty, read_back};
use crate::kind::ResourceKind;
use async_trait::async_trait;
use cosmicflow_cloud::{ApplyResult, CloudError, Result, classify};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshKeyPairResource {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Registered as is. Without it the platform generates a key pair.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    /// Only known right after the platform generated the key pair
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default)]
    pub fingerprint: String,
}

#[async_trait]
impl Resource for SshKeyPairResource {
    const KIND: ResourceKind = ResourceKind::SshKeypair;

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(CloudError::validation("name must not be empty"));
        }
        Ok(())
    }

    async fn create(mut self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let result = match non_empty(&self.public_key) {
            Some(public_key) => {
                tracing::info!(name = %self.name, "registering SSH key pair");
                ctx.api.register_ssh_keypair(&self.name, &public_key).await
            }
            None => {
                tracing::info!(name = %self.name, "generating SSH key pair");
                ctx.api.create_ssh_keypair(&self.name).await
            }
        };

        match result {
            Ok(keypair) => {
                self.id = keypair.name;
                self.fingerprint = keypair.fingerprint;
                self.private_key = keypair.private_key;
                read_back(self, ctx).await
            }
            Err(e) => ApplyResult::failed(CloudError::operation(
                format!("creating key pair {}", self.name),
                e,
            )),
        }
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let name = if self.id.is_empty() { &self.name } else { &self.id };
        tracing::debug!(name = %name, "looking for key pair");

        let keypairs = match ctx.api.list_ssh_keypairs(name).await {
            Ok(keypairs) => keypairs,
            Err(e) => return ApplyResult::partial(self, e),
        };

        // Key pair names are unique within an account
        match keypairs.into_iter().next() {
            Some(keypair) => {
                let mut state = self;
                state.id = keypair.name.clone();
                state.name = keypair.name;
                state.fingerprint = keypair.fingerprint;
                ApplyResult::ok(state)
            }
            None => {
                tracing::debug!(name = %self.name, "key pair does not exist");
                ApplyResult::gone()
            }
        }
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(name = %self.id, "deleting SSH key pair");
        let result = ctx.api.delete_ssh_keypair(&self.id).await;
        match classify::ignore_gone(result, &self.id) {
            Ok(()) => ApplyResult::gone(),
            Err(e) => ApplyResult::partial(self, CloudError::operation("deleting key pair", e)),
        }
    }
}
