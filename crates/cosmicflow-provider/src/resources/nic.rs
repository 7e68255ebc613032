//! `cosmic_nic`: an additional network interface of a virtual machine

use super::{Resource, ResourceContext, found, non_empty, read_back};
use crate::kind::ResourceKind;
use async_trait::async_trait;
use cosmicflow_cloud::{ApplyResult, CloudError, Result, RetryConfig, classify, retry};
use serde::{Deserialize, Serialize};

/// Adding a NIC fails while the machine is busy with another job
pub(crate) const ATTACH_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NicResource {
    #[serde(default)]
    pub id: String,
    pub network_id: String,
    /// Picked by the platform when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    pub virtual_machine_id: String,
}

#[async_trait]
impl Resource for NicResource {
    const KIND: ResourceKind = ResourceKind::Nic;

    fn validate(&self) -> Result<()> {
        if self.network_id.is_empty() {
            return Err(CloudError::validation("network_id must not be empty"));
        }
        if self.virtual_machine_id.is_empty() {
            return Err(CloudError::validation("virtual_machine_id must not be empty"));
        }
        Ok(())
    }

    async fn create(mut self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let policy = RetryConfig {
            max_attempts: ATTACH_ATTEMPTS,
            ..ctx.config.retry
        };
        let vm_id = self.virtual_machine_id.as_str();
        let network_id = self.network_id.as_str();
        let ip_address = non_empty(&self.ip_address);

        tracing::info!(vm_id, network_id, "adding NIC to virtual machine");
        let vm = match retry(&policy, "add NIC to virtual machine", || {
            ctx.api.add_nic_to_vm(vm_id, network_id, ip_address.as_deref())
        })
        .await
        {
            Ok(vm) => vm,
            Err(e) => return ApplyResult::failed(CloudError::operation("creating the new NIC", e)),
        };

        match vm.nic.into_iter().find(|n| n.network_id == self.network_id) {
            Some(nic) => {
                self.id = nic.id;
                read_back(self, ctx).await
            }
            None => ApplyResult::failed(CloudError::ResourceNotFound(format!(
                "Could not find NIC ID for network ID: {}",
                self.network_id
            ))),
        }
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let vm = match found(ctx.api.get_vm(&self.virtual_machine_id).await, &self.virtual_machine_id) {
            Ok(Some(vm)) => vm,
            Ok(None) => {
                tracing::debug!(vm_id = %self.virtual_machine_id, "instance does no longer exist");
                return ApplyResult::gone();
            }
            Err(e) => return ApplyResult::partial(self, e),
        };

        match vm.nic.into_iter().find(|n| n.id == self.id) {
            Some(nic) => ApplyResult::ok(NicResource {
                id: nic.id,
                network_id: nic.network_id,
                ip_address: Some(nic.ip_address),
                virtual_machine_id: vm.id,
            }),
            None => {
                tracing::debug!(network_id = %self.network_id, "NIC does no longer exist");
                ApplyResult::gone()
            }
        }
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(id = %self.id, vm_id = %self.virtual_machine_id, "removing NIC");
        let result = ctx
            .api
            .remove_nic_from_vm(&self.id, &self.virtual_machine_id)
            .await;
        match classify::ignore_gone(result, &self.id) {
            Ok(()) => ApplyResult::gone(),
            Err(e) => ApplyResult::partial(self, CloudError::operation("deleting NIC", e)),
        }
    }
}
