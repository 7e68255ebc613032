//! `cosmic_static_nat`: one-to-one NAT of a public IP onto a machine
//!
//! The resource id is the id of the public IP.

use super::{Resource, ResourceContext, found, non_empty, read_back};
use crate::api::EnableStaticNat;
use crate::kind::ResourceKind;
use async_trait::async_trait;
use cosmicflow_cloud::{ApplyResult, CloudError, Result, classify, retry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticNatResource {
    #[serde(default)]
    pub id: String,
    pub ip_address_id: String,
    pub virtual_machine_id: String,
    /// Defaults to the primary address of the machine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_guest_ip: Option<String>,
}

#[async_trait]
impl Resource for StaticNatResource {
    const KIND: ResourceKind = ResourceKind::StaticNat;

    fn validate(&self) -> Result<()> {
        if self.ip_address_id.is_empty() {
            return Err(CloudError::validation("ip_address_id must not be empty"));
        }
        if self.virtual_machine_id.is_empty() {
            return Err(CloudError::validation("virtual_machine_id must not be empty"));
        }
        Ok(())
    }

    async fn create(mut self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let api = ctx.api.as_ref();
        let vm_id = self.virtual_machine_id.as_str();
        let vm = match retry(&ctx.config.retry, "get virtual machine", || api.get_vm(vm_id)).await {
            Ok(vm) => vm,
            Err(e) => {
                return ApplyResult::failed(CloudError::operation(
                    format!("retrieving virtual machine {}", vm_id),
                    e,
                ));
            }
        };

        let vm_guest_ip = non_empty(&self.vm_guest_ip);
        let network_id = match vm_guest_ip.as_deref() {
            Some(ip) => vm.network_for_ip(ip).map(str::to_string),
            None => vm.nic.first().map(|nic| nic.network_id.clone()),
        };
        let params = EnableStaticNat {
            ip_address_id: self.ip_address_id.clone(),
            virtual_machine_id: vm.id.clone(),
            vm_guest_ip,
            network_id,
        };

        tracing::info!(ip_address_id = %self.ip_address_id, vm_id, "enabling static NAT");
        if let Err(e) = api.enable_static_nat(&params).await {
            return ApplyResult::failed(CloudError::operation(
                format!("enabling static NAT on IP {}", self.ip_address_id),
                e,
            ));
        }

        self.id = self.ip_address_id.clone();
        read_back(self, ctx).await
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let ip = match found(ctx.api.get_public_ip(&self.id).await, &self.id) {
            Ok(Some(ip)) => ip,
            Ok(None) => {
                tracing::debug!(id = %self.id, "public IP of static NAT does no longer exist");
                return ApplyResult::gone();
            }
            Err(e) => return ApplyResult::partial(self, e),
        };

        if !ip.is_static_nat {
            tracing::debug!(id = %self.id, "static NAT is no longer enabled");
            return ApplyResult::gone();
        }

        ApplyResult::ok(StaticNatResource {
            id: ip.id.clone(),
            ip_address_id: ip.id,
            virtual_machine_id: ip.virtual_machine_id,
            vm_guest_ip: Some(ip.vm_ip_address).filter(|v| !v.is_empty()),
        })
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(id = %self.id, "disabling static NAT");
        let result = ctx.api.disable_static_nat(&self.id).await;
        match classify::ignore_gone(result, &self.id) {
            Ok(()) => ApplyResult::gone(),
            Err(e) => {
                let err = CloudError::operation(format!("disabling static NAT on IP {}", self.id), e);
                ApplyResult::partial(self, err)
            }
        }
    }
}
