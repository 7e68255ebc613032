//! `cosmic_secondary_ipaddress`: an extra address on a NIC

use super::{Resource, ResourceContext, found, non_empty, read_back};
use crate::api::VirtualMachine;
use crate::kind::ResourceKind;
use async_trait::async_trait;
use cosmicflow_cloud::{ApplyResult, CloudError, Result, classify};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecondaryIpAddressResource {
    #[serde(default)]
    pub id: String,
    /// Picked by the platform when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Defaults to the first NIC of the machine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nic_id: Option<String>,
    pub virtual_machine_id: String,
}

impl SecondaryIpAddressResource {
    fn nic_id(&self, vm: &VirtualMachine) -> Option<String> {
        non_empty(&self.nic_id).or_else(|| vm.nic.first().map(|n| n.id.clone()))
    }
}

#[async_trait]
impl Resource for SecondaryIpAddressResource {
    const KIND: ResourceKind = ResourceKind::SecondaryIpAddress;

    fn validate(&self) -> Result<()> {
        if self.virtual_machine_id.is_empty() {
            return Err(CloudError::validation("virtual_machine_id must not be empty"));
        }
        Ok(())
    }

    async fn create(mut self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let nic_id = match non_empty(&self.nic_id) {
            Some(id) => id,
            None => {
                let vm_id = self.virtual_machine_id.as_str();
                let vm = match found(ctx.api.get_vm(vm_id).await, vm_id) {
                    Ok(Some(vm)) => vm,
                    Ok(None) => {
                        return ApplyResult::failed(CloudError::ResourceNotFound(format!(
                            "Virtual Machine {} does not exist",
                            vm_id
                        )));
                    }
                    Err(e) => return ApplyResult::failed(e),
                };
                match self.nic_id(&vm) {
                    Some(id) => id,
                    None => {
                        return ApplyResult::failed(CloudError::InvalidConfig(format!(
                            "Virtual Machine {} has no NIC",
                            vm_id
                        )));
                    }
                }
            }
        };

        tracing::info!(nic_id = %nic_id, ip_address = ?self.ip_address, "adding secondary IP address");
        match ctx.api.add_ip_to_nic(&nic_id, self.ip_address.as_deref()).await {
            Ok(ip) => {
                self.id = ip.id;
                self.ip_address = Some(ip.ip_address);
                self.nic_id = Some(nic_id);
                read_back(self, ctx).await
            }
            Err(e) => ApplyResult::failed(CloudError::operation("adding secondary IP address", e)),
        }
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let vm_id = self.virtual_machine_id.clone();
        let vm = match found(ctx.api.get_vm(&vm_id).await, &vm_id) {
            Ok(Some(vm)) => vm,
            Ok(None) => {
                tracing::debug!(vm_id = %vm_id, "instance does no longer exist");
                return ApplyResult::gone();
            }
            Err(e) => return ApplyResult::partial(self, e),
        };

        let nic_id = self.nic_id(&vm).unwrap_or_default();
        let Some(nic) = vm.nic.iter().find(|n| n.id == nic_id) else {
            tracing::debug!(nic_id = %nic_id, "NIC does not exist");
            return ApplyResult::gone();
        };

        match nic.secondary_ips.iter().find(|ip| ip.id == self.id) {
            Some(ip) => ApplyResult::ok(SecondaryIpAddressResource {
                id: ip.id.clone(),
                ip_address: Some(ip.ip_address.clone()),
                nic_id: Some(nic.id.clone()),
                virtual_machine_id: vm.id.clone(),
            }),
            None => {
                tracing::debug!(ip_address = ?self.ip_address, "secondary IP address does no longer exist");
                ApplyResult::gone()
            }
        }
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(id = %self.id, ip_address = ?self.ip_address, "removing secondary IP address");
        let result = ctx.api.remove_ip_from_nic(&self.id).await;
        match classify::ignore_gone(result, &self.id) {
            Ok(()) => ApplyResult::gone(),
            Err(e) => ApplyResult::partial(self, CloudError::operation("removing secondary IP address", e)),
        }
    }
}

/// Import from `<instance id>/<secondary ip address>`
pub async fn import(ctx: &ResourceContext, id: &str) -> Result<SecondaryIpAddressResource> {
    let Some((vm_id, address)) = id.split_once('/').filter(|(_, ip)| !ip.contains('/')) else {
        return Err(CloudError::InvalidConfig(format!(
            "invalid variable import format: {} (expected <INSTANCE ID>/<SECONDARY IP ADDRESS>)",
            id
        )));
    };

    let vm = found(ctx.api.get_vm(vm_id).await, vm_id)?
        .ok_or_else(|| CloudError::ResourceNotFound(format!("Virtual Machine {} does not exist", vm_id)))?;

    vm.nic
        .iter()
        .find_map(|nic| {
            nic.secondary_ips
                .iter()
                .find(|ip| ip.ip_address == address)
                .map(|ip| SecondaryIpAddressResource {
                    id: ip.id.clone(),
                    ip_address: Some(ip.ip_address.clone()),
                    nic_id: Some(nic.id.clone()),
                    virtual_machine_id: vm.id.clone(),
                })
        })
        .ok_or_else(|| CloudError::ResourceNotFound(format!("IP address {} does not exist", address)))
}
