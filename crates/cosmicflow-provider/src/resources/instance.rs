//! `cosmic_instance`: a virtual machine

use super::{Resource, ResourceContext, found, non_empty, read_back};
use crate::api::{DeployVm, LookupKind, UpdateVm};
use crate::kind::ResourceKind;
use crate::lookup::{resolve_id, resolve_template_id, value_or_id};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cosmicflow_cloud::{ApplyResult, CloudError, Result, classify};
use serde::{Deserialize, Serialize};

/// Encoded user data limit of a deploy sent as POST
const MAX_USER_DATA: usize = 32768;
/// Encoded user data limit of a deploy sent as GET
const MAX_USER_DATA_GET: usize = 2048;

const ADVANCED_ZONE: &str = "Advanced";

/// Base64 encode user data, enforcing the size limit of the request method
pub fn encode_user_data(user_data: &str, http_get_only: bool) -> Result<String> {
    let encoded = STANDARD.encode(user_data.as_bytes());
    let max = if http_get_only {
        MAX_USER_DATA_GET
    } else {
        MAX_USER_DATA
    };

    if encoded.len() > max {
        return Err(CloudError::validation(format!(
            "The supplied user_data contains {} bytes after encoding, \
             this exceeds the limit of {} bytes",
            encoded.len(),
            max
        )));
    }
    Ok(encoded)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceResource {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Name or id, compared case-insensitively
    pub service_offering: String,
    /// Required in an Advanced zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Name or id
    pub template: String,
    /// In GB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_disk_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypair: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    /// Destroy without the recovery window
    #[serde(default)]
    pub expunge: bool,
    /// Defaults to the provider zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

impl InstanceResource {
    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Changes that can only be applied to a stopped machine
    fn needs_restart(&self, prior: &InstanceResource) -> bool {
        self.name != prior.name
            || !self.service_offering.eq_ignore_ascii_case(&prior.service_offering)
            || self.keypair != prior.keypair
            || self.user_data != prior.user_data
    }
}

#[async_trait]
impl Resource for InstanceResource {
    const KIND: ResourceKind = ResourceKind::Instance;

    fn validate(&self) -> Result<()> {
        if self.service_offering.is_empty() {
            return Err(CloudError::validation("service_offering must not be empty"));
        }
        if self.template.is_empty() {
            return Err(CloudError::validation("template must not be empty"));
        }
        Ok(())
    }

    async fn create(mut self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let api = ctx.api.as_ref();

        let user_data = match non_empty(&self.user_data)
            .map(|ud| encode_user_data(&ud, ctx.config.http_get_only))
            .transpose()
        {
            Ok(ud) => ud,
            Err(e) => return ApplyResult::failed(e),
        };

        let service_offering_id =
            match resolve_id(api, LookupKind::ServiceOffering, &self.service_offering).await {
                Ok(id) => id,
                Err(e) => return ApplyResult::failed(e),
            };
        let zone_name = non_empty(&self.zone).unwrap_or_else(|| ctx.config.zone.clone());
        let zone_id = match resolve_id(api, LookupKind::Zone, &zone_name).await {
            Ok(id) => id,
            Err(e) => return ApplyResult::failed(e),
        };
        let zone = match api.get_zone(&zone_id).await {
            Ok(zone) => zone,
            Err(e) => {
                return ApplyResult::failed(CloudError::operation(format!("retrieving zone {}", zone_id), e));
            }
        };
        let template_id = match resolve_template_id(api, &zone.id, &self.template).await {
            Ok(id) => id,
            Err(e) => return ApplyResult::failed(e),
        };

        let mut network_ids = Vec::new();
        if zone.network_type == ADVANCED_ZONE {
            match non_empty(&self.network_id) {
                Some(id) => network_ids.push(id),
                None => {
                    return ApplyResult::failed(CloudError::InvalidConfig(format!(
                        "network_id is required in zone {}",
                        zone.name
                    )));
                }
            }
        }

        let name = non_empty(&self.name);
        let params = DeployVm {
            service_offering_id,
            template_id,
            zone_id: zone.id.clone(),
            display_name: non_empty(&self.display_name).or_else(|| name.clone()),
            name,
            network_ids,
            ip_address: non_empty(&self.ip_address),
            root_disk_size: self.root_disk_size,
            group: non_empty(&self.group),
            keypair: non_empty(&self.keypair),
            user_data,
        };

        tracing::info!(name = ?params.name, zone = %zone.name, "deploying instance");
        match api.deploy_vm(&params).await {
            Ok(vm) => {
                self.id = vm.id;
                read_back(self, ctx).await
            }
            Err(e) => ApplyResult::failed(CloudError::operation(
                format!("creating the new instance {}", self.label()),
                e,
            )),
        }
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let vm = match found(ctx.api.get_vm(&self.id).await, &self.id) {
            Ok(Some(vm)) => vm,
            Ok(None) => {
                tracing::debug!(instance = %self.label(), "instance does no longer exist");
                return ApplyResult::gone();
            }
            Err(e) => return ApplyResult::partial(self, e),
        };

        let mut state = self;
        state.name = Some(vm.name.clone());
        state.display_name = Some(vm.display_name.clone());
        state.group = Some(vm.group.clone());

        // A machine whose destroy failed halfway may have lost its NICs
        if let Some(nic) = vm.nic.first() {
            state.network_id = Some(nic.network_id.clone());
            state.ip_address = Some(nic.ip_address.clone());
        }

        state.service_offering = value_or_id(
            &state.service_offering,
            &vm.service_offering_name,
            &vm.service_offering_id,
        );
        state.template = value_or_id(&state.template, &vm.template_name, &vm.template_id);
        let configured_zone = state.zone.clone().unwrap_or_default();
        state.zone = Some(value_or_id(&configured_zone, &vm.zone_name, &vm.zone_id));
        ApplyResult::ok(state)
    }

    async fn update(prior: Self, desired: Self, ctx: &ResourceContext) -> ApplyResult<Self> {
        // Changes applied so far are persisted when a later step fails
        let mut applied = prior.clone();
        if let Err(e) = apply_changes(ctx, &prior, &desired, &mut applied).await {
            return ApplyResult::partial(applied, e);
        }

        let state = InstanceResource {
            id: prior.id,
            ..desired
        };
        read_back(state, ctx).await
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(instance = %self.label(), expunge = self.expunge, "destroying instance");
        let result = ctx.api.destroy_vm(&self.id, self.expunge).await;
        match classify::ignore_gone(result, &self.id) {
            Ok(()) => ApplyResult::gone(),
            Err(e) => {
                let err = CloudError::operation("destroying instance", e);
                ApplyResult::partial(self, err)
            }
        }
    }
}

async fn apply_changes(
    ctx: &ResourceContext,
    prior: &InstanceResource,
    desired: &InstanceResource,
    applied: &mut InstanceResource,
) -> Result<()> {
    let api = ctx.api.as_ref();
    let id = prior.id.as_str();
    let name = desired.label();
    let failed = |action: &str| {
        let action = format!("{} for instance {}", action, name);
        move |e| CloudError::operation(action, e)
    };
    let update = |params: UpdateVm| async move { api.update_vm(&params).await };

    if desired.display_name != prior.display_name {
        tracing::debug!(instance = %name, "display name changed, starting update");
        update(UpdateVm {
            id: id.to_string(),
            display_name: Some(desired.display_name.clone().unwrap_or_default()),
            ..Default::default()
        })
        .await
        .map_err(failed("updating the display name"))?;
        applied.display_name = desired.display_name.clone();
    }

    if desired.group != prior.group {
        tracing::debug!(instance = %name, "group changed, starting update");
        update(UpdateVm {
            id: id.to_string(),
            group: Some(desired.group.clone().unwrap_or_default()),
            ..Default::default()
        })
        .await
        .map_err(failed("updating the group"))?;
        applied.group = desired.group.clone();
    }

    if !desired.needs_restart(prior) {
        return Ok(());
    }

    // Encoded before stopping, an oversized value must not take the machine down
    let user_data = match desired.user_data.as_deref() {
        Some(ud) if desired.user_data != prior.user_data => {
            Some(encode_user_data(ud, ctx.config.http_get_only)?)
        }
        _ => None,
    };

    tracing::info!(instance = %name, "stopping instance to apply changes");
    api.stop_vm(id)
        .await
        .map_err(failed("stopping before making changes"))?;

    if desired.name != prior.name {
        tracing::debug!(instance = %name, "name changed, starting update");
        update(UpdateVm {
            id: id.to_string(),
            name: desired.name.clone(),
            ..Default::default()
        })
        .await
        .map_err(failed("updating the name"))?;
        applied.name = desired.name.clone();
    }

    if !desired.service_offering.eq_ignore_ascii_case(&prior.service_offering) {
        tracing::debug!(instance = %name, "service offering changed, starting update");
        let offering_id = resolve_id(api, LookupKind::ServiceOffering, &desired.service_offering).await?;
        api.change_service_offering(id, &offering_id)
            .await
            .map_err(failed("changing the service offering"))?;
        applied.service_offering = desired.service_offering.clone();
    }

    if desired.keypair != prior.keypair {
        tracing::debug!(instance = %name, "SSH keypair changed, starting update");
        let keypair = desired.keypair.clone().unwrap_or_default();
        api.reset_ssh_key(id, &keypair)
            .await
            .map_err(failed("changing the SSH keypair"))?;
        applied.keypair = desired.keypair.clone();
    }

    if desired.user_data != prior.user_data {
        tracing::debug!(instance = %name, "user_data changed, starting update");
        update(UpdateVm {
            id: id.to_string(),
            user_data: Some(user_data.unwrap_or_default()),
            ..Default::default()
        })
        .await
        .map_err(failed("updating user_data"))?;
        applied.user_data = desired.user_data.clone();
    }

    tracing::info!(instance = %name, "starting instance after making changes");
    api.start_vm(id)
        .await
        .map_err(failed("starting after making changes"))
}
