//! `cosmic_disk`: a data volume, optionally attached to a virtual machine
//!
//! Attaching and resizing hand back a new volume id.

use super::nic::ATTACH_ATTEMPTS;
use super::{Resource, ResourceContext, found, non_empty, read_back};
use crate::api::{CreateVolume, LookupKind, ResizeVolume};
use crate::kind::ResourceKind;
use crate::lookup::{resolve_id, value_or_id};
use async_trait::async_trait;
use cosmicflow_cloud::{ApplyResult, CloudError, Result, RetryConfig, classify, retry};
use serde::{Deserialize, Serialize};

const GIB: u64 = 1024 * 1024 * 1024;
const DISK_CONTROLLERS: [&str; 3] = ["IDE", "SCSI", "VIRTIO"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiskResource {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Name or id, compared case-insensitively
    pub disk_offering: String,
    #[serde(default)]
    pub attach: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<u64>,
    /// GB, for custom sized offerings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default)]
    pub shrink_ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_controller: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_machine_id: Option<String>,
    /// Defaults to the provider zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

#[async_trait]
impl Resource for DiskResource {
    const KIND: ResourceKind = ResourceKind::Disk;

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(CloudError::validation("name must not be empty"));
        }
        if self.disk_offering.is_empty() {
            return Err(CloudError::validation("disk_offering must not be empty"));
        }
        if let Some(controller) = &self.disk_controller {
            if !DISK_CONTROLLERS.contains(&controller.as_str()) {
                return Err(CloudError::validation(format!(
                    "disk_controller must be either 'IDE', 'SCSI' or 'VIRTIO', got: {:?}",
                    controller
                )));
            }
        }
        if self.attach && non_empty(&self.virtual_machine_id).is_none() {
            return Err(CloudError::validation("virtual_machine_id is required to attach a disk"));
        }
        Ok(())
    }

    async fn create(mut self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let api = ctx.api.as_ref();

        let disk_offering_id = match resolve_id(api, LookupKind::DiskOffering, &self.disk_offering).await {
            Ok(id) => id,
            Err(e) => return ApplyResult::failed(e),
        };
        let zone_name = non_empty(&self.zone).unwrap_or_else(|| ctx.config.zone.clone());
        let zone_id = match resolve_id(api, LookupKind::Zone, &zone_name).await {
            Ok(id) => id,
            Err(e) => return ApplyResult::failed(e),
        };

        let params = CreateVolume {
            name: self.name.clone(),
            disk_offering_id,
            size: self.size,
            disk_controller: non_empty(&self.disk_controller),
            zone_id,
        };
        tracing::info!(name = %self.name, zone = %zone_name, "creating disk");
        self.id = match api.create_volume(&params).await {
            Ok(id) => id,
            Err(e) => {
                let err = CloudError::operation(format!("creating the new disk {}", self.name), e);
                return ApplyResult::failed(err);
            }
        };

        if self.attach {
            if let Err(e) = attach(ctx, &mut self).await {
                return ApplyResult::partial(self, e);
            }
        }
        read_back(self, ctx).await
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let volume = match found(ctx.api.get_volume(&self.id).await, &self.id) {
            Ok(Some(volume)) => volume,
            Ok(None) => {
                tracing::debug!(name = %self.name, "disk does no longer exist");
                return ApplyResult::gone();
            }
            Err(e) => return ApplyResult::partial(self, e),
        };

        let mut state = self;
        state.id = volume.id.clone();
        state.name = volume.name.clone();
        state.attach = volume.is_attached();
        state.size = Some(volume.size / GIB);
        state.disk_offering = value_or_id(
            &state.disk_offering,
            &volume.disk_offering_name,
            &volume.disk_offering_id,
        );
        if !volume.disk_controller.is_empty() {
            state.disk_controller = Some(volume.disk_controller.clone());
        }
        let configured_zone = state.zone.clone().unwrap_or_default();
        state.zone = Some(value_or_id(&configured_zone, &volume.zone_name, &volume.zone_id));

        if volume.is_attached() {
            state.device_id = Some(volume.device_id);
            state.virtual_machine_id = Some(volume.virtual_machine_id);
        }
        ApplyResult::ok(state)
    }

    async fn update(prior: Self, desired: Self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let mut applied = prior.clone();
        if let Err(e) = apply_changes(ctx, &prior, &desired, &mut applied).await {
            return ApplyResult::partial(applied, e);
        }

        let state = DiskResource {
            id: applied.id,
            ..desired
        };
        read_back(state, ctx).await
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        if let Err(e) = detach(ctx, &self).await {
            return ApplyResult::partial(self, e);
        }

        tracing::info!(id = %self.id, name = %self.name, "deleting disk");
        let result = ctx.api.delete_volume(&self.id).await;
        match classify::ignore_gone(result, &self.id) {
            Ok(()) => ApplyResult::gone(),
            Err(e) => {
                let err = CloudError::operation(format!("deleting disk {}", self.name), e);
                ApplyResult::partial(self, err)
            }
        }
    }
}

async fn apply_changes(
    ctx: &ResourceContext,
    prior: &DiskResource,
    desired: &DiskResource,
    applied: &mut DiskResource,
) -> Result<()> {
    let api = ctx.api.as_ref();
    let offering_changed = !desired.disk_offering.eq_ignore_ascii_case(&prior.disk_offering);
    let size_changed = desired.size.is_some() && desired.size != prior.size;

    if offering_changed || size_changed {
        tracing::info!(disk = %desired.name, size = ?desired.size, "resizing disk");
        let disk_offering_id = resolve_id(api, LookupKind::DiskOffering, &desired.disk_offering).await?;
        let params = ResizeVolume {
            id: applied.id.clone(),
            disk_offering_id,
            size: desired.size,
            shrink_ok: desired.shrink_ok,
        };
        applied.id = api
            .resize_volume(&params)
            .await
            .map_err(|e| CloudError::operation(format!("changing disk size for {}", desired.name), e))?;
        applied.disk_offering = desired.disk_offering.clone();
        applied.size = desired.size;
    }

    // A disk moving to another slot or machine is detached first. Unset
    // values are computed and never count as a move.
    let moved_slot = desired.device_id.is_some() && desired.device_id != prior.device_id;
    let moved_machine = non_empty(&desired.virtual_machine_id).is_some()
        && desired.virtual_machine_id != prior.virtual_machine_id;
    if moved_slot || moved_machine {
        detach(ctx, applied).await?;
        applied.attach = false;
    }
    applied.device_id = desired.device_id;
    applied.virtual_machine_id = desired.virtual_machine_id.clone();

    if desired.attach {
        attach(ctx, applied).await?;
    } else {
        detach(ctx, applied).await?;
    }
    applied.attach = desired.attach;
    Ok(())
}

/// Attach unless attached already. Retried, the machine may be busy with
/// another job.
async fn attach(ctx: &ResourceContext, disk: &mut DiskResource) -> Result<()> {
    let api = ctx.api.as_ref();
    let volume = api
        .get_volume(&disk.id)
        .await
        .map_err(|e| CloudError::operation(format!("retrieving disk {}", disk.name), e))?;
    if volume.is_attached() {
        return Ok(());
    }

    let Some(vm_id) = non_empty(&disk.virtual_machine_id) else {
        return Err(CloudError::validation("virtual_machine_id is required to attach a disk"));
    };
    let policy = RetryConfig {
        max_attempts: ATTACH_ATTEMPTS,
        ..ctx.config.retry
    };
    let id = disk.id.as_str();
    let device_id = disk.device_id;

    tracing::info!(disk = %disk.name, vm_id = %vm_id, device_id = ?device_id, "attaching disk");
    let new_id = retry(&policy, "attach volume", || api.attach_volume(id, &vm_id, device_id))
        .await
        .map_err(|e| CloudError::operation(format!("attaching disk {}", disk.name), e))?;
    disk.id = new_id;
    Ok(())
}

/// Detach unless detached or gone. A machine refusing a hot detach is
/// stopped for the duration.
async fn detach(ctx: &ResourceContext, disk: &DiskResource) -> Result<()> {
    let api = ctx.api.as_ref();
    let Some(volume) = found(api.get_volume(&disk.id).await, &disk.id)? else {
        return Ok(());
    };
    if !volume.is_attached() {
        return Ok(());
    }

    tracing::info!(disk = %disk.name, vm_id = %volume.virtual_machine_id, "detaching disk");
    let Err(e) = api.detach_volume(&disk.id).await else {
        return Ok(());
    };
    let vm_id = volume.virtual_machine_id.as_str();
    if vm_id.is_empty() {
        return Err(CloudError::operation(format!("detaching disk {}", disk.name), e));
    }

    tracing::warn!(disk = %disk.name, vm_id, error = %e, "detach failed, stopping virtual machine");
    let failed = |action: &str| {
        let action = format!("{} for disk {}", action, disk.name);
        move |e| CloudError::operation(action, e)
    };
    api.stop_vm(vm_id)
        .await
        .map_err(failed("stopping virtual machine before detaching"))?;
    api.detach_volume(&disk.id)
        .await
        .map_err(failed("detaching"))?;
    api.start_vm(vm_id)
        .await
        .map_err(failed("starting virtual machine after detaching"))
}
