//! `cosmic_template`: a registered VM template
//!
//! Registration returns before the platform has downloaded the image, so
//! create polls until the template reports ready or `is_ready_timeout`
//! passes.

use super::{Resource, ResourceContext, found, non_empty, read_back};
use crate::api::{LookupKind, RegisterTemplate, UpdateTemplate};
use crate::kind::ResourceKind;
use crate::lookup::{resolve_id, value_or_id};
use async_trait::async_trait;
use cosmicflow_cloud::{ApplyResult, CloudError, PollConfig, PollOutcome, Result, classify, poll_until};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const FORMATS: [&str; 5] = ["OVA", "QCOW2", "RAW", "VHD", "VMDK"];

fn default_ready_timeout() -> u64 {
    300
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateResource {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
    pub format: String,
    pub hypervisor: String,
    /// Name or id
    pub os_type: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_dynamically_scalable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_extractable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_enabled: Option<bool>,
    /// Computed
    #[serde(default)]
    pub is_ready: bool,
    /// Seconds to wait for the template to become ready
    #[serde(default = "default_ready_timeout")]
    pub is_ready_timeout: u64,
    /// Defaults to the provider zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

impl Default for TemplateResource {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            display_text: None,
            format: String::new(),
            hypervisor: String::new(),
            os_type: String::new(),
            url: String::new(),
            is_dynamically_scalable: None,
            is_extractable: None,
            is_featured: None,
            is_public: None,
            password_enabled: None,
            is_ready: false,
            is_ready_timeout: default_ready_timeout(),
            zone: None,
        }
    }
}

impl TemplateResource {
    fn display_text(&self) -> String {
        non_empty(&self.display_text).unwrap_or_else(|| self.name.clone())
    }

    async fn wait_until_ready(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let config = PollConfig {
            timeout: Duration::from_secs(self.is_ready_timeout),
            ..ctx.config.template_poll
        };

        let outcome = poll_until(&config, || {
            let current = self.clone();
            async move {
                match current.read(ctx).await {
                    ApplyResult {
                        state: Some(state),
                        error: None,
                    } => Ok(state.is_ready.then_some(state)),
                    ApplyResult { error: Some(e), .. } => Err(e),
                    ApplyResult { state: None, .. } => Err(CloudError::ResourceNotFound(
                        "template vanished while waiting for it to become ready".into(),
                    )),
                }
            }
        })
        .await;

        match outcome {
            Ok(PollOutcome::Ready(state)) => ApplyResult::ok(state),
            Ok(PollOutcome::TimedOut) => ApplyResult::partial(
                self,
                CloudError::Timeout("Timeout while waiting for template to become ready".into()),
            ),
            Err(e) => ApplyResult::partial(self, e),
        }
    }
}

#[async_trait]
impl Resource for TemplateResource {
    const KIND: ResourceKind = ResourceKind::Template;

    fn validate(&self) -> Result<()> {
        if !FORMATS.contains(&self.format.as_str()) {
            return Err(CloudError::validation(format!(
                "{} is not a valid format. Valid options are 'OVA','QCOW2', 'RAW', 'VHD' and 'VMDK'",
                self.format
            )));
        }
        if self.name.is_empty() || self.url.is_empty() {
            return Err(CloudError::validation("name and url must not be empty"));
        }
        Ok(())
    }

    async fn create(mut self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let api = ctx.api.as_ref();

        let os_type_id = match resolve_id(api, LookupKind::OsType, &self.os_type).await {
            Ok(id) => id,
            Err(e) => return ApplyResult::failed(e),
        };
        let zone = non_empty(&self.zone).unwrap_or_else(|| ctx.config.zone.clone());
        let zone_id = match resolve_id(api, LookupKind::Zone, &zone).await {
            Ok(id) => id,
            Err(e) => return ApplyResult::failed(e),
        };

        let params = RegisterTemplate {
            name: self.name.clone(),
            display_text: self.display_text(),
            format: self.format.clone(),
            hypervisor: self.hypervisor.clone(),
            os_type_id,
            url: self.url.clone(),
            zone_id,
            is_dynamically_scalable: self.is_dynamically_scalable,
            is_extractable: self.is_extractable,
            is_featured: self.is_featured,
            is_public: self.is_public,
            password_enabled: self.password_enabled,
        };

        tracing::info!(name = %self.name, url = %self.url, "registering template");
        self.id = match api.register_template(&params).await {
            Ok(id) => id,
            Err(e) => {
                return ApplyResult::failed(CloudError::operation(
                    format!("creating template {}", self.name),
                    e,
                ));
            }
        };

        self.wait_until_ready(ctx).await
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let template = match found(ctx.api.get_template(&self.id).await, &self.id) {
            Ok(Some(template)) => template,
            Ok(None) => {
                tracing::debug!(name = %self.name, "template no longer exists");
                return ApplyResult::gone();
            }
            Err(e) => return ApplyResult::partial(self, e),
        };

        let configured_zone = self.zone.clone().unwrap_or_default();
        ApplyResult::ok(TemplateResource {
            id: template.id,
            name: template.name,
            display_text: Some(template.display_text),
            format: template.format,
            hypervisor: template.hypervisor,
            os_type: value_or_id(&self.os_type, &template.os_type_name, &template.os_type_id),
            url: self.url,
            is_dynamically_scalable: Some(template.is_dynamically_scalable),
            is_extractable: Some(template.is_extractable),
            is_featured: Some(template.is_featured),
            is_public: Some(template.is_public),
            password_enabled: Some(template.password_enabled),
            is_ready: template.is_ready,
            is_ready_timeout: self.is_ready_timeout,
            zone: Some(value_or_id(&configured_zone, &template.zone_name, &template.zone_id)),
        })
    }

    async fn update(prior: Self, desired: Self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let unchanged = UpdateTemplate {
            id: prior.id.clone(),
            ..Default::default()
        };
        let mut params = unchanged.clone();

        if desired.name != prior.name {
            params.name = Some(desired.name.clone());
        }
        if desired.display_text() != prior.display_text() {
            params.display_text = Some(desired.display_text());
        }
        if desired.format != prior.format {
            params.format = Some(desired.format.clone());
        }
        if desired.is_dynamically_scalable != prior.is_dynamically_scalable {
            params.is_dynamically_scalable = desired.is_dynamically_scalable;
        }
        if desired.password_enabled != prior.password_enabled {
            params.password_enabled = desired.password_enabled;
        }
        if desired.os_type != prior.os_type {
            match resolve_id(ctx.api.as_ref(), LookupKind::OsType, &desired.os_type).await {
                Ok(id) => params.os_type_id = Some(id),
                Err(e) => return ApplyResult::partial(prior, e),
            }
        }

        if params != unchanged {
            tracing::info!(id = %prior.id, name = %desired.name, "updating template");
            if let Err(e) = ctx.api.update_template(&params).await {
                let err = CloudError::operation(format!("updating template {}", desired.name), e);
                return ApplyResult::partial(prior, err);
            }
        }

        let state = TemplateResource {
            id: prior.id,
            is_ready: prior.is_ready,
            ..desired
        };
        read_back(state, ctx).await
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(id = %self.id, name = %self.name, "deleting template");
        let result = ctx.api.delete_template(&self.id).await;
        match classify::ignore_gone(result, &self.id) {
            Ok(()) => ApplyResult::gone(),
            Err(e) => {
                let err = CloudError::operation(format!("deleting template {}", self.name), e);
                ApplyResult::partial(self, err)
            }
        }
    }
}
