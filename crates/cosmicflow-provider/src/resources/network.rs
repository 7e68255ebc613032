//! `cosmic_network`: a tier inside a VPC

use super::ipaddress::NO_ACL;
use super::{Resource, ResourceContext, found, non_empty, read_back};
use crate::api::{AclTarget, CreateNetwork, LookupKind, UpdateNetwork};
use crate::kind::ResourceKind;
use crate::lookup::{resolve_id, value_or_id};
use async_trait::async_trait;
use cosmicflow_cloud::{ApplyResult, CloudError, Result, classify};
use serde::{Deserialize, Serialize};

fn no_acl() -> String {
    NO_ACL.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkResource {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
    pub cidr: String,
    /// Picked by the platform when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    /// Name or id
    pub network_offering: String,
    pub vpc_id: String,
    #[serde(default = "no_acl")]
    pub acl_id: String,
    /// Defaults to the provider zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

impl Default for NetworkResource {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            display_text: None,
            cidr: String::new(),
            gateway: None,
            network_offering: String::new(),
            vpc_id: String::new(),
            acl_id: no_acl(),
            zone: None,
        }
    }
}

impl NetworkResource {
    fn display_text(&self) -> String {
        non_empty(&self.display_text).unwrap_or_else(|| self.name.clone())
    }
}

#[async_trait]
impl Resource for NetworkResource {
    const KIND: ResourceKind = ResourceKind::Network;

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("name", &self.name),
            ("cidr", &self.cidr),
            ("network_offering", &self.network_offering),
            ("vpc_id", &self.vpc_id),
        ] {
            if value.is_empty() {
                return Err(CloudError::validation(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }

    async fn create(mut self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let api = ctx.api.as_ref();
        let zone = non_empty(&self.zone).unwrap_or_else(|| ctx.config.zone.clone());

        let network_offering_id =
            match resolve_id(api, LookupKind::NetworkOffering, &self.network_offering).await {
                Ok(id) => id,
                Err(e) => return ApplyResult::failed(e),
            };
        let zone_id = match resolve_id(api, LookupKind::Zone, &zone).await {
            Ok(id) => id,
            Err(e) => return ApplyResult::failed(e),
        };

        let params = CreateNetwork {
            name: self.name.clone(),
            display_text: self.display_text(),
            cidr: self.cidr.clone(),
            gateway: non_empty(&self.gateway),
            network_offering_id,
            zone_id,
            vpc_id: self.vpc_id.clone(),
            acl_id: (self.acl_id != NO_ACL).then(|| self.acl_id.clone()),
        };

        tracing::info!(name = %self.name, vpc_id = %self.vpc_id, "creating network");
        match api.create_network(&params).await {
            Ok(id) => {
                self.id = id;
                read_back(self, ctx).await
            }
            Err(e) => ApplyResult::failed(CloudError::operation(
                format!("creating network {}", self.name),
                e,
            )),
        }
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let network = match found(ctx.api.get_network(&self.id).await, &self.id) {
            Ok(Some(network)) => network,
            Ok(None) => {
                tracing::debug!(name = %self.name, "network does no longer exist");
                return ApplyResult::gone();
            }
            Err(e) => return ApplyResult::partial(self, e),
        };

        let configured_zone = self.zone.clone().unwrap_or_default();
        ApplyResult::ok(NetworkResource {
            id: network.id,
            name: network.name,
            display_text: Some(network.display_text),
            cidr: network.cidr,
            gateway: Some(network.gateway),
            network_offering: value_or_id(
                &self.network_offering,
                &network.network_offering_name,
                &network.network_offering_id,
            ),
            vpc_id: network.vpc_id,
            acl_id: if network.acl_id.is_empty() {
                no_acl()
            } else {
                network.acl_id
            },
            zone: Some(value_or_id(&configured_zone, &network.zone_name, &network.zone_id)),
        })
    }

    async fn update(prior: Self, desired: Self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let state = NetworkResource {
            id: prior.id.clone(),
            ..desired
        };

        let rename = state.name != prior.name;
        let relabel = state.display_text() != prior.display_text();
        if rename || relabel {
            let params = UpdateNetwork {
                id: state.id.clone(),
                name: rename.then(|| state.name.clone()),
                display_text: relabel.then(|| state.display_text()),
            };
            tracing::info!(id = %state.id, name = %state.name, "updating network");
            if let Err(e) = ctx.api.update_network(&params).await {
                let err = CloudError::operation(format!("updating network {}", state.name), e);
                return ApplyResult::partial(prior, err);
            }
        }

        if state.acl_id != prior.acl_id {
            tracing::info!(id = %state.id, acl_id = %state.acl_id, "replacing ACL of network");
            let result = ctx
                .api
                .replace_acl_list(&state.acl_id, AclTarget::Network(&state.id))
                .await;
            if let Err(e) = result {
                // The rename went through, so persist it with the old ACL
                let known = NetworkResource {
                    acl_id: prior.acl_id,
                    ..state
                };
                return ApplyResult::partial(known, CloudError::operation("replacing ACL", e));
            }
        }
        read_back(state, ctx).await
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(id = %self.id, name = %self.name, "deleting network");
        let result = ctx.api.delete_network(&self.id).await;
        match classify::ignore_gone(result, &self.id) {
            Ok(()) => ApplyResult::gone(),
            Err(e) => {
                let err = CloudError::operation(format!("deleting network {}", self.name), e);
                ApplyResult::partial(self, err)
            }
        }
    }
}
