//! `cosmic_ipaddress`: a public IP associated with a network or a VPC

use super::{Resource, ResourceContext, found, non_empty, read_back};
use crate::api::{AclTarget, AssociateIpAddress};
use crate::kind::ResourceKind;
use async_trait::async_trait;
use cosmicflow_cloud::{ApplyResult, CloudError, Result, classify};
use serde::{Deserialize, Serialize};

/// `acl_id` value meaning "no ACL"
pub const NO_ACL: &str = "none";

fn no_acl() -> String {
    NO_ACL.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IpAddressResource {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,
    #[serde(default = "no_acl")]
    pub acl_id: String,
    /// Computed
    #[serde(default)]
    pub ip_address: String,
}

impl Default for IpAddressResource {
    fn default() -> Self {
        Self {
            id: String::new(),
            network_id: None,
            vpc_id: None,
            acl_id: no_acl(),
            ip_address: String::new(),
        }
    }
}

impl IpAddressResource {
    async fn replace_acl(&self, ctx: &ResourceContext) -> Result<()> {
        tracing::info!(id = %self.id, acl_id = %self.acl_id, "replacing ACL of IP address");
        ctx.api
            .replace_acl_list(&self.acl_id, AclTarget::PublicIp(&self.id))
            .await
            .map_err(|e| CloudError::operation("replacing ACL", e))
    }
}

#[async_trait]
impl Resource for IpAddressResource {
    const KIND: ResourceKind = ResourceKind::IpAddress;

    fn validate(&self) -> Result<()> {
        let network = non_empty(&self.network_id).is_some();
        let vpc = non_empty(&self.vpc_id).is_some();
        if network == vpc {
            return Err(CloudError::validation(
                "You must supply a value for either (so not both) the 'network_id' or 'vpc_id' parameter",
            ));
        }
        Ok(())
    }

    async fn create(mut self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let params = AssociateIpAddress {
            network_id: non_empty(&self.network_id),
            vpc_id: non_empty(&self.vpc_id),
        };

        tracing::info!(network_id = ?params.network_id, vpc_id = ?params.vpc_id, "associating IP address");
        self.id = match ctx.api.associate_ip_address(&params).await {
            Ok(id) => id,
            Err(e) => {
                return ApplyResult::failed(CloudError::operation("associating a new IP address", e));
            }
        };

        // ACLs only apply to IP addresses of a VPC
        if params.vpc_id.is_some() && self.acl_id != NO_ACL {
            let result = self.replace_acl(ctx).await;
            if let Err(e) = result {
                return ApplyResult::partial(self, e);
            }
        }
        read_back(self, ctx).await
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let ip = match found(ctx.api.get_public_ip(&self.id).await, &self.id) {
            Ok(Some(ip)) => ip,
            Ok(None) => {
                tracing::debug!(id = %self.id, "IP address is no longer associated");
                return ApplyResult::gone();
            }
            Err(e) => return ApplyResult::partial(self, e),
        };

        let mut state = self;
        state.ip_address = ip.ip_address;
        if state.network_id.is_some() {
            state.network_id = Some(ip.associated_network_id);
        }
        if state.vpc_id.is_some() {
            state.vpc_id = Some(ip.vpc_id);
        }
        state.acl_id = if ip.acl_id.is_empty() { no_acl() } else { ip.acl_id };
        ApplyResult::ok(state)
    }

    async fn update(prior: Self, desired: Self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let state = IpAddressResource {
            id: prior.id.clone(),
            ip_address: prior.ip_address.clone(),
            ..desired
        };

        if state.acl_id != prior.acl_id {
            if let Err(e) = state.replace_acl(ctx).await {
                return ApplyResult::partial(prior, e);
            }
        }
        read_back(state, ctx).await
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(id = %self.id, "disassociating IP address");
        let result = ctx.api.disassociate_ip_address(&self.id).await;
        match classify::ignore_gone(result, &self.id) {
            Ok(()) => ApplyResult::gone(),
            Err(e) => {
                let err = CloudError::operation(format!("disassociating IP address {}", self.id), e);
                ApplyResult::partial(self, err)
            }
        }
    }
}

/// State of an existing IP address, attached to its VPC when it has one
pub async fn import(ctx: &ResourceContext, id: &str) -> Result<IpAddressResource> {
    let ip = found(ctx.api.get_public_ip(id).await, id)?
        .ok_or_else(|| CloudError::ResourceNotFound(format!("IP address {}", id)))?;

    let state = IpAddressResource {
        id: ip.id,
        network_id: ip.vpc_id.is_empty().then_some(ip.associated_network_id),
        vpc_id: non_empty(&Some(ip.vpc_id)),
        acl_id: if ip.acl_id.is_empty() { no_acl() } else { ip.acl_id },
        ip_address: ip.ip_address,
    };
    Ok(state)
}
