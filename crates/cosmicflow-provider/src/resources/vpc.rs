//! `cosmic_vpc`

use super::{Resource, ResourceContext, found, non_empty, read_back};
use crate::api::{CreateVpc, LookupKind, UpdateVpc};
use crate::kind::ResourceKind;
use crate::lookup::{resolve_id, value_or_id};
use async_trait::async_trait;
use cosmicflow_cloud::{ApplyResult, CloudError, Result, classify};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VpcResource {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
    pub cidr: String,
    /// Name or id, compared case-insensitively
    pub vpc_offering: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_nat_list: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syslog_server_list: Option<String>,
    /// Defaults to the provider zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default)]
    pub source_nat_ip: String,
    #[serde(default)]
    pub source_nat_ip_id: String,
}

impl VpcResource {
    fn display_text(&self) -> String {
        non_empty(&self.display_text).unwrap_or_else(|| self.name.clone())
    }
}

/// Keep an optional attribute unset unless it was configured or the
/// platform reports a value for it
fn observed(configured: &Option<String>, remote: String) -> Option<String> {
    (configured.is_some() || !remote.is_empty()).then_some(remote)
}

#[async_trait]
impl Resource for VpcResource {
    const KIND: ResourceKind = ResourceKind::Vpc;

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("name", &self.name),
            ("cidr", &self.cidr),
            ("vpc_offering", &self.vpc_offering),
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

        let vpc_offering_id = match resolve_id(api, LookupKind::VpcOffering, &self.vpc_offering).await {
            Ok(id) => id,
            Err(e) => return ApplyResult::failed(e),
        };
        let zone_id = match resolve_id(api, LookupKind::Zone, &zone).await {
            Ok(id) => id,
            Err(e) => return ApplyResult::failed(e),
        };

        let params = CreateVpc {
            name: self.name.clone(),
            display_text: self.display_text(),
            cidr: self.cidr.clone(),
            vpc_offering_id,
            zone_id,
            network_domain: non_empty(&self.network_domain),
            source_nat_list: non_empty(&self.source_nat_list),
            syslog_server_list: non_empty(&self.syslog_server_list),
        };

        tracing::info!(name = %self.name, cidr = %self.cidr, "creating VPC");
        match api.create_vpc(&params).await {
            Ok(id) => {
                self.id = id;
                read_back(self, ctx).await
            }
            Err(e) => ApplyResult::failed(CloudError::operation(format!("creating VPC {}", self.name), e)),
        }
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let api = ctx.api.as_ref();
        let vpc = match found(api.get_vpc(&self.id).await, &self.id) {
            Ok(Some(vpc)) => vpc,
            Ok(None) => {
                tracing::debug!(name = %self.name, "VPC does no longer exist");
                return ApplyResult::gone();
            }
            Err(e) => return ApplyResult::partial(self, e),
        };

        let offering = match api.get_vpc_offering(&vpc.vpc_offering_id).await {
            Ok(offering) => offering,
            Err(e) => return ApplyResult::partial(self, e),
        };
        let nat_ips = match api.list_source_nat_ips(&self.id).await {
            Ok(ips) => ips,
            Err(e) => return ApplyResult::partial(self, e),
        };

        let configured_zone = self.zone.clone().unwrap_or_default();
        let mut state = VpcResource {
            id: vpc.id,
            name: vpc.name,
            display_text: Some(vpc.display_text),
            cidr: vpc.cidr,
            vpc_offering: value_or_id(&self.vpc_offering, &offering.name, &vpc.vpc_offering_id),
            network_domain: observed(&self.network_domain, vpc.network_domain),
            source_nat_list: observed(&self.source_nat_list, vpc.source_nat_list),
            syslog_server_list: observed(&self.syslog_server_list, vpc.syslog_server_list),
            zone: Some(value_or_id(&configured_zone, &vpc.zone_name, &vpc.zone_id)),
            source_nat_ip: String::new(),
            source_nat_ip_id: String::new(),
        };

        if let [ip] = nat_ips.as_slice() {
            state.source_nat_ip = ip.ip_address.clone();
            state.source_nat_ip_id = ip.id.clone();
        }
        ApplyResult::ok(state)
    }

    async fn update(prior: Self, desired: Self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let mut params = UpdateVpc {
            id: prior.id.clone(),
            ..Default::default()
        };

        if desired.name != prior.name {
            params.name = Some(desired.name.clone());
        }
        if desired.display_text() != prior.display_text() {
            params.display_text = Some(desired.display_text());
        }
        if desired.source_nat_list != prior.source_nat_list {
            params.source_nat_list = Some(desired.source_nat_list.clone().unwrap_or_default());
        }
        if desired.syslog_server_list != prior.syslog_server_list {
            params.syslog_server_list = Some(desired.syslog_server_list.clone().unwrap_or_default());
        }
        if !desired.vpc_offering.eq_ignore_ascii_case(&prior.vpc_offering) {
            match resolve_id(ctx.api.as_ref(), LookupKind::VpcOffering, &desired.vpc_offering).await {
                Ok(id) => params.vpc_offering_id = Some(id),
                Err(e) => return ApplyResult::partial(prior, e),
            }
        }

        tracing::info!(id = %prior.id, name = %desired.name, "updating VPC");
        if let Err(e) = ctx.api.update_vpc(&params).await {
            let err = CloudError::operation(format!("updating VPC {}", desired.name), e);
            return ApplyResult::partial(prior, err);
        }

        let state = VpcResource {
            id: prior.id,
            source_nat_ip: prior.source_nat_ip,
            source_nat_ip_id: prior.source_nat_ip_id,
            ..desired
        };
        read_back(state, ctx).await
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(id = %self.id, name = %self.name, "deleting VPC");
        let result = ctx.api.delete_vpc(&self.id).await;
        match classify::ignore_gone(result, &self.id) {
            Ok(()) => ApplyResult::gone(),
            Err(e) => {
                let err = CloudError::operation(format!("deleting VPC {}", self.name), e);
                ApplyResult::partial(self, err)
            }
        }
    }
}
