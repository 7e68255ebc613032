//! `cosmic_vpn_customer_gateway`: the remote end of a site-to-site VPN

use super::{Resource, ResourceContext, found, read_back};
use crate::api::{VpnCustomerGateway, VpnCustomerGatewayParams};
use crate::kind::ResourceKind;
use async_trait::async_trait;
use cosmicflow_cloud::{ApplyResult, CloudError, Result, classify};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VpnCustomerGatewayResource {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Treated as a set
    pub cidr_list: Vec<String>,
    pub esp_policy: String,
    pub gateway: String,
    pub ike_policy: String,
    pub ipsec_psk: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpd: Option<bool>,
    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esp_lifetime: Option<u64>,
    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ike_lifetime: Option<u64>,
}

impl VpnCustomerGatewayResource {
    fn params(&self) -> VpnCustomerGatewayParams {
        let mut cidr_list = self.cidr_list.clone();
        cidr_list.sort();
        cidr_list.dedup();

        VpnCustomerGatewayParams {
            name: self.name.clone(),
            cidr_list,
            esp_policy: self.esp_policy.clone(),
            gateway: self.gateway.clone(),
            ike_policy: self.ike_policy.clone(),
            ipsec_psk: self.ipsec_psk.clone(),
            dpd: self.dpd,
            esp_lifetime: self.esp_lifetime,
            ike_lifetime: self.ike_lifetime,
        }
    }

    fn from_remote(gateway: VpnCustomerGateway) -> Self {
        let mut cidr_list: Vec<String> = gateway
            .cidr_list
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        cidr_list.sort();

        VpnCustomerGatewayResource {
            id: gateway.id,
            name: gateway.name,
            cidr_list,
            esp_policy: gateway.esp_policy,
            gateway: gateway.gateway,
            ike_policy: gateway.ike_policy,
            ipsec_psk: gateway.ipsec_psk,
            dpd: Some(gateway.dpd),
            esp_lifetime: Some(gateway.esp_lifetime),
            ike_lifetime: Some(gateway.ike_lifetime),
        }
    }
}

#[async_trait]
impl Resource for VpnCustomerGatewayResource {
    const KIND: ResourceKind = ResourceKind::VpnCustomerGateway;

    fn validate(&self) -> Result<()> {
        let required = [
            ("name", &self.name),
            ("esp_policy", &self.esp_policy),
            ("gateway", &self.gateway),
            ("ike_policy", &self.ike_policy),
            ("ipsec_psk", &self.ipsec_psk),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(CloudError::validation(format!("{} must not be empty", field)));
        }
        if self.cidr_list.is_empty() {
            return Err(CloudError::validation("cidr_list must contain at least one CIDR"));
        }
        Ok(())
    }

    async fn create(mut self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(name = %self.name, gateway = %self.gateway, "creating VPN customer gateway");
        match ctx.api.create_vpn_customer_gateway(&self.params()).await {
            Ok(id) => {
                self.id = id;
                read_back(self, ctx).await
            }
            Err(e) => ApplyResult::failed(CloudError::operation(
                format!("creating VPN Customer Gateway {}", self.name),
                e,
            )),
        }
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        match found(ctx.api.get_vpn_customer_gateway(&self.id).await, &self.id) {
            Ok(Some(gateway)) => ApplyResult::ok(Self::from_remote(gateway)),
            Ok(None) => {
                tracing::debug!(name = %self.name, "VPN customer gateway does no longer exist");
                ApplyResult::gone()
            }
            Err(e) => ApplyResult::partial(self, e),
        }
    }

    async fn update(prior: Self, desired: Self, ctx: &ResourceContext) -> ApplyResult<Self> {
        // Unset optional values keep what the platform computed
        let desired = VpnCustomerGatewayResource {
            dpd: desired.dpd.or(prior.dpd),
            esp_lifetime: desired.esp_lifetime.or(prior.esp_lifetime),
            ike_lifetime: desired.ike_lifetime.or(prior.ike_lifetime),
            ..desired
        };
        if desired.params() == prior.params() {
            return read_back(prior, ctx).await;
        }

        // The platform replaces every attribute on update
        tracing::info!(id = %prior.id, name = %desired.name, "updating VPN customer gateway");
        if let Err(e) = ctx
            .api
            .update_vpn_customer_gateway(&prior.id, &desired.params())
            .await
        {
            let err = CloudError::operation(format!("updating VPN Customer Gateway {}", desired.name), e);
            return ApplyResult::partial(prior, err);
        }

        let state = VpnCustomerGatewayResource {
            id: prior.id,
            ..desired
        };
        read_back(state, ctx).await
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(id = %self.id, name = %self.name, "deleting VPN customer gateway");
        let result = ctx.api.delete_vpn_customer_gateway(&self.id).await;
        match classify::ignore_gone(result, &self.id) {
            Ok(()) => ApplyResult::gone(),
            Err(e) => {
                let err = CloudError::operation(format!("deleting VPN Customer Gateway {}", self.name), e);
                ApplyResult::partial(self, err)
            }
        }
    }
}
