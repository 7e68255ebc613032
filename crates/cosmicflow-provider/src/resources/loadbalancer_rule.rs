//! `cosmic_loadbalancer_rule`

use super::{Resource, ResourceContext, found, non_empty, read_back};
use crate::api::{CreateLbRule, UpdateLbRule};
use crate::kind::ResourceKind;
use async_trait::async_trait;
use cosmicflow_cloud::{ApplyResult, CloudError, Result, classify};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadBalancerRuleResource {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub ip_address_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    pub algorithm: String,
    /// Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_timeout: Option<u32>,
    /// Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_timeout: Option<u32>,
    pub private_port: u16,
    pub public_port: u16,
    /// `tcp` or `tcp-proxy`, picked by the platform when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    pub member_ids: Vec<String>,
}

impl LoadBalancerRuleResource {
    fn description(&self) -> String {
        non_empty(&self.description).unwrap_or_else(|| self.name.clone())
    }
}

#[async_trait]
impl Resource for LoadBalancerRuleResource {
    const KIND: ResourceKind = ResourceKind::LoadbalancerRule;

    fn validate(&self) -> Result<()> {
        if let Some(protocol) = &self.protocol {
            if protocol != "tcp" && protocol != "tcp-proxy" {
                return Err(CloudError::validation(format!(
                    "\"protocol\" must be either 'tcp' or 'tcp-proxy', got: \"{}\"",
                    protocol
                )));
            }
        }
        if self.private_port == 0 || self.public_port == 0 {
            return Err(CloudError::validation("ports must be between 1 and 65535"));
        }
        if self.ip_address_id.is_empty() {
            return Err(CloudError::validation("ip_address_id must not be empty"));
        }
        Ok(())
    }

    async fn create(mut self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let params = CreateLbRule {
            name: self.name.clone(),
            description: self.description(),
            algorithm: self.algorithm.clone(),
            public_ip_id: self.ip_address_id.clone(),
            network_id: non_empty(&self.network_id),
            private_port: self.private_port,
            public_port: self.public_port,
            protocol: non_empty(&self.protocol),
            client_timeout: self.client_timeout,
            server_timeout: self.server_timeout,
            // Firewall rules are managed as resources of their own
            open_firewall: false,
        };

        tracing::info!(name = %self.name, ip_address_id = %self.ip_address_id, "creating load balancer rule");
        self.id = match ctx.api.create_lb_rule(&params).await {
            Ok(id) => id,
            Err(e) => {
                return ApplyResult::failed(CloudError::operation(
                    format!("creating load balancer rule {}", self.name),
                    e,
                ));
            }
        };

        // The rule exists from here on; members that failed to attach are
        // retried by the next update
        let result = ctx.api.assign_to_lb_rule(&self.id, &self.member_ids).await;
        if let Err(e) = result {
            let err = CloudError::operation(format!("assigning members to load balancer rule {}", self.name), e);
            let known = LoadBalancerRuleResource {
                member_ids: Vec::new(),
                ..self
            };
            return ApplyResult::partial(known, err);
        }
        read_back(self, ctx).await
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let lb = match found(ctx.api.get_lb_rule(&self.id).await, &self.id) {
            Ok(Some(lb)) => lb,
            Ok(None) => {
                tracing::debug!(name = %self.name, "load balancer rule does no longer exist");
                return ApplyResult::gone();
            }
            Err(e) => return ApplyResult::partial(self, e),
        };

        let mut state = self;
        state.name = lb.name;
        state.description = Some(lb.description);
        state.algorithm = lb.algorithm;
        state.public_port = lb.public_port;
        state.private_port = lb.private_port;
        state.ip_address_id = lb.public_ip_id;
        if !lb.protocol.is_empty() {
            state.protocol = Some(lb.protocol);
        }
        // Only track what was configured to avoid spurious diffs
        if state.network_id.is_some() {
            state.network_id = Some(lb.network_id);
        }
        if state.client_timeout.is_some() {
            state.client_timeout = lb.client_timeout;
        }
        if state.server_timeout.is_some() {
            state.server_timeout = lb.server_timeout;
        }
        ApplyResult::ok(state)
    }

    async fn update(prior: Self, desired: Self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let mut params = UpdateLbRule {
            id: prior.id.clone(),
            ..Default::default()
        };

        if desired.name != prior.name {
            params.name = Some(desired.name.clone());
        }
        if desired.description() != prior.description() {
            params.description = Some(desired.description());
        }
        if desired.algorithm != prior.algorithm {
            tracing::debug!(name = %desired.name, algorithm = %desired.algorithm, "algorithm changed");
            params.algorithm = Some(desired.algorithm.clone());
        }
        if desired.client_timeout != prior.client_timeout {
            params.client_timeout = desired.client_timeout;
        }
        if desired.server_timeout != prior.server_timeout {
            params.server_timeout = desired.server_timeout;
        }

        let changed = params != UpdateLbRule {
            id: prior.id.clone(),
            ..Default::default()
        };
        if changed {
            tracing::info!(id = %prior.id, name = %desired.name, "updating load balancer rule");
            if let Err(e) = ctx.api.update_lb_rule(&params).await {
                let err = CloudError::operation(format!("updating load balancer rule {}", desired.name), e);
                return ApplyResult::partial(prior, err);
            }
        }

        let (added, removed) = member_changes(&prior.member_ids, &desired.member_ids);
        let mut applied = prior.clone();

        if !removed.is_empty() {
            tracing::info!(id = %prior.id, count = removed.len(), "removing load balancer members");
            if let Err(e) = ctx.api.remove_from_lb_rule(&prior.id, &removed).await {
                let err = CloudError::operation(
                    format!("removing members from load balancer rule {}", desired.name),
                    e,
                );
                return ApplyResult::partial(applied, err);
            }
            applied.member_ids.retain(|id| !removed.contains(id));
        }

        if !added.is_empty() {
            tracing::info!(id = %prior.id, count = added.len(), "assigning load balancer members");
            if let Err(e) = ctx.api.assign_to_lb_rule(&prior.id, &added).await {
                let err = CloudError::operation(
                    format!("assigning members to load balancer rule {}", desired.name),
                    e,
                );
                return ApplyResult::partial(applied, err);
            }
        }

        let state = LoadBalancerRuleResource {
            id: prior.id,
            ..desired
        };
        read_back(state, ctx).await
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        tracing::info!(id = %self.id, name = %self.name, "deleting load balancer rule");
        let result = ctx.api.delete_lb_rule(&self.id).await;
        match classify::ignore_gone(result, &self.id) {
            Ok(()) => ApplyResult::gone(),
            Err(e) => {
                let err = CloudError::operation(format!("deleting load balancer rule {}", self.name), e);
                ApplyResult::partial(self, err)
            }
        }
    }
}

/// Members to assign and members to detach, in configured order
fn member_changes(prior: &[String], desired: &[String]) -> (Vec<String>, Vec<String>) {
    let added = desired.iter().filter(|id| !prior.contains(id)).cloned().collect();
    let removed = prior.iter().filter(|id| !desired.contains(id)).cloned().collect();
    (added, removed)
}
