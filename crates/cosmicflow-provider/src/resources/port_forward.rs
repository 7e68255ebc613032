//! `cosmic_port_forward`: the port forwarding rules of one public IP address

use super::{Resource, ResourceContext, found, read_back};
use crate::api::{CosmicApi, CreatePortForward};
use crate::kind::ResourceKind;
use crate::rules::PortForward;
use async_trait::async_trait;
use cosmicflow_cloud::{
    ApplyResult, CloudError, Reconciled, Result, RetryConfig, Rule, RuleSet, delete_all, observe,
    reconcile, retry,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortForwardResource {
    /// Same as `ip_address_id` once created
    #[serde(default)]
    pub id: String,
    pub ip_address_id: String,
    /// Delete rules on the IP address that are not configured here
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub forward: Vec<PortForward>,
}

impl PortForwardResource {
    fn rules(&self) -> RuleSet<PortForward> {
        self.forward.iter().cloned().collect()
    }

    fn with_rules(mut self, rules: RuleSet<PortForward>) -> Self {
        self.forward = rules.into_sorted_vec();
        self
    }

    fn finish(self, result: Reconciled<PortForward>) -> (Self, Option<CloudError>) {
        let state = self.with_rules(result.rules);
        (state, result.error.map(CloudError::from))
    }
}

#[async_trait]
impl Resource for PortForwardResource {
    const KIND: ResourceKind = ResourceKind::PortForward;

    fn validate(&self) -> Result<()> {
        if self.ip_address_id.is_empty() {
            return Err(CloudError::validation("ip_address_id must not be empty"));
        }
        self.forward.iter().try_for_each(PortForward::validate)
    }

    async fn create(mut self, ctx: &ResourceContext) -> ApplyResult<Self> {
        // Set upfront so a partial result can be persisted
        self.id = self.ip_address_id.clone();

        let desired = self.rules();
        let result = reconcile_forwards(ctx, &self.id, &desired, RuleSet::new()).await;
        match self.finish(result) {
            (state, Some(e)) => ApplyResult::partial(state, e),
            (state, None) => read_back(state, ctx).await,
        }
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let id = if self.id.is_empty() {
            self.ip_address_id.clone()
        } else {
            self.id.clone()
        };

        match found(ctx.api.get_public_ip(&id).await, &id) {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::debug!(ip_address_id = %id, "IP address is no longer associated");
                return ApplyResult::gone();
            }
            Err(e) => return ApplyResult::partial(self, e),
        }

        let remote = match ctx.api.list_port_forwards(&id).await {
            Ok(rules) => rules.into_iter().map(PortForward::from).collect(),
            Err(e) => return ApplyResult::partial(self, e),
        };

        let observed = observe(&self.rules(), remote, self.managed);
        if observed.is_empty() && !self.managed {
            return ApplyResult::gone();
        }

        let mut state = self.with_rules(observed);
        state.id = id;
        ApplyResult::ok(state)
    }

    async fn update(prior: Self, desired: Self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let id = prior.id.clone();
        let wanted = desired.rules();
        let result = reconcile_forwards(ctx, &id, &wanted, prior.rules()).await;

        let next = PortForwardResource {
            id,
            forward: Vec::new(),
            ..desired
        };
        match next.finish(result) {
            (state, Some(e)) => ApplyResult::partial(state, e),
            (state, None) => read_back(state, ctx).await,
        }
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let api = Arc::clone(&ctx.api);
        let result = delete_all(&ctx.config.batch, self.rules(), move |rule: PortForward| {
            let api = Arc::clone(&api);
            async move { delete_forward(api.as_ref(), rule).await }
        })
        .await;

        match self.finish(result) {
            (state, Some(e)) => ApplyResult::partial(state, e),
            (_, None) => ApplyResult::gone(),
        }
    }
}

async fn reconcile_forwards(
    ctx: &ResourceContext,
    ip_address_id: &str,
    desired: &RuleSet<PortForward>,
    observed: RuleSet<PortForward>,
) -> Reconciled<PortForward> {
    let create_api = Arc::clone(&ctx.api);
    let delete_api = Arc::clone(&ctx.api);
    let ip_address_id = ip_address_id.to_string();
    let retry_config = ctx.config.retry;

    reconcile(
        &ctx.config.batch,
        desired,
        observed,
        move |rule: PortForward| {
            let api = Arc::clone(&create_api);
            let ip_address_id = ip_address_id.clone();
            async move { create_forward(api.as_ref(), &ip_address_id, &retry_config, rule).await }
        },
        move |rule: PortForward| {
            let api = Arc::clone(&delete_api);
            async move { delete_forward(api.as_ref(), rule).await }
        },
    )
    .await
}

async fn create_forward(
    api: &dyn CosmicApi,
    ip_address_id: &str,
    retry_config: &RetryConfig,
    rule: PortForward,
) -> Result<String> {
    let vm_id = rule.virtual_machine_id.as_str();
    let vm = retry(retry_config, "get virtual machine", || api.get_vm(vm_id))
        .await
        .map_err(|e| CloudError::operation(format!("retrieving virtual machine {}", vm_id), e))?;

    // The IP may not be associated with a network yet, so pass the network
    // of the NIC the rule forwards to
    let network_id = match rule.vm_guest_ip.as_deref().filter(|ip| !ip.is_empty()) {
        Some(ip) => vm.network_for_ip(ip).map(str::to_string),
        None => vm.nic.first().map(|nic| nic.network_id.clone()),
    }
    .ok_or_else(|| {
        CloudError::ResourceNotFound(format!(
            "network interface of virtual machine {} for {}",
            vm_id,
            rule.describe()
        ))
    })?;

    let params = CreatePortForward {
        ip_address_id: ip_address_id.to_string(),
        protocol: rule.protocol.clone(),
        private_port: rule.private_port,
        private_end_port: rule.private_end_port,
        public_port: rule.public_port,
        public_end_port: rule.public_end_port,
        virtual_machine_id: vm.id.clone(),
        vm_guest_ip: rule.vm_guest_ip.clone(),
        network_id: Some(network_id),
        open_firewall: false,
    };

    tracing::info!(rule = %rule.describe(), ip_address_id, "creating port forward");
    api.create_port_forward(&params)
        .await
        .map_err(|e| CloudError::operation(format!("creating port forward {}", rule.describe()), e))
}

async fn delete_forward(api: &dyn CosmicApi, rule: PortForward) -> Result<()> {
    tracing::info!(rule = %rule.describe(), id = %rule.uuid, "deleting port forward");
    api.delete_port_forward(&rule.uuid)
        .await
        .map_err(|e| CloudError::operation(format!("deleting port forward {}", rule.uuid), e))
}

/// Build the state of existing port forwarding rules from a comma separated
/// list of rule ids. All rules must belong to the same IP address.
pub async fn import(ctx: &ResourceContext, ids: &str) -> Result<PortForwardResource> {
    let mut ip_address_id = String::new();
    let mut forward = Vec::new();

    for id in ids.split(',').map(str::trim).filter(|id| !id.is_empty()) {
        let rule = found(ctx.api.get_port_forward(id).await, id)?
            .ok_or_else(|| CloudError::ResourceNotFound(format!("port forwarding rule {}", id)))?;

        if !ip_address_id.is_empty() && rule.ip_address_id != ip_address_id {
            return Err(CloudError::InvalidConfig(format!(
                "port forwarding rule {} is not attached to expected IP address. \
                 Expected: {}, got: {}",
                id, ip_address_id, rule.ip_address_id
            )));
        }
        ip_address_id = rule.ip_address_id.clone();

        let mut rule = PortForward::from(rule);
        rule.vm_guest_ip = None;
        forward.push(rule);
    }

    if forward.is_empty() {
        return Err(CloudError::validation("no port forwarding rule ids given"));
    }

    Ok(PortForwardResource {
        id: ip_address_id.clone(),
        ip_address_id,
        managed: false,
        forward,
    })
}
