//! `cosmic_network_acl_rule`: the items of one network ACL list

use super::{Resource, ResourceContext, found, read_back};
use crate::api::CosmicApi;
use crate::kind::ResourceKind;
use crate::rules::{AclRule, AclRuleBlock};
use async_trait::async_trait;
use cosmicflow_cloud::{
    ApplyResult, CloudError, Reconciled, Result, Rule, RuleSet, delete_all, observe, reconcile,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkAclRuleResource {
    /// Same as `acl_id` once created
    #[serde(default)]
    pub id: String,
    pub acl_id: String,
    /// Delete items of the ACL that are not configured here
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub rule: Vec<AclRuleBlock>,
}

impl NetworkAclRuleResource {
    fn rules(&self) -> Result<RuleSet<AclRule>> {
        let mut rules = RuleSet::new();
        for block in &self.rule {
            rules.extend(block.expand()?);
        }
        Ok(rules)
    }

    fn finish(mut self, result: Reconciled<AclRule>) -> (Self, Option<CloudError>) {
        self.rule = AclRuleBlock::fold(result.rules);
        (self, result.error.map(CloudError::from))
    }
}

#[async_trait]
impl Resource for NetworkAclRuleResource {
    const KIND: ResourceKind = ResourceKind::NetworkAclRule;

    fn validate(&self) -> Result<()> {
        if self.acl_id.is_empty() {
            return Err(CloudError::validation("acl_id must not be empty"));
        }
        self.rule.iter().try_for_each(AclRuleBlock::validate)
    }

    async fn create(mut self, ctx: &ResourceContext) -> ApplyResult<Self> {
        self.id = self.acl_id.clone();

        let desired = match self.rules() {
            Ok(rules) => rules,
            Err(e) => return ApplyResult::failed(e),
        };
        let result = reconcile_items(ctx, &self.id, &desired, RuleSet::new()).await;
        match self.finish(result) {
            (state, Some(e)) => ApplyResult::partial(state, e),
            (state, None) => read_back(state, ctx).await,
        }
    }

    async fn read(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let id = if self.id.is_empty() {
            self.acl_id.clone()
        } else {
            self.id.clone()
        };

        match found(ctx.api.get_acl_list(&id).await, &id) {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::debug!(acl_id = %id, "network ACL no longer exists");
                return ApplyResult::gone();
            }
            Err(e) => return ApplyResult::partial(self, e),
        }

        let prior = match self.rules() {
            Ok(rules) => rules,
            Err(e) => return ApplyResult::partial(self, e),
        };
        let remote = match ctx.api.list_acl_rules(&id).await {
            Ok(items) => items.into_iter().map(AclRule::from).collect(),
            Err(e) => return ApplyResult::partial(self, e),
        };

        let observed = observe(&prior, remote, self.managed);
        if observed.is_empty() && !self.managed {
            return ApplyResult::gone();
        }

        let mut state = self;
        state.id = id;
        state.rule = AclRuleBlock::fold(observed);
        ApplyResult::ok(state)
    }

    async fn update(prior: Self, desired: Self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let (observed, wanted) = match (prior.rules(), desired.rules()) {
            (Ok(observed), Ok(wanted)) => (observed, wanted),
            (Err(e), _) | (_, Err(e)) => return ApplyResult::partial(prior, e),
        };

        let next = NetworkAclRuleResource {
            id: prior.id.clone(),
            ..desired
        };
        let result = reconcile_items(ctx, &next.id, &wanted, observed).await;
        match next.finish(result) {
            (state, Some(e)) => ApplyResult::partial(state, e),
            (state, None) => read_back(state, ctx).await,
        }
    }

    async fn delete(self, ctx: &ResourceContext) -> ApplyResult<Self> {
        let rules = match self.rules() {
            Ok(rules) => rules,
            Err(e) => return ApplyResult::partial(self, e),
        };

        let api = Arc::clone(&ctx.api);
        let result = delete_all(&ctx.config.batch, rules, move |rule: AclRule| {
            let api = Arc::clone(&api);
            async move { delete_item(api.as_ref(), rule).await }
        })
        .await;

        match self.finish(result) {
            (state, Some(e)) => ApplyResult::partial(state, e),
            (_, None) => ApplyResult::gone(),
        }
    }
}

async fn reconcile_items(
    ctx: &ResourceContext,
    acl_id: &str,
    desired: &RuleSet<AclRule>,
    observed: RuleSet<AclRule>,
) -> Reconciled<AclRule> {
    let create_api = Arc::clone(&ctx.api);
    let delete_api = Arc::clone(&ctx.api);
    let acl_id = acl_id.to_string();

    reconcile(
        &ctx.config.batch,
        desired,
        observed,
        move |rule: AclRule| {
            let api = Arc::clone(&create_api);
            let acl_id = acl_id.clone();
            async move { create_item(api.as_ref(), &acl_id, rule).await }
        },
        move |rule: AclRule| {
            let api = Arc::clone(&delete_api);
            async move { delete_item(api.as_ref(), rule).await }
        },
    )
    .await
}

async fn create_item(api: &dyn CosmicApi, acl_id: &str, rule: AclRule) -> Result<String> {
    tracing::info!(rule = %rule.describe(), acl_id, "creating network ACL rule");
    api.create_acl_rule(&rule.to_create_params(acl_id))
        .await
        .map_err(|e| CloudError::operation(format!("creating network ACL rule {}", rule.describe()), e))
}

async fn delete_item(api: &dyn CosmicApi, rule: AclRule) -> Result<()> {
    tracing::info!(rule = %rule.describe(), id = %rule.uuid, "deleting network ACL rule");
    api.delete_acl_rule(&rule.uuid)
        .await
        .map_err(|e| CloudError::operation(format!("deleting network ACL rule {}", rule.uuid), e))
}
