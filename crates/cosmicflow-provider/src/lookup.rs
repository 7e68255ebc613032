//! Name to id resolution for attributes accepting either

use crate::api::{CosmicApi, LookupKind};
use cosmicflow_cloud::{ApiError, CloudError, Result};
use regex::Regex;
use std::sync::LazyLock;

static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid uuid regex")
});

/// Whether `value` already is a remote id
pub fn is_id(value: &str) -> bool {
    UUID.is_match(value)
}

fn lookup_error(kind: impl ToString, value: &str, err: ApiError) -> CloudError {
    CloudError::Lookup {
        kind: kind.to_string(),
        value: value.to_string(),
        reason: err.to_string(),
    }
}

/// Resolve `value` to an id unless it already is one
pub async fn resolve_id(api: &dyn CosmicApi, kind: LookupKind, value: &str) -> Result<String> {
    if is_id(value) {
        return Ok(value.to_string());
    }
    tracing::debug!(kind = %kind, value, "retrieving id");
    api.lookup_id(kind, value)
        .await
        .map_err(|e| lookup_error(kind, value, e))
}

/// Resolve an executable template within a zone
pub async fn resolve_template_id(api: &dyn CosmicApi, zone_id: &str, value: &str) -> Result<String> {
    if is_id(value) {
        return Ok(value.to_string());
    }
    tracing::debug!(value, zone_id, "retrieving id of template");
    api.lookup_template_id(value, zone_id)
        .await
        .map_err(|e| lookup_error("template", value, e))
}

/// Value to store for an attribute that accepts a name or an id: keep the
/// form the user configured
pub fn value_or_id(configured: &str, name: &str, id: &str) -> String {
    if is_id(configured) {
        id.to_string()
    } else {
        name.to_string()
    }
}
