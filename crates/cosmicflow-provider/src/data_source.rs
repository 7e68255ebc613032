//! `cosmic_network_acl` data source
//!
//! Looks up exactly one ACL list whose fields match every given filter.

use crate::api::{AclList, CosmicApi};
use cosmicflow_cloud::{CloudError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A regular expression applied to one field of the listed object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,
    pub value: String,
}

impl Filter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// State handed back for the selected ACL list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAclData {
    pub id: String,
    pub name: String,
    pub description: String,
    pub vpc_id: String,
}

impl From<AclList> for NetworkAclData {
    fn from(acl: AclList) -> Self {
        Self {
            id: acl.id,
            name: acl.name,
            description: acl.description,
            vpc_id: acl.vpc_id,
        }
    }
}

fn invalid_field(name: &str) -> CloudError {
    CloudError::InvalidConfig(format!("Invalid field name: {}", name))
}

fn field<'a>(acl: &'a AclList, name: &str) -> Result<&'a str> {
    match name {
        "id" => Ok(&acl.id),
        "name" => Ok(&acl.name),
        "description" => Ok(&acl.description),
        "vpc_id" | "vpcid" => Ok(&acl.vpc_id),
        _ => Err(invalid_field(name)),
    }
}

/// Field names and patterns are checked before anything is listed
fn compile(filters: &[Filter]) -> Result<Vec<(&str, Regex)>> {
    filters
        .iter()
        .map(|f| {
            field(&AclList::default(), &f.name)?;
            let re = Regex::new(&f.value)
                .map_err(|e| CloudError::InvalidConfig(format!("Invalid regex: {}", e)))?;
            Ok((f.name.as_str(), re))
        })
        .collect()
}

fn matches(acl: &AclList, filters: &[(&str, Regex)]) -> Result<bool> {
    for (name, re) in filters {
        if !re.is_match(field(acl, name)?) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Select the single ACL list matching all `filters`
pub async fn lookup_network_acl(api: &dyn CosmicApi, filters: &[Filter]) -> Result<NetworkAclData> {
    let filters = compile(filters)?;
    let lists = api.list_acl_lists().await?;

    let mut matched = Vec::new();
    for acl in lists {
        if matches(&acl, &filters)? {
            matched.push(acl);
        }
    }

    let acl = match matched.len() {
        0 => {
            return Err(CloudError::ResourceNotFound(
                "No Network ACL List matched with the specified filter".into(),
            ));
        }
        1 => matched.remove(0),
        _ => {
            return Err(CloudError::InvalidConfig(
                "More than one Network ACL List found, use a more specific filter".into(),
            ));
        }
    };

    tracing::debug!(id = %acl.id, name = %acl.name, "selected network ACL list");
    Ok(acl.into())
}
