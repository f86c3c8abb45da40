//! `scaleway_rdb_privilege` - permission of one user on one database
//!
//! The persisted identifier is the resolved parent instance
//! (`region/instance-id`); the database and user names live in attributes.
//! A privilege set to `none` is treated as absent.

use super::data::ResourceData;
use super::diag::{self, Diagnostics};
use super::error::{ProviderError, ProviderResult};
use super::id;
use super::lookup::at_most_one;
use super::meta::Meta;
use super::validation::validate_permission;
use crate::scw::rdb::{ListPrivilegesRequest, Permission, Privilege, SetPrivilegeRequest};
use crate::scw::region::Region;

pub const RESOURCE_TYPE: &str = "scaleway_rdb_privilege";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegeConfig {
    pub instance_id: String,
    pub database_name: String,
    pub user_name: String,
    pub permission: Permission,
}

impl PrivilegeConfig {
    pub fn from_data(data: &ResourceData) -> ProviderResult<Self> {
        let value = data
            .get("permission")
            .ok_or_else(|| ProviderError::missing("permission"))?;
        let (_, errors) = validate_permission(value, "permission");
        if let Some(err) = errors.into_iter().next() {
            return Err(err.into());
        }
        let permission = value
            .as_str()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| ProviderError::wrong_type("permission"))?;

        Ok(Self {
            instance_id: data.required_str("instance_id")?.to_string(),
            database_name: data.required_str("database_name")?.to_string(),
            user_name: data.required_str("user_name")?.to_string(),
            permission,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegeState {
    pub region: Region,
    pub instance_id: String,
    pub privilege: Privilege,
}

impl PrivilegeState {
    pub fn write_to(&self, data: &mut ResourceData) {
        let instance = id::encode(&self.region, &self.instance_id, None);
        data.set("instance_id", instance.as_str());
        data.set("region", self.region.to_string());
        data.set("database_name", self.privilege.database_name.as_str());
        data.set("user_name", self.privilege.user_name.as_str());
        data.set("permission", self.privilege.permission.as_str());
        data.set_id(instance);
    }
}

pub async fn create(data: &mut ResourceData, meta: &Meta) -> Diagnostics {
    if let Err(err) = set(data, meta, "create privilege").await {
        return diag::from_error(&err);
    }
    read(data, meta).await
}

/// Re-issue the permission, then refresh
pub async fn update(data: &mut ResourceData, meta: &Meta) -> Diagnostics {
    if let Err(err) = set(data, meta, "update privilege").await {
        return diag::from_error(&err);
    }
    read(data, meta).await
}

async fn set(data: &mut ResourceData, meta: &Meta, operation: &'static str) -> ProviderResult<()> {
    let declared = PrivilegeConfig::from_data(data)?;
    let (region, instance_id) = meta
        .resolver()
        .resolve(data.optional_str("region")?, &declared.instance_id)?;

    tracing::info!(
        "Setting permission {} for {} on {} (instance {} in {})",
        declared.permission,
        declared.user_name,
        declared.database_name,
        instance_id,
        region
    );

    meta.rdb_api(&region)
        .set_privilege(&SetPrivilegeRequest {
            region: region.clone(),
            instance_id: instance_id.clone(),
            database_name: declared.database_name.clone(),
            user_name: declared.user_name.clone(),
            permission: declared.permission,
        })
        .await
        .map_err(ProviderError::backend(
            operation,
            &region,
            format!(
                "{}/{}/{}",
                instance_id, declared.database_name, declared.user_name
            ),
        ))?;

    data.set_id(id::encode(&region, &instance_id, None));
    Ok(())
}

/// Instance reference of an existing privilege: the attribute, else the id
fn instance_reference(data: &ResourceData) -> ProviderResult<Option<String>> {
    if let Some(attribute) = data.optional_str("instance_id")? {
        return Ok(Some(attribute.to_string()));
    }
    if data.id().is_empty() {
        return Ok(None);
    }
    let (region, instance_id) = id::decode_regional(data.id())?;
    Ok(Some(id::encode(&region, &instance_id, None)))
}

pub async fn read(data: &mut ResourceData, meta: &Meta) -> Diagnostics {
    let reference = match instance_reference(data) {
        Ok(Some(reference)) => reference,
        Ok(None) => return diag::from_malformed_identifier(data.id()),
        Err(err) => return diag::from_error(&err),
    };
    diag::from_result(try_read(data, meta, &reference).await)
}

async fn try_read(data: &mut ResourceData, meta: &Meta, reference: &str) -> ProviderResult<()> {
    let (region, instance_id) = meta
        .resolver()
        .resolve(data.optional_str("region")?, reference)?;
    let database_name = data.required_str("database_name")?.to_string();
    let user_name = data.required_str("user_name")?.to_string();
    let target = format!("{}/{}/{}", instance_id, database_name, user_name);

    let response = meta
        .rdb_api(&region)
        .list_privileges(&ListPrivilegesRequest {
            region: region.clone(),
            instance_id: instance_id.clone(),
            database_name: Some(database_name.clone()),
            user_name: Some(user_name.clone()),
        })
        .await
        .map_err(ProviderError::backend("list privileges", &region, target.as_str()))?;

    let privileges: Vec<Privilege> = response
        .privileges
        .into_iter()
        .filter(|p| p.database_name == database_name && p.user_name == user_name)
        .filter(|p| p.permission != Permission::None)
        .collect();

    match at_most_one(privileges, response.total_count, "list privileges", &region, &target)? {
        Some(privilege) => PrivilegeState {
            region,
            instance_id,
            privilege,
        }
        .write_to(data),
        None => {
            tracing::info!("Privilege {} not found in {}, removing from state", target, region);
            data.clear_id();
        }
    }
    Ok(())
}

/// Revoke by setting the permission to `none`
pub async fn delete(data: &mut ResourceData, meta: &Meta) -> Diagnostics {
    let reference = match instance_reference(data) {
        Ok(Some(reference)) => reference,
        Ok(None) => return diag::from_malformed_identifier(data.id()),
        Err(err) => return diag::from_error(&err),
    };
    diag::from_result(try_delete(data, meta, &reference).await)
}

async fn try_delete(data: &mut ResourceData, meta: &Meta, reference: &str) -> ProviderResult<()> {
    let (region, instance_id) = meta
        .resolver()
        .resolve(data.optional_str("region")?, reference)?;
    let database_name = data.required_str("database_name")?.to_string();
    let user_name = data.required_str("user_name")?.to_string();

    tracing::info!(
        "Revoking {} on {} (instance {} in {})",
        user_name,
        database_name,
        instance_id,
        region
    );

    meta.rdb_api(&region)
        .set_privilege(&SetPrivilegeRequest {
            region: region.clone(),
            instance_id: instance_id.clone(),
            database_name: database_name.clone(),
            user_name: user_name.clone(),
            permission: Permission::None,
        })
        .await
        .map_err(ProviderError::backend(
            "delete privilege",
            &region,
            format!("{}/{}/{}", instance_id, database_name, user_name),
        ))?;

    data.clear_id();
    Ok(())
}
