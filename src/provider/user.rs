//! `scaleway_rdb_user` - a database user of an instance
//!
//! Identifier: `region/instance-id/user-name`. The password is write-only: it
//! is sent on create and update and never read back.

use super::data::ResourceData;
use super::diag::{self, Diagnostics};
use super::error::{ProviderError, ProviderResult};
use super::id;
use super::lookup::at_most_one;
use super::meta::Meta;
use crate::scw::rdb::{
    CreateUserRequest, DeleteUserRequest, ListUsersRequest, UpdateUserRequest, User,
};
use crate::scw::region::Region;

pub const RESOURCE_TYPE: &str = "scaleway_rdb_user";

#[derive(Clone, PartialEq, Eq)]
pub struct UserConfig {
    pub instance_id: String,
    pub name: String,
    pub password: String,
    pub is_admin: bool,
}

impl std::fmt::Debug for UserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserConfig")
            .field("instance_id", &self.instance_id)
            .field("name", &self.name)
            .field("is_admin", &self.is_admin)
            .finish_non_exhaustive()
    }
}

impl UserConfig {
    pub fn from_data(data: &ResourceData) -> ProviderResult<Self> {
        Ok(Self {
            instance_id: data.required_str("instance_id")?.to_string(),
            name: data.required_str("name")?.to_string(),
            password: data.required_str("password")?.to_string(),
            is_admin: data.optional_bool("is_admin")?.unwrap_or(false),
        })
    }
}

fn write_user(data: &mut ResourceData, region: &Region, instance_id: &str, user: &User) {
    data.set("instance_id", id::encode(region, instance_id, None));
    data.set("region", region.to_string());
    data.set("name", user.name.as_str());
    data.set("is_admin", user.is_admin);
}

pub async fn create(data: &mut ResourceData, meta: &Meta) -> Diagnostics {
    if let Err(err) = try_create(data, meta).await {
        return diag::from_error(&err);
    }
    read(data, meta).await
}

async fn try_create(data: &mut ResourceData, meta: &Meta) -> ProviderResult<()> {
    let declared = UserConfig::from_data(data)?;
    let (region, instance_id) = meta
        .resolver()
        .resolve(data.optional_str("region")?, &declared.instance_id)?;

    tracing::info!(
        "Creating user {} on instance {} in {}",
        declared.name,
        instance_id,
        region
    );

    let user = meta
        .rdb_api(&region)
        .create_user(&CreateUserRequest {
            region: region.clone(),
            instance_id: instance_id.clone(),
            name: declared.name.clone(),
            password: declared.password,
            is_admin: declared.is_admin,
        })
        .await
        .map_err(ProviderError::backend(
            "create user",
            &region,
            format!("{}/{}", instance_id, declared.name),
        ))?;

    data.set_id(id::encode(&region, &instance_id, Some(&user.name)));
    Ok(())
}

pub async fn read(data: &mut ResourceData, meta: &Meta) -> Diagnostics {
    let (region, instance_id, name) = match id::decode_nested(data.id()) {
        Ok(parts) => parts,
        Err(_) => return diag::from_malformed_identifier(data.id()),
    };
    diag::from_result(try_read(data, meta, region, instance_id, name).await)
}

async fn try_read(
    data: &mut ResourceData,
    meta: &Meta,
    region: Region,
    instance_id: String,
    name: String,
) -> ProviderResult<()> {
    let region = meta.resolver().check(&region, data.id())?;
    let target = format!("{}/{}", instance_id, name);

    let response = meta
        .rdb_api(&region)
        .list_users(&ListUsersRequest {
            region: region.clone(),
            instance_id: instance_id.clone(),
            name: Some(name.clone()),
        })
        .await
        .map_err(ProviderError::backend("list users", &region, target.as_str()))?;

    let users: Vec<User> = response
        .users
        .into_iter()
        .filter(|u| u.name == name)
        .collect();

    match at_most_one(users, response.total_count, "list users", &region, &target)? {
        Some(user) => write_user(data, &region, &instance_id, &user),
        None => {
            tracing::info!("User {} not found in {}, removing from state", target, region);
            data.clear_id();
        }
    }
    Ok(())
}

/// Push password and admin flag, then refresh
pub async fn update(data: &mut ResourceData, meta: &Meta) -> Diagnostics {
    let (region, instance_id, name) = match id::decode_nested(data.id()) {
        Ok(parts) => parts,
        Err(_) => return diag::from_malformed_identifier(data.id()),
    };
    if let Err(err) = try_update(data, meta, region, instance_id, name).await {
        return diag::from_error(&err);
    }
    read(data, meta).await
}

async fn try_update(
    data: &mut ResourceData,
    meta: &Meta,
    region: Region,
    instance_id: String,
    name: String,
) -> ProviderResult<()> {
    let region = meta.resolver().check(&region, data.id())?;
    let password = data.optional_str("password")?.map(str::to_string);
    let is_admin = data.optional_bool("is_admin")?;

    tracing::info!("Updating user {} on instance {} in {}", name, instance_id, region);

    meta.rdb_api(&region)
        .update_user(&UpdateUserRequest {
            region: region.clone(),
            instance_id: instance_id.clone(),
            name: name.clone(),
            password,
            is_admin,
        })
        .await
        .map_err(ProviderError::backend(
            "update user",
            &region,
            format!("{}/{}", instance_id, name),
        ))?;
    Ok(())
}

pub async fn delete(data: &mut ResourceData, meta: &Meta) -> Diagnostics {
    let (region, instance_id, name) = match id::decode_nested(data.id()) {
        Ok(parts) => parts,
        Err(_) => return diag::from_malformed_identifier(data.id()),
    };
    diag::from_result(try_delete(data, meta, region, instance_id, name).await)
}

async fn try_delete(
    data: &mut ResourceData,
    meta: &Meta,
    region: Region,
    instance_id: String,
    name: String,
) -> ProviderResult<()> {
    let region = meta.resolver().check(&region, data.id())?;

    tracing::info!("Deleting user {} on instance {} in {}", name, instance_id, region);

    meta.rdb_api(&region)
        .delete_user(&DeleteUserRequest {
            region: region.clone(),
            instance_id: instance_id.clone(),
            name: name.clone(),
        })
        .await
        .map_err(ProviderError::backend(
            "delete user",
            &region,
            format!("{}/{}", instance_id, name),
        ))?;

    data.clear_id();
    Ok(())
}
