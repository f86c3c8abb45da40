//! `scaleway_rdb_database` - a logical database inside an instance
//!
//! Identifier: `region/instance-id/database-name`.

use super::data::ResourceData;
use super::diag::{self, Diagnostics};
use super::error::{ProviderError, ProviderResult};
use super::id;
use super::lookup::at_most_one;
use super::meta::Meta;
use crate::scw::rdb::{
    CreateDatabaseRequest, Database, DeleteDatabaseRequest, ListDatabasesRequest,
};
use crate::scw::region::Region;

pub const RESOURCE_TYPE: &str = "scaleway_rdb_database";

/// Attributes the user declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Parent instance, with or without region prefix
    pub instance_id: String,
    pub name: String,
}

impl DatabaseConfig {
    pub fn from_data(data: &ResourceData) -> ProviderResult<Self> {
        Ok(Self {
            instance_id: data.required_str("instance_id")?.to_string(),
            name: data.required_str("name")?.to_string(),
        })
    }
}

/// Attributes refreshed from the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseState {
    pub region: Region,
    pub instance_id: String,
    pub database: Database,
}

impl DatabaseState {
    pub fn write_to(&self, data: &mut ResourceData) {
        data.set("instance_id", id::encode(&self.region, &self.instance_id, None));
        data.set("region", self.region.to_string());
        data.set("name", self.database.name.as_str());
        data.set("owner", self.database.owner.as_str());
        data.set("managed", self.database.managed);
        data.set("size", self.database.size.to_string());
    }
}

/// Create the database, then refresh it
pub async fn create(data: &mut ResourceData, meta: &Meta) -> Diagnostics {
    if let Err(err) = try_create(data, meta).await {
        return diag::from_error(&err);
    }
    read(data, meta).await
}

async fn try_create(data: &mut ResourceData, meta: &Meta) -> ProviderResult<()> {
    let declared = DatabaseConfig::from_data(data)?;
    let (region, instance_id) = meta
        .resolver()
        .resolve(data.optional_str("region")?, &declared.instance_id)?;

    tracing::info!(
        "Creating database {} on instance {} in {}",
        declared.name,
        instance_id,
        region
    );

    let api = meta.rdb_api(&region);
    let database = api
        .create_database(&CreateDatabaseRequest {
            region: region.clone(),
            instance_id: instance_id.clone(),
            name: declared.name.clone(),
        })
        .await
        .map_err(ProviderError::backend(
            "create database",
            &region,
            format!("{}/{}", instance_id, declared.name),
        ))?;

    data.set_id(id::encode(&region, &instance_id, Some(&database.name)));
    Ok(())
}

/// Refresh the database, or drop it from state when it no longer exists
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

    let api = meta.rdb_api(&region);
    let response = api
        .list_databases(&ListDatabasesRequest {
            region: region.clone(),
            instance_id: instance_id.clone(),
            name: Some(name.clone()),
            ..Default::default()
        })
        .await
        .map_err(ProviderError::backend("list databases", &region, target.as_str()))?;

    let databases: Vec<Database> = response
        .databases
        .into_iter()
        .filter(|d| d.name == name)
        .collect();

    match at_most_one(databases, response.total_count, "list databases", &region, &target)? {
        Some(database) => {
            DatabaseState {
                region,
                instance_id,
                database,
            }
            .write_to(data);
        }
        None => {
            tracing::info!("Database {} not found in {}, removing from state", target, region);
            data.clear_id();
        }
    }
    Ok(())
}

/// Drop the database
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

    tracing::info!("Deleting database {} on instance {} in {}", name, instance_id, region);

    let api = meta.rdb_api(&region);
    api.delete_database(&DeleteDatabaseRequest {
        region: region.clone(),
        instance_id: instance_id.clone(),
        name: name.clone(),
    })
    .await
    .map_err(ProviderError::backend(
        "delete database",
        &region,
        format!("{}/{}", instance_id, name),
    ))?;

    data.clear_id();
    Ok(())
}
