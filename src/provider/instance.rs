//! `scaleway_rdb_instance` - a managed database instance
//!
//! Identifier: `region/instance-id`. Unlike databases and users, the instance
//! is fetched by id, so "gone" shows up as HTTP 404 rather than an empty list.

use super::data::{AttrValue, ResourceData};
use super::diag::{self, Diagnostics};
use super::error::{ProviderError, ProviderResult};
use super::id;
use super::meta::Meta;
use crate::scw::http::is_not_found;
use crate::scw::rdb::{
    CreateInstanceRequest, DeleteInstanceRequest, Endpoint, GetInstanceRequest, Instance,
    InstanceSetting, UpdateInstanceRequest,
};
use crate::scw::region::Region;
use std::collections::BTreeMap;
use std::time::Duration;

pub const RESOURCE_TYPE: &str = "scaleway_rdb_instance";

/// Upper bound for one instance operation, enforced by the caller
pub const DEFAULT_INSTANCE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

#[derive(Clone, PartialEq, Eq)]
pub struct InstanceConfig {
    pub name: String,
    pub node_type: String,
    pub engine: String,
    pub is_ha_cluster: bool,
    pub user_name: String,
    pub password: String,
    pub tags: Vec<String>,
    pub settings: Vec<InstanceSetting>,
    pub project_id: Option<String>,
}

impl std::fmt::Debug for InstanceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceConfig")
            .field("name", &self.name)
            .field("node_type", &self.node_type)
            .field("engine", &self.engine)
            .field("is_ha_cluster", &self.is_ha_cluster)
            .field("user_name", &self.user_name)
            .field("tags", &self.tags)
            .field("settings", &self.settings)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl InstanceConfig {
    pub fn from_data(data: &ResourceData, meta: &Meta) -> ProviderResult<Self> {
        let project_id = data
            .optional_str("project_id")?
            .or(meta.default_project_id())
            .map(str::to_string);

        Ok(Self {
            name: data.required_str("name")?.to_string(),
            node_type: data.required_str("node_type")?.to_string(),
            engine: data.required_str("engine")?.to_string(),
            is_ha_cluster: data.optional_bool("is_ha_cluster")?.unwrap_or(false),
            user_name: data.required_str("user_name")?.to_string(),
            password: data.required_str("password")?.to_string(),
            tags: data.string_list("tags")?,
            settings: match data.get("settings") {
                None => Vec::new(),
                Some(value) => expand_instance_settings(value)
                    .ok_or_else(|| ProviderError::wrong_type("settings"))?,
            },
            project_id,
        })
    }
}

/// `{ip, port, name}` map per read replica
pub fn flatten_read_replicas(replicas: &[Endpoint]) -> AttrValue {
    AttrValue::List(
        replicas
            .iter()
            .map(|replica| {
                AttrValue::Map(BTreeMap::from([
                    ("ip".to_string(), replica.ip.clone().unwrap_or_default().into()),
                    ("port".to_string(), AttrValue::Int(i64::from(replica.port))),
                    ("name".to_string(), replica.name.clone().unwrap_or_default().into()),
                ]))
            })
            .collect(),
    )
}

pub fn flatten_instance_settings(settings: &[InstanceSetting]) -> AttrValue {
    settings
        .iter()
        .map(|s| (s.name.clone(), s.value.clone()))
        .collect::<BTreeMap<_, _>>()
        .into()
}

/// Settings map to API settings, `None` if a value is not a string
pub fn expand_instance_settings(value: &AttrValue) -> Option<Vec<InstanceSetting>> {
    value
        .as_map()?
        .iter()
        .map(|(name, value)| {
            Some(InstanceSetting {
                name: name.clone(),
                value: value.as_str()?.to_string(),
            })
        })
        .collect()
}

fn write_instance(data: &mut ResourceData, region: &Region, instance: &Instance) {
    data.set("name", instance.name.as_str());
    data.set("node_type", instance.node_type.as_str());
    data.set("engine", instance.engine.as_str());
    data.set("is_ha_cluster", instance.is_ha_cluster);
    data.set("tags", instance.tags.clone());
    data.set("settings", flatten_instance_settings(&instance.settings));
    data.set("read_replicas", flatten_read_replicas(&instance.read_replicas));
    data.set("status", instance.status.as_str());
    data.set("region", region.to_string());

    match &instance.endpoint {
        Some(endpoint) => {
            data.set("endpoint_ip", endpoint.ip.clone().unwrap_or_default());
            data.set("endpoint_port", i64::from(endpoint.port));
        }
        None => {
            data.remove("endpoint_ip");
            data.remove("endpoint_port");
        }
    }
    if let Some(project_id) = &instance.project_id {
        data.set("project_id", project_id.as_str());
    }
    if let Some(created_at) = instance.created_at {
        data.set("created_at", created_at.to_rfc3339());
    }
}

pub async fn create(data: &mut ResourceData, meta: &Meta) -> Diagnostics {
    if let Err(err) = try_create(data, meta).await {
        return diag::from_error(&err);
    }
    read(data, meta).await
}

async fn try_create(data: &mut ResourceData, meta: &Meta) -> ProviderResult<()> {
    let declared = InstanceConfig::from_data(data, meta)?;
    let region = meta
        .resolver()
        .declared_or_default(data.optional_str("region")?)?;

    tracing::info!(
        "Creating {} instance {} ({}) in {}",
        declared.engine,
        declared.name,
        declared.node_type,
        region
    );

    let instance = meta
        .rdb_api(&region)
        .create_instance(&CreateInstanceRequest {
            region: region.clone(),
            project_id: declared.project_id,
            name: declared.name.clone(),
            engine: declared.engine,
            user_name: declared.user_name,
            password: declared.password,
            node_type: declared.node_type,
            is_ha_cluster: declared.is_ha_cluster,
            tags: declared.tags,
            init_settings: declared.settings,
        })
        .await
        .map_err(ProviderError::backend("create instance", &region, declared.name))?;

    data.set_id(id::encode(&region, &instance.id, None));
    Ok(())
}

pub async fn read(data: &mut ResourceData, meta: &Meta) -> Diagnostics {
    let (region, instance_id) = match id::decode_regional(data.id()) {
        Ok(parts) => parts,
        Err(_) => return diag::from_malformed_identifier(data.id()),
    };
    diag::from_result(try_read(data, meta, region, instance_id).await)
}

async fn try_read(
    data: &mut ResourceData,
    meta: &Meta,
    region: Region,
    instance_id: String,
) -> ProviderResult<()> {
    let region = meta.resolver().check(&region, data.id())?;

    let result = meta
        .rdb_api(&region)
        .get_instance(&GetInstanceRequest {
            region: region.clone(),
            instance_id: instance_id.clone(),
        })
        .await;

    match result {
        Ok(instance) => write_instance(data, &region, &instance),
        Err(err) if is_not_found(&err) => {
            tracing::info!("Instance {} not found in {}, removing from state", instance_id, region);
            data.clear_id();
        }
        Err(err) => {
            return Err(ProviderError::backend("get instance", &region, instance_id)(err));
        }
    }
    Ok(())
}

/// Rename and retag, then refresh
pub async fn update(data: &mut ResourceData, meta: &Meta) -> Diagnostics {
    let (region, instance_id) = match id::decode_regional(data.id()) {
        Ok(parts) => parts,
        Err(_) => return diag::from_malformed_identifier(data.id()),
    };
    if let Err(err) = try_update(data, meta, region, instance_id).await {
        return diag::from_error(&err);
    }
    read(data, meta).await
}

async fn try_update(
    data: &mut ResourceData,
    meta: &Meta,
    region: Region,
    instance_id: String,
) -> ProviderResult<()> {
    let region = meta.resolver().check(&region, data.id())?;
    let name = data.optional_str("name")?.map(str::to_string);
    let tags = match data.get("tags") {
        Some(_) => Some(data.string_list("tags")?),
        None => None,
    };

    tracing::info!("Updating instance {} in {}", instance_id, region);

    meta.rdb_api(&region)
        .update_instance(&UpdateInstanceRequest {
            region: region.clone(),
            instance_id: instance_id.clone(),
            name,
            tags,
        })
        .await
        .map_err(ProviderError::backend("update instance", &region, instance_id))?;
    Ok(())
}

/// Delete the instance; one that is already gone counts as deleted
pub async fn delete(data: &mut ResourceData, meta: &Meta) -> Diagnostics {
    let (region, instance_id) = match id::decode_regional(data.id()) {
        Ok(parts) => parts,
        Err(_) => return diag::from_malformed_identifier(data.id()),
    };
    diag::from_result(try_delete(data, meta, region, instance_id).await)
}

async fn try_delete(
    data: &mut ResourceData,
    meta: &Meta,
    region: Region,
    instance_id: String,
) -> ProviderResult<()> {
    let region = meta.resolver().check(&region, data.id())?;

    tracing::info!("Deleting instance {} in {}", instance_id, region);

    let result = meta
        .rdb_api(&region)
        .delete_instance(&DeleteInstanceRequest {
            region: region.clone(),
            instance_id: instance_id.clone(),
        })
        .await;

    match result {
        Ok(()) => {}
        Err(err) if is_not_found(&err) => {
            tracing::debug!("Instance {} already gone from {}", instance_id, region);
        }
        Err(err) => {
            return Err(ProviderError::backend("delete instance", &region, instance_id)(err));
        }
    }

    data.clear_id();
    Ok(())
}
