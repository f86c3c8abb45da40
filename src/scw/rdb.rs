//! Managed Database (RDB) API
//!
//! Typed requests and responses for the regional RDB endpoints, the [`RdbApi`]
//! capability every resource handler talks to, and [`RdbHttpApi`], the
//! implementation backed by the real REST API.
//!
//! Every request carries the region it targets. A client handle is bound to one
//! region for its whole life and refuses requests for another one, so a wrong
//! region fails loudly instead of touching resources elsewhere.

use super::client::{with_query, ScwClient};
use super::region::Region;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Models
// =============================================================================

/// Access level of a user on a database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Readonly,
    Readwrite,
    All,
    Custom,
    #[default]
    None,
}

impl Permission {
    pub const VALUES: [Permission; 5] = [
        Permission::Readonly,
        Permission::Readwrite,
        Permission::All,
        Permission::Custom,
        Permission::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Readonly => "readonly",
            Permission::Readwrite => "readwrite",
            Permission::All => "all",
            Permission::Custom => "custom",
            Permission::None => "none",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::VALUES
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission '{0}'")]
pub struct UnknownPermission(pub String);

/// Network endpoint of an instance or one of its read replicas
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub port: u32,
    #[serde(default)]
    pub name: Option<String>,
}

/// Engine setting (`max_connections`, `work_mem`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSetting {
    pub name: String,
    pub value: String,
}

/// Managed database instance
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub engine: String,
    #[serde(default)]
    pub node_type: String,
    #[serde(default)]
    pub is_ha_cluster: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub endpoint: Option<Endpoint>,
    #[serde(default)]
    pub read_replicas: Vec<Endpoint>,
    #[serde(default)]
    pub settings: Vec<InstanceSetting>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Logical database inside an instance
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub size: u64,
}

/// Database user
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Permission of one user on one database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Privilege {
    pub permission: Permission,
    pub database_name: String,
    pub user_name: String,
}

// =============================================================================
// Requests and responses
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateInstanceRequest {
    #[serde(skip)]
    pub region: Region,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub name: String,
    pub engine: String,
    pub user_name: String,
    pub password: String,
    pub node_type: String,
    pub is_ha_cluster: bool,
    pub tags: Vec<String>,
    pub init_settings: Vec<InstanceSetting>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetInstanceRequest {
    pub region: Region,
    pub instance_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateInstanceRequest {
    #[serde(skip)]
    pub region: Region,
    #[serde(skip)]
    pub instance_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteInstanceRequest {
    pub region: Region,
    pub instance_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateDatabaseRequest {
    #[serde(skip)]
    pub region: Region,
    #[serde(skip)]
    pub instance_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListDatabasesRequest {
    pub region: Region,
    pub instance_id: String,
    pub name: Option<String>,
    pub managed: Option<bool>,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ListDatabasesResponse {
    #[serde(default)]
    pub databases: Vec<Database>,
    #[serde(default)]
    pub total_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteDatabaseRequest {
    pub region: Region,
    pub instance_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateUserRequest {
    #[serde(skip)]
    pub region: Region,
    #[serde(skip)]
    pub instance_id: String,
    pub name: String,
    pub password: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListUsersRequest {
    pub region: Region,
    pub instance_id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ListUsersResponse {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub total_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateUserRequest {
    #[serde(skip)]
    pub region: Region,
    #[serde(skip)]
    pub instance_id: String,
    #[serde(skip)]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteUserRequest {
    pub region: Region,
    pub instance_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetPrivilegeRequest {
    #[serde(skip)]
    pub region: Region,
    #[serde(skip)]
    pub instance_id: String,
    pub database_name: String,
    pub user_name: String,
    pub permission: Permission,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListPrivilegesRequest {
    pub region: Region,
    pub instance_id: String,
    pub database_name: Option<String>,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ListPrivilegesResponse {
    #[serde(default)]
    pub privileges: Vec<Privilege>,
    #[serde(default)]
    pub total_count: u32,
}

// =============================================================================
// Capability
// =============================================================================

/// Operations the resource handlers need from the RDB backend
///
/// Implemented by [`RdbHttpApi`] for the real service and by
/// [`InMemoryRdbApi`](super::memory::InMemoryRdbApi) for tests.
#[async_trait]
pub trait RdbApi: Send + Sync {
    async fn create_instance(&self, req: &CreateInstanceRequest) -> Result<Instance>;
    async fn get_instance(&self, req: &GetInstanceRequest) -> Result<Instance>;
    async fn update_instance(&self, req: &UpdateInstanceRequest) -> Result<Instance>;
    async fn delete_instance(&self, req: &DeleteInstanceRequest) -> Result<()>;

    async fn create_database(&self, req: &CreateDatabaseRequest) -> Result<Database>;
    async fn list_databases(&self, req: &ListDatabasesRequest) -> Result<ListDatabasesResponse>;
    async fn delete_database(&self, req: &DeleteDatabaseRequest) -> Result<()>;

    async fn create_user(&self, req: &CreateUserRequest) -> Result<User>;
    async fn list_users(&self, req: &ListUsersRequest) -> Result<ListUsersResponse>;
    async fn update_user(&self, req: &UpdateUserRequest) -> Result<User>;
    async fn delete_user(&self, req: &DeleteUserRequest) -> Result<()>;

    async fn set_privilege(&self, req: &SetPrivilegeRequest) -> Result<Privilege>;
    async fn list_privileges(&self, req: &ListPrivilegesRequest)
        -> Result<ListPrivilegesResponse>;
}

// =============================================================================
// REST implementation
// =============================================================================

/// RDB API client bound to a single region
#[derive(Debug, Clone)]
pub struct RdbHttpApi {
    client: ScwClient,
    region: Region,
}

impl RdbHttpApi {
    pub fn new(client: ScwClient, region: Region) -> Self {
        Self { client, region }
    }

    fn check_region(&self, region: &Region) -> Result<()> {
        if *region != self.region {
            return Err(anyhow::anyhow!(
                "request for region {} sent through a client bound to {}",
                region,
                self.region
            ));
        }
        Ok(())
    }

    fn instance_url(&self, instance_id: &str, resource: &str) -> String {
        self.client
            .rdb_instance_url(&self.region, instance_id, resource)
    }
}

fn body_of<T: Serialize>(req: &T) -> Result<Value> {
    serde_json::to_value(req).context("Failed to encode request body")
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value).with_context(|| format!("Failed to decode {}", what))
}

#[async_trait]
impl RdbApi for RdbHttpApi {
    async fn create_instance(&self, req: &CreateInstanceRequest) -> Result<Instance> {
        self.check_region(&req.region)?;
        let url = self.client.rdb_url(&self.region, "instances");
        let response = self.client.post(&url, Some(&body_of(req)?)).await?;
        decode(response, "instance")
    }

    async fn get_instance(&self, req: &GetInstanceRequest) -> Result<Instance> {
        self.check_region(&req.region)?;
        let response = self.client.get(&self.instance_url(&req.instance_id, "")).await?;
        decode(response, "instance")
    }

    async fn update_instance(&self, req: &UpdateInstanceRequest) -> Result<Instance> {
        self.check_region(&req.region)?;
        let url = self.instance_url(&req.instance_id, "");
        let response = self.client.patch(&url, Some(&body_of(req)?)).await?;
        decode(response, "instance")
    }

    async fn delete_instance(&self, req: &DeleteInstanceRequest) -> Result<()> {
        self.check_region(&req.region)?;
        self.client
            .delete(&self.instance_url(&req.instance_id, ""))
            .await?;
        Ok(())
    }

    async fn create_database(&self, req: &CreateDatabaseRequest) -> Result<Database> {
        self.check_region(&req.region)?;
        let url = self.instance_url(&req.instance_id, "databases");
        let response = self.client.post(&url, Some(&body_of(req)?)).await?;
        decode(response, "database")
    }

    async fn list_databases(&self, req: &ListDatabasesRequest) -> Result<ListDatabasesResponse> {
        self.check_region(&req.region)?;
        let managed = req.managed.map(|m| m.to_string());
        let url = with_query(
            self.instance_url(&req.instance_id, "databases"),
            &[
                ("name", req.name.as_deref()),
                ("managed", managed.as_deref()),
                ("owner", req.owner.as_deref()),
            ],
        );
        let response = self.client.get(&url).await?;
        decode(response, "database list")
    }

    async fn delete_database(&self, req: &DeleteDatabaseRequest) -> Result<()> {
        self.check_region(&req.region)?;
        let resource = format!("databases/{}", urlencoding::encode(&req.name));
        self.client
            .delete(&self.instance_url(&req.instance_id, &resource))
            .await?;
        Ok(())
    }

    async fn create_user(&self, req: &CreateUserRequest) -> Result<User> {
        self.check_region(&req.region)?;
        let url = self.instance_url(&req.instance_id, "users");
        let response = self.client.post(&url, Some(&body_of(req)?)).await?;
        decode(response, "user")
    }

    async fn list_users(&self, req: &ListUsersRequest) -> Result<ListUsersResponse> {
        self.check_region(&req.region)?;
        let url = with_query(
            self.instance_url(&req.instance_id, "users"),
            &[("name", req.name.as_deref())],
        );
        let response = self.client.get(&url).await?;
        decode(response, "user list")
    }

    async fn update_user(&self, req: &UpdateUserRequest) -> Result<User> {
        self.check_region(&req.region)?;
        let resource = format!("users/{}", urlencoding::encode(&req.name));
        let url = self.instance_url(&req.instance_id, &resource);
        let response = self.client.patch(&url, Some(&body_of(req)?)).await?;
        decode(response, "user")
    }

    async fn delete_user(&self, req: &DeleteUserRequest) -> Result<()> {
        self.check_region(&req.region)?;
        let resource = format!("users/{}", urlencoding::encode(&req.name));
        self.client
            .delete(&self.instance_url(&req.instance_id, &resource))
            .await?;
        Ok(())
    }

    async fn set_privilege(&self, req: &SetPrivilegeRequest) -> Result<Privilege> {
        self.check_region(&req.region)?;
        let url = self.instance_url(&req.instance_id, "privileges");
        let response = self.client.put(&url, Some(&body_of(req)?)).await?;
        if response.is_null() {
            // Some API versions answer an empty body
            return Ok(Privilege {
                permission: req.permission,
                database_name: req.database_name.clone(),
                user_name: req.user_name.clone(),
            });
        }
        decode(response, "privilege")
    }

    async fn list_privileges(
        &self,
        req: &ListPrivilegesRequest,
    ) -> Result<ListPrivilegesResponse> {
        self.check_region(&req.region)?;
        let url = with_query(
            self.instance_url(&req.instance_id, "privileges"),
            &[
                ("database_name", req.database_name.as_deref()),
                ("user_name", req.user_name.as_deref()),
            ],
        );
        let response = self.client.get(&url).await?;
        decode(response, "privilege list")
    }
}
