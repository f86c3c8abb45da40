//! In-memory RDB backend
//!
//! [`InMemoryRdbApi`] implements [`RdbApi`] without any network access. State is
//! partitioned by region, so a handler that picks the wrong region simply does
//! not find what the test seeded. Every call is recorded with the region it was
//! sent to, failures can be injected per operation, and an expected region can be
//! enforced to make misrouted calls fail outright.
//!
//! ```ignore
//! let api = Arc::new(InMemoryRdbApi::new().with_expected_region(Region::FR_SRR));
//! api.fail_on(RdbCall::ListDatabases, "Error");
//! meta.set_substitute_api(api.clone())?;
//! ```

use super::http::ApiStatusError;
use super::rdb::*;
use super::region::Region;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

/// Operation names, used to inject failures and inspect recorded calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RdbCall {
    CreateInstance,
    GetInstance,
    UpdateInstance,
    DeleteInstance,
    CreateDatabase,
    ListDatabases,
    DeleteDatabase,
    CreateUser,
    ListUsers,
    UpdateUser,
    DeleteUser,
    SetPrivilege,
    ListPrivileges,
}

/// One call received by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub call: RdbCall,
    pub region: Region,
    pub instance_id: String,
    /// Database, user or privilege target when the call has one
    pub name: Option<String>,
}

type InstanceKey = (Region, String);

#[derive(Default)]
struct State {
    instances: BTreeMap<InstanceKey, Instance>,
    databases: BTreeMap<InstanceKey, Vec<Database>>,
    users: BTreeMap<InstanceKey, Vec<User>>,
    privileges: BTreeMap<InstanceKey, Vec<Privilege>>,
    failures: HashMap<RdbCall, String>,
    calls: Vec<RecordedCall>,
}

/// Deterministic, network-free [`RdbApi`]
#[derive(Default)]
pub struct InMemoryRdbApi {
    state: Mutex<State>,
    expected_region: Option<Region>,
    database_template: Database,
}

impl InMemoryRdbApi {
    pub fn new() -> Self {
        Self {
            database_template: Database {
                managed: true,
                ..Database::default()
            },
            ..Self::default()
        }
    }

    /// Reject every call that is not addressed to `region`
    pub fn with_expected_region(mut self, region: Region) -> Self {
        self.expected_region = Some(region);
        self
    }

    /// Owner, managed flag and size given to newly created databases
    pub fn with_database_template(mut self, template: Database) -> Self {
        self.database_template = template;
        self
    }

    /// Make every future `call` fail with `message`
    pub fn fail_on(&self, call: RdbCall, message: &str) {
        self.lock().failures.insert(call, message.to_string());
    }

    pub fn seed_instance(&self, region: Region, instance: Instance) {
        self.lock()
            .instances
            .insert((region, instance.id.clone()), instance);
    }

    pub fn seed_database(&self, region: Region, instance_id: &str, database: Database) {
        self.lock()
            .databases
            .entry((region, instance_id.to_string()))
            .or_default()
            .push(database);
    }

    pub fn seed_user(&self, region: Region, instance_id: &str, user: User) {
        self.lock()
            .users
            .entry((region, instance_id.to_string()))
            .or_default()
            .push(user);
    }

    pub fn seed_privilege(&self, region: Region, instance_id: &str, privilege: Privilege) {
        self.lock()
            .privileges
            .entry((region, instance_id.to_string()))
            .or_default()
            .push(privilege);
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Calls of one kind received so far
    pub fn calls_to(&self, call: RdbCall) -> Vec<RecordedCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.call == call)
            .cloned()
            .collect()
    }

    pub fn databases(&self, region: &Region, instance_id: &str) -> Vec<Database> {
        self.lock()
            .databases
            .get(&(region.clone(), instance_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test must not hide the state from the others
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call, then apply region expectation and injected failures
    fn enter(
        &self,
        call: RdbCall,
        region: &Region,
        instance_id: &str,
        name: Option<&str>,
    ) -> Result<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(RecordedCall {
            call,
            region: region.clone(),
            instance_id: instance_id.to_string(),
            name: name.map(str::to_string),
        });

        if let Some(expected) = &self.expected_region {
            if expected != region {
                return Err(anyhow::anyhow!(
                    "{:?} sent to region {}, expected {}",
                    call,
                    region,
                    expected
                ));
            }
        }
        if let Some(message) = state.failures.get(&call) {
            return Err(anyhow::anyhow!("{}", message));
        }
        Ok(state)
    }
}

fn key(region: &Region, instance_id: &str) -> InstanceKey {
    (region.clone(), instance_id.to_string())
}

fn conflict(what: &str) -> anyhow::Error {
    ApiStatusError::new(StatusCode::CONFLICT, Some(format!("{} already exists", what))).into()
}

fn not_found(what: &str) -> anyhow::Error {
    ApiStatusError::not_found(format!("{} is not found", what)).into()
}

#[async_trait]
impl RdbApi for InMemoryRdbApi {
    async fn create_instance(&self, req: &CreateInstanceRequest) -> Result<Instance> {
        let mut state = self.enter(RdbCall::CreateInstance, &req.region, "", Some(&req.name))?;
        let instance = Instance {
            id: uuid::Uuid::new_v4().to_string(),
            name: req.name.clone(),
            project_id: req.project_id.clone(),
            status: "ready".to_string(),
            engine: req.engine.clone(),
            node_type: req.node_type.clone(),
            is_ha_cluster: req.is_ha_cluster,
            tags: req.tags.clone(),
            endpoint: Some(Endpoint {
                ip: Some("10.0.0.1".to_string()),
                port: 5432,
                name: None,
            }),
            read_replicas: Vec::new(),
            settings: req.init_settings.clone(),
            created_at: Some(chrono::Utc::now()),
        };
        state
            .instances
            .insert(key(&req.region, &instance.id), instance.clone());
        Ok(instance)
    }

    async fn get_instance(&self, req: &GetInstanceRequest) -> Result<Instance> {
        let state = self.enter(RdbCall::GetInstance, &req.region, &req.instance_id, None)?;
        state
            .instances
            .get(&key(&req.region, &req.instance_id))
            .cloned()
            .ok_or_else(|| not_found("instance"))
    }

    async fn update_instance(&self, req: &UpdateInstanceRequest) -> Result<Instance> {
        let mut state =
            self.enter(RdbCall::UpdateInstance, &req.region, &req.instance_id, None)?;
        let instance = state
            .instances
            .get_mut(&key(&req.region, &req.instance_id))
            .ok_or_else(|| not_found("instance"))?;
        if let Some(name) = &req.name {
            instance.name = name.clone();
        }
        if let Some(tags) = &req.tags {
            instance.tags = tags.clone();
        }
        Ok(instance.clone())
    }

    async fn delete_instance(&self, req: &DeleteInstanceRequest) -> Result<()> {
        let mut state =
            self.enter(RdbCall::DeleteInstance, &req.region, &req.instance_id, None)?;
        let instance_key = key(&req.region, &req.instance_id);
        state
            .instances
            .remove(&instance_key)
            .ok_or_else(|| not_found("instance"))?;
        state.databases.remove(&instance_key);
        state.users.remove(&instance_key);
        state.privileges.remove(&instance_key);
        Ok(())
    }

    async fn create_database(&self, req: &CreateDatabaseRequest) -> Result<Database> {
        let mut state = self.enter(
            RdbCall::CreateDatabase,
            &req.region,
            &req.instance_id,
            Some(&req.name),
        )?;
        let databases = state
            .databases
            .entry(key(&req.region, &req.instance_id))
            .or_default();
        if databases.iter().any(|d| d.name == req.name) {
            return Err(conflict("database"));
        }
        let database = Database {
            name: req.name.clone(),
            ..self.database_template.clone()
        };
        databases.push(database.clone());
        Ok(database)
    }

    async fn list_databases(&self, req: &ListDatabasesRequest) -> Result<ListDatabasesResponse> {
        let state = self.enter(
            RdbCall::ListDatabases,
            &req.region,
            &req.instance_id,
            req.name.as_deref(),
        )?;
        let databases: Vec<Database> = state
            .databases
            .get(&key(&req.region, &req.instance_id))
            .map(|all| {
                all.iter()
                    .filter(|d| req.name.as_ref().map_or(true, |n| &d.name == n))
                    .filter(|d| req.owner.as_ref().map_or(true, |o| &d.owner == o))
                    .filter(|d| req.managed.map_or(true, |m| d.managed == m))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(ListDatabasesResponse {
            total_count: databases.len() as u32,
            databases,
        })
    }

    async fn delete_database(&self, req: &DeleteDatabaseRequest) -> Result<()> {
        let mut state = self.enter(
            RdbCall::DeleteDatabase,
            &req.region,
            &req.instance_id,
            Some(&req.name),
        )?;
        let databases = state
            .databases
            .get_mut(&key(&req.region, &req.instance_id))
            .ok_or_else(|| not_found("database"))?;
        let before = databases.len();
        databases.retain(|d| d.name != req.name);
        if databases.len() == before {
            return Err(not_found("database"));
        }
        Ok(())
    }

    async fn create_user(&self, req: &CreateUserRequest) -> Result<User> {
        let mut state = self.enter(
            RdbCall::CreateUser,
            &req.region,
            &req.instance_id,
            Some(&req.name),
        )?;
        let users = state
            .users
            .entry(key(&req.region, &req.instance_id))
            .or_default();
        if users.iter().any(|u| u.name == req.name) {
            return Err(conflict("user"));
        }
        let user = User {
            name: req.name.clone(),
            is_admin: req.is_admin,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn list_users(&self, req: &ListUsersRequest) -> Result<ListUsersResponse> {
        let state = self.enter(
            RdbCall::ListUsers,
            &req.region,
            &req.instance_id,
            req.name.as_deref(),
        )?;
        let users: Vec<User> = state
            .users
            .get(&key(&req.region, &req.instance_id))
            .map(|all| {
                all.iter()
                    .filter(|u| req.name.as_ref().map_or(true, |n| &u.name == n))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(ListUsersResponse {
            total_count: users.len() as u32,
            users,
        })
    }

    async fn update_user(&self, req: &UpdateUserRequest) -> Result<User> {
        let mut state = self.enter(
            RdbCall::UpdateUser,
            &req.region,
            &req.instance_id,
            Some(&req.name),
        )?;
        let user = state
            .users
            .get_mut(&key(&req.region, &req.instance_id))
            .and_then(|users| users.iter_mut().find(|u| u.name == req.name))
            .ok_or_else(|| not_found("user"))?;
        if let Some(is_admin) = req.is_admin {
            user.is_admin = is_admin;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, req: &DeleteUserRequest) -> Result<()> {
        let mut state = self.enter(
            RdbCall::DeleteUser,
            &req.region,
            &req.instance_id,
            Some(&req.name),
        )?;
        let users = state
            .users
            .get_mut(&key(&req.region, &req.instance_id))
            .ok_or_else(|| not_found("user"))?;
        let before = users.len();
        users.retain(|u| u.name != req.name);
        if users.len() == before {
            return Err(not_found("user"));
        }
        Ok(())
    }

    async fn set_privilege(&self, req: &SetPrivilegeRequest) -> Result<Privilege> {
        let mut state = self.enter(
            RdbCall::SetPrivilege,
            &req.region,
            &req.instance_id,
            Some(&req.user_name),
        )?;
        let privileges = state
            .privileges
            .entry(key(&req.region, &req.instance_id))
            .or_default();
        privileges.retain(|p| {
            !(p.database_name == req.database_name && p.user_name == req.user_name)
        });
        let privilege = Privilege {
            permission: req.permission,
            database_name: req.database_name.clone(),
            user_name: req.user_name.clone(),
        };
        // Revoking leaves nothing behind
        if req.permission != Permission::None {
            privileges.push(privilege.clone());
        }
        Ok(privilege)
    }

    async fn list_privileges(
        &self,
        req: &ListPrivilegesRequest,
    ) -> Result<ListPrivilegesResponse> {
        let state = self.enter(
            RdbCall::ListPrivileges,
            &req.region,
            &req.instance_id,
            req.user_name.as_deref(),
        )?;
        let privileges: Vec<Privilege> = state
            .privileges
            .get(&key(&req.region, &req.instance_id))
            .map(|all| {
                all.iter()
                    .filter(|p| {
                        req.database_name
                            .as_ref()
                            .map_or(true, |d| &p.database_name == d)
                    })
                    .filter(|p| req.user_name.as_ref().map_or(true, |u| &p.user_name == u))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(ListPrivilegesResponse {
            total_count: privileges.len() as u32,
            privileges,
        })
    }
}
