//! Resource dispatch
//!
//! Maps a resource type name and an operation onto its handler.

use super::data::ResourceData;
use super::diag::{Diagnostic, Diagnostics};
use super::meta::Meta;
use super::{database, instance, privilege, user};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource types handled by [`dispatch`]
pub const RESOURCE_TYPES: [&str; 4] = [
    instance::RESOURCE_TYPE,
    database::RESOURCE_TYPE,
    user::RESOURCE_TYPE,
    privilege::RESOURCE_TYPE,
];

/// Run `operation` on a resource of type `resource_type`
pub async fn dispatch(
    resource_type: &str,
    operation: Operation,
    data: &mut ResourceData,
    meta: &Meta,
) -> Diagnostics {
    tracing::debug!("dispatch: type={}, operation={}", resource_type, operation);

    match resource_type {
        instance::RESOURCE_TYPE => match operation {
            Operation::Create => instance::create(data, meta).await,
            Operation::Read => instance::read(data, meta).await,
            Operation::Update => instance::update(data, meta).await,
            Operation::Delete => instance::delete(data, meta).await,
        },
        database::RESOURCE_TYPE => match operation {
            Operation::Create => database::create(data, meta).await,
            Operation::Read => database::read(data, meta).await,
            Operation::Update => unsupported(resource_type, operation),
            Operation::Delete => database::delete(data, meta).await,
        },
        user::RESOURCE_TYPE => match operation {
            Operation::Create => user::create(data, meta).await,
            Operation::Read => user::read(data, meta).await,
            Operation::Update => user::update(data, meta).await,
            Operation::Delete => user::delete(data, meta).await,
        },
        privilege::RESOURCE_TYPE => match operation {
            Operation::Create => privilege::create(data, meta).await,
            Operation::Read => privilege::read(data, meta).await,
            Operation::Update => privilege::update(data, meta).await,
            Operation::Delete => privilege::delete(data, meta).await,
        },
        _ => vec![Diagnostic::error(format!(
            "Unknown resource type: {}",
            resource_type
        ))],
    }
}

fn unsupported(resource_type: &str, operation: Operation) -> Diagnostics {
    vec![Diagnostic::error(format!(
        "{} does not support {}",
        resource_type, operation
    ))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::meta::MetaConfig;
    use crate::scw::memory::InMemoryRdbApi;
    use std::sync::Arc;

    fn meta() -> (Meta, Arc<InMemoryRdbApi>) {
        let meta = Meta::new(MetaConfig::default()).unwrap();
        let api = Arc::new(InMemoryRdbApi::new());
        meta.set_substitute_api(api.clone()).unwrap();
        (meta, api)
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let (meta, api) = meta();
        let mut data = ResourceData::new();
        let diags = dispatch("scaleway_rdb_acl", Operation::Read, &mut data, &meta).await;
        assert_eq!(diags, vec![Diagnostic::error("Unknown resource type: scaleway_rdb_acl")]);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_database_update_is_unsupported() {
        let (meta, api) = meta();
        let mut data = ResourceData::new();
        data.set_id("fr-par/1111/db");
        let diags = dispatch(database::RESOURCE_TYPE, Operation::Update, &mut data, &meta).await;
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "scaleway_rdb_database does not support update");
        assert_eq!(data.id(), "fr-par/1111/db");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_handler() {
        let (meta, _) = meta();
        let mut data = ResourceData::new();
        let diags = dispatch(user::RESOURCE_TYPE, Operation::Read, &mut data, &meta).await;
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "can't parse user resource id: ");
    }

    #[tokio::test]
    async fn test_every_resource_type_is_known() {
        let (meta, _) = meta();
        for resource_type in RESOURCE_TYPES {
            let mut data = ResourceData::new();
            let diags = dispatch(resource_type, Operation::Read, &mut data, &meta).await;
            assert_eq!(diags.len(), 1);
            assert!(diags[0].summary.starts_with("can't parse"), "{resource_type}");
        }
    }
}
