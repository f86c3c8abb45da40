//! Resource operations for managed databases
//!
//! Each resource kind (instance, database, user, privilege) exposes async
//! create/read/update/delete handlers that take a [`ResourceData`] and a
//! [`Meta`] and return [`Diagnostics`]. Handlers resolve the region of the
//! target, obtain a backend client through [`Meta::rdb_api`], and persist
//! fully regional identifiers (`region/id[/name]`).

pub mod data;
pub mod database;
pub mod diag;
pub mod dispatch;
pub mod error;
pub mod id;
pub mod instance;
mod lookup;
pub mod meta;
pub mod privilege;
pub mod resolver;
pub mod user;
pub mod validation;

pub use data::{AttrValue, ResourceData};
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use dispatch::{dispatch, Operation};
pub use error::{ProviderError, ProviderResult};
pub use meta::{Meta, MetaConfig};
pub use resolver::RegionResolver;
