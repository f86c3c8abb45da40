//! Scaleway Managed Database (RDB) resources
//!
//! - [`scw`]: REST transport, region model and the [`scw::rdb::RdbApi`] backend
//! - [`provider`]: identifier codec, region resolution and resource handlers
//! - [`config`]: credentials and defaults

pub mod config;
pub mod provider;
pub mod scw;
