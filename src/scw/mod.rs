//! Scaleway API interaction module
//!
//! # Module Structure
//!
//! - [`region`] - Region codes, validation and the default region
//! - [`http`] - HTTP utilities for REST API calls
//! - [`client`] - Main Scaleway client and URL builders
//! - [`rdb`] - Managed Database API models, the [`rdb::RdbApi`] capability and its REST implementation
//! - [`memory`] - In-memory [`rdb::RdbApi`] used as a test double
//!
//! # Example
//!
//! ```ignore
//! use scw_rdb::scw::{client::ScwClient, rdb::{RdbApi, RdbHttpApi, GetInstanceRequest}, region::Region};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = ScwClient::new("secret", "https://api.scaleway.com", "scw-rdb")?;
//!     let api = RdbHttpApi::new(client, Region::FR_PAR);
//!     let instance = api
//!         .get_instance(&GetInstanceRequest { region: Region::FR_PAR, instance_id: "...".into() })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod http;
pub mod memory;
pub mod rdb;
pub mod region;
