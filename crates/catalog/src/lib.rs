//! Course catalog client.
//!
//! The enrollment stages depend on [`CatalogApi`] only. [`CatalogClient`]
//! implements it over the catalog service's REST endpoints;
//! [`InMemoryCatalog`] serves fixed data and can simulate failures.

pub mod api;
pub mod config;
pub mod memory;

pub use api::{CatalogApi, CatalogClient, CatalogError};
pub use config::CatalogConfig;
pub use memory::InMemoryCatalog;
