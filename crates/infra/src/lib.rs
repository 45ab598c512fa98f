//! Infrastructure layer: SQLite persistence, migrations, configuration.

pub mod config;
pub mod db;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use config::AppConfig;
pub use store::{InventoryStore, StoreError, StoreResult};
