//! Bridge configuration: schema types and TOML discovery/loading.

pub mod loader;
pub mod schema;

pub use {
    loader::{discover_and_load, load_config},
    schema::{BridgeConfig, DatabaseConfig, ReconnectConfig, ReconnectMode},
};
