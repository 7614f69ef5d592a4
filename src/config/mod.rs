//! Configuration module
//!
//! Configuration types, TOML loading and validation for the server.

mod defaults;
mod loading;
mod types;
mod validation;

pub use loading::{ConfigSource, load_config, load_config_with_fallback};
pub use types::{
    Config, LoggingConfig, ProtocolConfig, ServerConfig, StorageBackend, StorageConfig,
};

pub use defaults::{listen_host, storage_root};
