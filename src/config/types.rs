//! Configuration type definitions

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::{
    FileMode, HostName, MaxStringLength, OutputBacklogLimit, Port, ReadBufferSize, StorageRoot,
};

/// Which storage engine the server runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Everything lives in process memory and is lost on exit
    #[default]
    Memory,
    /// One directory per newsgroup, one file per article
    Filesystem,
}

impl StorageBackend {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Filesystem => "filesystem",
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listening socket settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host/IP to bind to (default: 0.0.0.0)
    pub host: HostName,
    /// Port to listen on (default: 4000)
    pub port: Port,
    /// Bytes read from a socket per delivery
    pub read_buffer_size: ReadBufferSize,
    /// Unsent answer bytes after which a connection that keeps sending
    /// requests is dropped
    pub output_backlog_limit: OutputBacklogLimit,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: super::defaults::listen_host(),
            port: Port::default(),
            read_buffer_size: ReadBufferSize::default(),
            output_backlog_limit: OutputBacklogLimit::default(),
        }
    }
}

/// Storage engine selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory of the filesystem backend
    pub root: StorageRoot,
    /// Permission bits for newsgroup directories
    pub dir_mode: FileMode,
    /// Permission bits for article and meta files
    pub file_mode: FileMode,
    /// Remove every newsgroup when the server starts
    pub clear_on_start: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            root: super::defaults::storage_root(),
            dir_mode: FileMode::DIRECTORY,
            file_mode: FileMode::FILE,
            clear_on_start: false,
        }
    }
}

/// Wire protocol limits
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Longest string parameter a peer may announce
    pub max_string_length: MaxStringLength,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also write logs to this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_lowercase_serde() {
        let config: StorageConfig = toml::from_str("backend = \"filesystem\"").unwrap();
        assert_eq!(config.backend, StorageBackend::Filesystem);
        assert_eq!(config.root.as_str(), "db");

        assert!(toml::from_str::<StorageConfig>("backend = \"Filesystem\"").is_err());
    }

    #[test]
    fn test_empty_document_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.server.host.as_str(), "0.0.0.0");
        assert_eq!(config.server.port.get(), 4000);
        assert_eq!(config.storage.dir_mode, FileMode::DIRECTORY);
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_octal_modes() {
        let config: StorageConfig = toml::from_str("dir_mode = 0o700\nfile_mode = 0o600").unwrap();
        assert_eq!(config.dir_mode.get(), 0o700);
        assert_eq!(config.file_mode.get(), 0o600);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(toml::from_str::<ServerConfig>("port = 0").is_err());
        assert!(toml::from_str::<ServerConfig>("host = \"  \"").is_err());
        assert!(toml::from_str::<StorageConfig>("root = \"\"").is_err());
        assert!(toml::from_str::<StorageConfig>("file_mode = 0o17777").is_err());
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Filesystem;
        config.logging.file = Some(PathBuf::from("fusenet.log"));

        let text = toml::to_string(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_backend_display() {
        assert_eq!(StorageBackend::Memory.to_string(), "memory");
        assert_eq!(StorageBackend::Filesystem.to_string(), "filesystem");
    }
}
