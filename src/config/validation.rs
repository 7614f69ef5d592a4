//! Configuration validation
//!
//! Most constraints are enforced by the field types (non-zero ports and
//! buffer sizes, non-empty host and root, bounded modes). What remains are
//! combinations of fields.

use anyhow::Result;

use super::types::{Config, StorageBackend};

impl Config {
    /// Check cross-field constraints, warning about settings that are legal
    /// but probably not intended
    pub fn validate(&self) -> Result<()> {
        let storage = &self.storage;

        if storage.backend == StorageBackend::Filesystem {
            if storage.dir_mode.get() & 0o700 != 0o700 {
                anyhow::bail!(
                    "storage.dir_mode {} does not let the server enter its own newsgroup directories",
                    storage.dir_mode
                );
            }
            if storage.file_mode.get() & 0o600 != 0o600 {
                anyhow::bail!(
                    "storage.file_mode {} does not let the server read and write its own articles",
                    storage.file_mode
                );
            }
        } else if storage.clear_on_start {
            tracing::warn!("storage.clear_on_start has no effect on the in-memory backend");
        }

        if self.protocol.max_string_length.get() as usize <= self.server.read_buffer_size.get() {
            tracing::warn!(
                "protocol.max_string_length ({}) is not larger than server.read_buffer_size ({})",
                self.protocol.max_string_length,
                self.server.read_buffer_size
            );
        }

        Ok(())
    }
}
