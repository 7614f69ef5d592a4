//! Constants used throughout the service
//!
//! Values that are configurable at runtime have their defaults in
//! `crate::types` instead.

use std::time::Duration;

/// Wire format constants
pub mod protocol {
    /// Size of a length prefix or number parameter (4 bytes, big-endian)
    pub const WORD_SIZE: usize = 4;

    /// Upper bound on the capacity reserved for a string before its bytes
    /// arrive (4KB)
    ///
    /// The declared length comes from the peer, so the buffer grows as bytes
    /// actually arrive rather than trusting the declaration up front.
    pub const INITIAL_STRING_CAPACITY: usize = 4096;
}

/// Reactor constants
pub mod reactor {
    use super::Duration;

    /// Capacity of the channel carrying socket events to the dispatch loop
    /// Readers wait when the dispatch loop falls this far behind
    pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

    /// Chunks a connection's writer task may have queued
    /// A full queue means the peer stopped reading and the connection is dropped
    pub const OUTGOING_QUEUE_CAPACITY: usize = 256;

    /// How long shutdown waits for writer tasks to flush pending answers
    pub const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);
}

/// Filesystem backend constants
pub mod storage {
    /// File inside a newsgroup directory holding the newsgroup name
    pub const META_FILE: &str = "meta";

    /// High-water mark of allocated ids inside a scanned directory
    pub const NEXT_ID_FILE: &str = ".next";

    /// Default root directory of the filesystem backend
    pub const DEFAULT_ROOT: &str = "db";
}

/// Network defaults
pub mod network {
    /// Address the server binds to by default (all interfaces)
    pub const DEFAULT_LISTEN_HOST: &str = "0.0.0.0";

    /// Host the client connects to by default
    pub const DEFAULT_CLIENT_HOST: &str = "localhost";
}

/// Configuration file defaults
pub mod config {
    /// Config file read when `--config` is not given
    pub const DEFAULT_PATH: &str = "fusenet.toml";
}
