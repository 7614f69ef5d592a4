//! Default values for configuration fields

use crate::constants::{network, storage};
use crate::types::{HostName, StorageRoot};

/// Default listen host (all interfaces)
#[inline]
pub fn listen_host() -> HostName {
    HostName::new(network::DEFAULT_LISTEN_HOST.to_string()).expect("listen host is non-empty")
}

/// Default filesystem backend root, relative to the working directory
#[inline]
pub fn storage_root() -> StorageRoot {
    StorageRoot::new(storage::DEFAULT_ROOT.to_string()).expect("storage root is non-empty")
}
