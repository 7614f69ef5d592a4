//! Network-related domain types

use derive_more::{AsRef, Deref, Display, From, Into};
use std::net::SocketAddr;

/// Address of a connected peer.
///
/// Keeps peer addresses apart from the local listen address in logs
/// and connection tables.
///
/// # Examples
///
/// ```
/// use std::net::SocketAddr;
/// use fusenet::types::ClientAddress;
///
/// let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();
/// let client_addr = ClientAddress::from(addr);
///
/// assert_eq!(client_addr.to_string(), "127.0.0.1:4000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into, AsRef, Deref)]
pub struct ClientAddress(SocketAddr);

impl ClientAddress {
    #[inline]
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self(addr)
    }

    #[inline]
    #[must_use]
    pub const fn as_socket_addr(&self) -> &SocketAddr {
        &self.0
    }
}
