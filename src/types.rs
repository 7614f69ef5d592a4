//! Core identifier and value types
//!
//! Newsgroup and article identifiers travel on the wire as 32-bit
//! two's-complement numbers, so both wrap an `i32`.

pub mod config;
pub mod network;
pub mod validated;

pub use config::{FileMode, MaxStringLength, OutputBacklogLimit, Port, ReadBufferSize};
pub use network::ClientAddress;
pub use validated::{HostName, StorageRoot, ValidationError};

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Identifier of a newsgroup, assigned by the storage engine
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct NewsgroupId(i32);

impl NewsgroupId {
    #[must_use]
    #[inline]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    #[inline]
    pub const fn get(&self) -> i32 {
        self.0
    }

    /// Next identifier in allocation order
    #[must_use]
    #[inline]
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Identifier of an article, scoped to its owning newsgroup
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct ArticleId(i32);

impl ArticleId {
    #[must_use]
    #[inline]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    #[inline]
    pub const fn get(&self) -> i32 {
        self.0
    }

    /// Next identifier in allocation order
    #[must_use]
    #[inline]
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Handle of one accepted connection inside the reactor
///
/// Handles are never reused during the lifetime of a reactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("conn#{_0}")]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a connection handle from a raw sequence number
    #[must_use]
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newsgroup_id_next() {
        let id = NewsgroupId::new(4);
        assert_eq!(id.next(), NewsgroupId::new(5));
        assert_eq!(id.get(), 4);
    }

    #[test]
    fn test_newsgroup_id_next_saturates() {
        let id = NewsgroupId::new(i32::MAX);
        assert_eq!(id.next(), id);
    }

    #[test]
    fn test_article_id_conversions() {
        let id = ArticleId::from(17);
        let raw: i32 = id.into();
        assert_eq!(raw, 17);
        assert_eq!(id.to_string(), "17");
    }

    #[test]
    fn test_ids_order_numerically() {
        let mut ids = vec![ArticleId::new(10), ArticleId::new(-1), ArticleId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![ArticleId::new(-1), ArticleId::new(2), ArticleId::new(10)]);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::from_raw(42);
        assert_eq!(id.to_string(), "conn#42");
        assert_eq!(id.as_u64(), 42);
    }

    #[test]
    fn test_newsgroup_id_serde_transparent() {
        let json = serde_json::to_string(&NewsgroupId::new(7)).unwrap();
        assert_eq!(json, "7");
    }
}
