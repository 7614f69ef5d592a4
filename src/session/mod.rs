//! Per-connection protocol sessions
//!
//! A session is a sans-IO state machine: the reactor hands it a transport
//! holding whatever bytes have arrived, the session consumes them, queues
//! its output on the same transport and returns without waiting for more.
//! Partial requests are carried over to the next delivery.

pub mod client;
pub mod server;

pub use client::{ClientHandler, ClientSession, ClientSessionFactory};
pub use server::{ServerSession, ServerSessionFactory, ServerState};

use crate::protocol::ProtocolError;
use crate::transport::Transport;
use crate::types::ClientAddress;

/// Lifecycle hooks invoked by the reactor for one connection
pub trait Session: Send {
    /// The connection is registered and ready for traffic
    fn connection_established(&mut self, _transport: &mut dyn Transport) {}

    /// New bytes are buffered in `transport`
    ///
    /// An error means the peer violated the protocol; the reactor then
    /// releases the connection.
    fn data_received(&mut self, transport: &mut dyn Transport) -> Result<(), ProtocolError>;

    /// The connection is gone; any partially decoded request is discarded
    fn connection_lost(&mut self) {}
}

/// Creates one session per connection
pub trait SessionFactory: Send {
    type Session: Session;

    /// Build the session for a newly accepted or initiated connection.
    /// A failure abandons that connection only.
    fn create(&mut self, peer: ClientAddress) -> anyhow::Result<Self::Session>;
}

/// Drain every buffered byte from a transport
pub(crate) fn drain(transport: &mut dyn Transport) -> Vec<u8> {
    std::iter::from_fn(|| transport.receive()).collect()
}
