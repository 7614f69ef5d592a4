//! # fusenet
//!
//! A multi-client bulletin-board server and client. Clients list, create
//! and delete newsgroups and the articles posted to them over a compact
//! binary request/response protocol.
//!
//! ## Architecture
//!
//! - **protocol**: identifier table, resumable frame decoder, encoder and
//!   typed request/response messages
//! - **session**: sans-IO protocol state machines for both roles
//! - **reactor**: tokio-based connection multiplexer driving sessions
//! - **storage**: the `Database` trait with in-memory and filesystem backends
//! - **config** / **args**: TOML configuration and command line

pub mod args;
pub mod client;
pub mod config;
pub mod connection_error;
pub mod constants;
pub mod logging;
pub mod protocol;
pub mod reactor;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod transport;
pub mod types;

pub use client::{ClientOutcome, OneShotClient};
pub use config::{Config, ConfigSource, StorageBackend, load_config, load_config_with_fallback};
pub use connection_error::ConnectionError;
pub use reactor::Reactor;
pub use session::{
    ClientHandler, ClientSession, ClientSessionFactory, ServerSession, ServerSessionFactory,
    Session, SessionFactory,
};
pub use storage::{Database, FilesystemDatabase, MemoryDatabase, SharedDatabase, StatusCode};
pub use transport::{SocketTransport, Transport};
