//! Connection error types for the reactor
//!
//! Everything that can go wrong with one connection, as opposed to one
//! request. None of these stop the reactor: the affected connection is
//! abandoned and the rest keep being served.

use std::fmt;
use std::io::ErrorKind;

use tracing::{Level, debug, error, warn};

use crate::protocol::ProtocolError;
use crate::types::ClientAddress;

/// Errors that can occur while managing connections
#[derive(Debug)]
#[non_exhaustive]
pub enum ConnectionError {
    /// Listening socket could not be bound
    Bind {
        address: String,
        source: std::io::Error,
    },

    /// Accepting a pending connection failed
    Accept(std::io::Error),

    /// Outbound TCP connection failed
    TcpConnect {
        host: String,
        port: u16,
        source: std::io::Error,
    },

    /// The session factory refused to build a session
    SessionCreation {
        peer: ClientAddress,
        source: anyhow::Error,
    },

    /// The peer violated the protocol
    Protocol {
        peer: ClientAddress,
        source: ProtocolError,
    },

    /// The peer stopped reading while its writer queue filled up
    OutputBacklog {
        peer: ClientAddress,
        unsent: usize,
    },

    /// I/O error during communication
    IoError(std::io::Error),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { address, source } => {
                write!(f, "Failed to bind {}: {}", address, source)
            }
            Self::Accept(source) => write!(f, "Failed to accept connection: {}", source),
            Self::TcpConnect { host, port, source } => {
                write!(f, "Failed to connect to {}:{}: {}", host, port, source)
            }
            Self::SessionCreation { peer, source } => {
                write!(f, "Failed to create session for {}: {:#}", peer, source)
            }
            Self::Protocol { peer, source } => {
                write!(f, "Protocol error from {}: {}", peer, source)
            }
            Self::OutputBacklog { peer, unsent } => {
                write!(f, "Output queue to {} is full with {} bytes unsent", peer, unsent)
            }
            Self::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bind { source, .. } | Self::TcpConnect { source, .. } => Some(source),
            Self::Accept(e) | Self::IoError(e) => Some(e),
            Self::SessionCreation { source, .. } => Some(&**source),
            Self::Protocol { source, .. } => Some(source),
            Self::OutputBacklog { .. } => None,
        }
    }
}

/// True for I/O errors that just mean the peer went away
#[must_use]
pub fn is_disconnect(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::UnexpectedEof
    )
}

impl ConnectionError {
    /// Check if this is the peer disconnecting (broken pipe, reset)
    #[must_use]
    pub fn is_client_disconnect(&self) -> bool {
        matches!(self, Self::IoError(e) if is_disconnect(e))
    }

    /// Check if this is a network connectivity error
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::TcpConnect { .. } | Self::Bind { .. })
    }

    /// Get the appropriate log level for this error
    #[must_use]
    pub fn log_level(&self) -> Level {
        match self {
            // Peers hanging up is normal
            Self::IoError(e) if is_disconnect(e) => Level::DEBUG,
            Self::IoError(_)
            | Self::Protocol { .. }
            | Self::OutputBacklog { .. }
            | Self::TcpConnect { .. } => Level::WARN,
            Self::Bind { .. } | Self::Accept(_) | Self::SessionCreation { .. } => Level::ERROR,
        }
    }

    /// Emit this error at its log level
    pub fn log(&self, context: &str) {
        let level = self.log_level();
        if level == Level::ERROR {
            error!(error = %self, "{}", context);
        } else if level == Level::WARN {
            warn!(error = %self, "{}", context);
        } else {
            debug!(error = %self, "{}", context);
        }
    }
}

impl From<std::io::Error> for ConnectionError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err)
    }
}
