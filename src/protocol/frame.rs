//! Decoded frame elements

use std::fmt;

use super::identifiers::{ParameterKind, RawIdentifier};

/// One typed unit on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A command, answer or error identifier (kept raw so unknown bytes can
    /// be reported)
    Identifier(u8),
    String(String),
    Number(i32),
}

impl Frame {
    /// Parameter kind of this frame, `None` for identifiers
    #[must_use]
    pub fn parameter_kind(&self) -> Option<ParameterKind> {
        match self {
            Self::Identifier(_) => None,
            Self::String(_) => Some(ParameterKind::String),
            Self::Number(_) => Some(ParameterKind::Number),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(byte) => write!(f, "identifier {}", RawIdentifier(*byte)),
            Self::String(s) => write!(f, "string parameter ({} bytes)", s.len()),
            Self::Number(n) => write!(f, "number parameter {n}"),
        }
    }
}
