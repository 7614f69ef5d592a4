//! Protocol framing errors
//!
//! Any of these means the peer is misbehaving or speaks another protocol
//! version. The connection that produced one is torn down.

use thiserror::Error;

use super::identifiers::{Identifier, Operation, ParameterKind, RawIdentifier};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProtocolError {
    /// A specific identifier was required but another byte arrived
    #[error("expected {expected}, received {actual}")]
    UnexpectedIdentifier {
        expected: Identifier,
        actual: RawIdentifier,
    },

    /// A frame of the wrong kind arrived (e.g. a string where a number was due)
    #[error("expected {expected}, received {actual}")]
    UnexpectedFrame {
        expected: &'static str,
        actual: String,
    },

    /// A request parameter had the wrong type
    #[error("{operation} request: expected {expected} at position {position}, received {actual}")]
    ParameterMismatch {
        operation: Operation,
        position: usize,
        expected: ParameterKind,
        actual: String,
    },

    /// More parameters arrived than the operation takes
    #[error("{operation} request takes {expected} parameters, received more")]
    TooManyParameters {
        operation: Operation,
        expected: usize,
    },

    /// The end marker arrived before every parameter
    #[error("{operation} request ended after {received} of {expected} parameters")]
    MissingParameters {
        operation: Operation,
        expected: usize,
        received: usize,
    },

    #[error("declared string length {length} exceeds the limit of {limit} bytes")]
    StringTooLong { length: u32, limit: u32 },

    #[error("string parameter is not valid UTF-8")]
    InvalidUtf8,

    #[error("negative element count {0}")]
    NegativeCount(i32),

    /// The frame sequence ended while more was expected
    #[error("frame sequence ended while expecting {0}")]
    Truncated(&'static str),

    #[error("{0} unexpected frames after the end of the sequence")]
    TrailingFrames(usize),

    /// Answer frames arrived while no request was outstanding
    #[error("unsolicited {0} while no request is outstanding")]
    Unsolicited(String),

    /// The answer belongs to a different operation than the outstanding request
    #[error("answer for {actual} while awaiting {expected}")]
    MismatchedAnswer {
        expected: Operation,
        actual: Operation,
    },

    /// A second request was issued before the previous one was answered
    #[error("request issued while {0} is still outstanding")]
    RequestInFlight(Operation),

    /// Requests kept arriving while earlier answers went unread
    #[error("{operation} request refused with {unsent} bytes of answers unsent")]
    OutputBacklog { operation: Operation, unsent: usize },
}
