//! Binary wire protocol
//!
//! A request or response is a sequence of frames: single identifier bytes
//! and tagged parameters (strings and 32-bit numbers). This module turns
//! bytes into frames ([`FrameDecoder`]), frames into typed messages
//! ([`FrameCursor`], [`Request`], [`Response`]) and back ([`Encoder`]).

mod codec;
mod decoder;
mod error;
mod frame;
mod identifiers;
mod message;

pub use codec::{Encoder, FrameCursor};
pub use decoder::FrameDecoder;
pub use error::ProtocolError;
pub use frame::Frame;
pub use identifiers::{Identifier, Operation, ParameterKind, RawIdentifier};
pub use message::{Request, Response, error_identifier, status_from_error};
