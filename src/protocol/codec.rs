//! Send and receive primitives
//!
//! [`Encoder`] writes identifiers and typed parameters onto a transport.
//! [`FrameCursor`] reads them back, in order, from a decoded frame sequence.
//! Neither knows which identifiers are commands and which are answers.

use super::error::ProtocolError;
use super::frame::Frame;
use super::identifiers::{Identifier, RawIdentifier};
use crate::transport::Transport;

/// Writes frames onto a transport
pub struct Encoder<'a> {
    transport: &'a mut dyn Transport,
}

impl<'a> Encoder<'a> {
    pub fn new(transport: &'a mut dyn Transport) -> Self {
        Self { transport }
    }

    /// Write one identifier byte
    pub fn send_command(&mut self, id: Identifier) {
        self.transport.send(id.as_byte());
    }

    /// Write a string parameter: tag, 4-byte big-endian length, raw bytes
    ///
    /// Strings longer than `u32::MAX` bytes cannot be framed and are cut at
    /// that length.
    pub fn send_string(&mut self, value: &str) {
        let bytes = value.as_bytes();
        let length = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
        self.transport.send(Identifier::ParString.as_byte());
        self.transport.send_all(&length.to_be_bytes());
        self.transport.send_all(&bytes[..length as usize]);
    }

    /// Write a number parameter: tag, 4-byte big-endian two's complement
    pub fn send_number(&mut self, value: i32) {
        self.transport.send(Identifier::ParNum.as_byte());
        self.transport.send_all(&value.to_be_bytes());
    }

    /// Write an element count as a number parameter
    pub fn send_count(&mut self, count: usize) {
        self.send_number(i32::try_from(count).unwrap_or(i32::MAX));
    }
}

/// Reads frames in order from one complete request or response
#[derive(Debug)]
pub struct FrameCursor<'a> {
    frames: &'a [Frame],
    position: usize,
}

impl<'a> FrameCursor<'a> {
    #[must_use]
    pub fn new(frames: &'a [Frame]) -> Self {
        Self {
            frames,
            position: 0,
        }
    }

    fn next_frame(&mut self, expecting: &'static str) -> Result<&'a Frame, ProtocolError> {
        let frame = self
            .frames
            .get(self.position)
            .ok_or(ProtocolError::Truncated(expecting))?;
        self.position += 1;
        Ok(frame)
    }

    /// Read one identifier byte
    pub fn receive_command(&mut self) -> Result<u8, ProtocolError> {
        match self.next_frame("an identifier")? {
            Frame::Identifier(byte) => Ok(*byte),
            other => Err(ProtocolError::UnexpectedFrame {
                expected: "an identifier",
                actual: other.to_string(),
            }),
        }
    }

    /// Read one identifier byte and require it to be `expected`
    pub fn expect_command(&mut self, expected: Identifier) -> Result<(), ProtocolError> {
        let actual = self.receive_command()?;
        if actual == expected.as_byte() {
            Ok(())
        } else {
            Err(ProtocolError::UnexpectedIdentifier {
                expected,
                actual: RawIdentifier(actual),
            })
        }
    }

    pub fn receive_string(&mut self) -> Result<String, ProtocolError> {
        match self.next_frame("a string parameter")? {
            Frame::String(value) => Ok(value.clone()),
            other => Err(ProtocolError::UnexpectedFrame {
                expected: "a string parameter",
                actual: other.to_string(),
            }),
        }
    }

    pub fn receive_number(&mut self) -> Result<i32, ProtocolError> {
        match self.next_frame("a number parameter")? {
            Frame::Number(value) => Ok(*value),
            other => Err(ProtocolError::UnexpectedFrame {
                expected: "a number parameter",
                actual: other.to_string(),
            }),
        }
    }

    /// Read an element count, rejecting negative values
    pub fn receive_count(&mut self) -> Result<usize, ProtocolError> {
        let count = self.receive_number()?;
        usize::try_from(count).map_err(|_| ProtocolError::NegativeCount(count))
    }

    /// Require that every frame has been consumed
    pub fn finish(&self) -> Result<(), ProtocolError> {
        match self.frames.len() - self.position {
            0 => Ok(()),
            extra => Err(ProtocolError::TrailingFrames(extra)),
        }
    }
}
