//! Resumable byte-to-frame decoder
//!
//! Bytes arrive in whatever pieces the socket hands out. The decoder keeps
//! partial progress between calls, so a request split across many reads
//! decodes to the same frames as one delivered in a single chunk.
//!
//! Decoding is context free:
//! - `PAR_STRING` starts a string parameter (4-byte big-endian length, then
//!   that many raw bytes)
//! - `PAR_NUM` starts a number parameter (4-byte big-endian two's complement)
//! - any other byte is an identifier frame

use std::mem;

use super::error::ProtocolError;
use super::frame::Frame;
use super::identifiers::Identifier;
use crate::constants::protocol::{INITIAL_STRING_CAPACITY, WORD_SIZE};
use crate::types::MaxStringLength;

#[derive(Debug)]
enum State {
    /// Between frames, the next byte is a tag or identifier
    Tag,
    StringLength {
        word: [u8; WORD_SIZE],
        filled: usize,
    },
    StringBody {
        bytes: Vec<u8>,
        remaining: usize,
    },
    Number {
        word: [u8; WORD_SIZE],
        filled: usize,
    },
}

/// Copies bytes from `input` into `word`, returning true once it is full
fn fill_word(word: &mut [u8; WORD_SIZE], filled: &mut usize, input: &mut &[u8]) -> bool {
    let take = (WORD_SIZE - *filled).min(input.len());
    word[*filled..*filled + take].copy_from_slice(&input[..take]);
    *filled += take;
    *input = &input[take..];
    *filled == WORD_SIZE
}

#[derive(Debug)]
pub struct FrameDecoder {
    state: State,
    max_string_length: MaxStringLength,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(MaxStringLength::DEFAULT)
    }
}

impl FrameDecoder {
    #[must_use]
    pub fn new(max_string_length: MaxStringLength) -> Self {
        Self {
            state: State::Tag,
            max_string_length,
        }
    }

    /// True when no frame is partially decoded
    #[must_use]
    pub fn is_at_boundary(&self) -> bool {
        matches!(self.state, State::Tag)
    }

    /// Drop any partially decoded frame
    pub fn reset(&mut self) {
        self.state = State::Tag;
    }

    /// Decode as many frames as `input` completes, appending them to `out`.
    ///
    /// Frames completed before an error are still appended; the caller
    /// decides whether to act on them. After an error the decoder is back
    /// at a frame boundary.
    pub fn decode(&mut self, mut input: &[u8], out: &mut Vec<Frame>) -> Result<(), ProtocolError> {
        while let Some((&byte, rest)) = input.split_first() {
            match &mut self.state {
                State::Tag => {
                    input = rest;
                    self.state = match byte {
                        b if b == Identifier::ParString.as_byte() => State::StringLength {
                            word: [0; WORD_SIZE],
                            filled: 0,
                        },
                        b if b == Identifier::ParNum.as_byte() => State::Number {
                            word: [0; WORD_SIZE],
                            filled: 0,
                        },
                        b => {
                            out.push(Frame::Identifier(b));
                            State::Tag
                        }
                    };
                }
                State::StringLength { word, filled } => {
                    if !fill_word(word, filled, &mut input) {
                        continue;
                    }
                    let length = u32::from_be_bytes(*word);
                    let limit = self.max_string_length.get();
                    if length > limit {
                        self.state = State::Tag;
                        return Err(ProtocolError::StringTooLong { length, limit });
                    }
                    self.state = if length == 0 {
                        out.push(Frame::String(String::new()));
                        State::Tag
                    } else {
                        let remaining = length as usize;
                        State::StringBody {
                            bytes: Vec::with_capacity(remaining.min(INITIAL_STRING_CAPACITY)),
                            remaining,
                        }
                    };
                }
                State::StringBody { bytes, remaining } => {
                    let take = (*remaining).min(input.len());
                    bytes.extend_from_slice(&input[..take]);
                    input = &input[take..];
                    *remaining -= take;
                    if *remaining == 0 {
                        let bytes = mem::take(bytes);
                        self.state = State::Tag;
                        let text = String::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8)?;
                        out.push(Frame::String(text));
                    }
                }
                State::Number { word, filled } => {
                    if fill_word(word, filled, &mut input) {
                        out.push(Frame::Number(i32::from_be_bytes(*word)));
                        self.state = State::Tag;
                    }
                }
            }
        }
        Ok(())
    }

    /// Decode a complete buffer into a fresh frame list
    pub fn decode_all(&mut self, input: &[u8]) -> Result<Vec<Frame>, ProtocolError> {
        let mut frames = Vec::new();
        self.decode(input, &mut frames)?;
        Ok(frames)
    }
}
