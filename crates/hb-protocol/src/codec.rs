//! Tokio codec for newline-delimited JSON-RPC frames

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;
use crate::message::Message;

/// Maximum length of a single line, in bytes (excluding the newline)
pub const MAX_LINE_LENGTH: usize = 16 * 1024 * 1024;

/// One decoded line
///
/// A line that is not a JSON-RPC message does not poison the stream: it is
/// surfaced as [`Frame::Malformed`] so the reader can report it and carry on.
#[derive(Debug, Clone)]
pub enum Frame {
    Message(Message),
    Malformed { line: String, error: String },
}

/// Codec for encoding/decoding one JSON message per line
#[derive(Debug)]
pub struct JsonLineCodec {
    /// Index into the buffer where the newline search resumes
    next_index: usize,
    max_length: usize,
}

impl JsonLineCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_LENGTH)
    }

    /// Create a codec with a custom line limit
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            next_index: 0,
            max_length,
        }
    }
}

impl Default for JsonLineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for JsonLineCodec {
    type Item = Frame;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let newline = src[self.next_index..].iter().position(|b| *b == b'\n');

            let Some(offset) = newline else {
                if src.len() > self.max_length {
                    return Err(ProtocolError::LineTooLong {
                        size: src.len(),
                        max: self.max_length,
                    });
                }
                // Need more data
                self.next_index = src.len();
                return Ok(None);
            };

            let line_end = self.next_index + offset;
            self.next_index = 0;

            if line_end > self.max_length {
                return Err(ProtocolError::LineTooLong {
                    size: line_end,
                    max: self.max_length,
                });
            }

            let line = src.split_to(line_end + 1);
            let line = &line[..line_end];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            let text = match std::str::from_utf8(line) {
                Ok(text) => text.trim(),
                Err(e) => {
                    return Ok(Some(Frame::Malformed {
                        line: String::from_utf8_lossy(line).trim().to_string(),
                        error: e.to_string(),
                    }));
                }
            };
            if text.is_empty() {
                continue;
            }

            let frame = match serde_json::from_str::<Message>(text) {
                Ok(message) => Frame::Message(message),
                Err(e) => Frame::Malformed {
                    line: text.to_string(),
                    error: e.to_string(),
                },
            };
            return Ok(Some(frame));
        }
    }
}

impl Encoder<Message> for JsonLineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, message: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = serde_json::to_vec(&message)?;
        if payload.len() > self.max_length {
            return Err(ProtocolError::LineTooLong {
                size: payload.len(),
                max: self.max_length,
            });
        }

        dst.reserve(payload.len() + 1);
        dst.put_slice(&payload);
        dst.put_u8(b'\n');
        Ok(())
    }
}
