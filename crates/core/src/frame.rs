//! The unit of transport between a browser and the upstream voice API.

use bytes::Bytes;
use std::fmt;

/// One discrete payload carried over a duplex connection.
///
/// Whether a frame is binary or text is decided once, when it is received
/// from a transport, and carried unchanged to the other side. The relay never
/// looks inside the payload.
#[derive(Clone, PartialEq, Eq)]
pub enum Frame {
    /// Raw bytes, typically a chunk of PCM or encoded audio.
    Binary(Bytes),
    /// A UTF-8 message, typically a JSON control or transcript event.
    Text(String),
}

impl Frame {
    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        match self {
            Frame::Binary(data) => data.len(),
            Frame::Text(text) => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Binary(_) => "binary",
            Frame::Text(_) => "text",
        }
    }
}

impl From<Bytes> for Frame {
    fn from(data: Bytes) -> Self {
        Frame::Binary(data)
    }
}

impl From<Vec<u8>> for Frame {
    fn from(data: Vec<u8>) -> Self {
        Frame::Binary(Bytes::from(data))
    }
}

impl From<&'static [u8]> for Frame {
    fn from(data: &'static [u8]) -> Self {
        Frame::Binary(Bytes::from_static(data))
    }
}

impl From<String> for Frame {
    fn from(text: String) -> Self {
        Frame::Text(text)
    }
}

impl From<&str> for Frame {
    fn from(text: &str) -> Self {
        Frame::Text(text.to_string())
    }
}

// Audio payloads can be large; keep log lines readable.
impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Binary(data) => write!(f, "Frame::Binary({} bytes)", data.len()),
            Frame::Text(text) => write!(f, "Frame::Text({} bytes)", text.len()),
        }
    }
}
