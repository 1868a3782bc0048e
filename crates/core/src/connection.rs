//! Transport-agnostic duplex connection handles.
//!
//! Every transport (the browser-facing WebSocket, the upstream WebSocket, the
//! in-memory pair used in tests) is adapted into a [`FrameSink`] and a
//! [`FrameSource`]. Keeping the halves separate lets each relay direction own
//! exactly one writer, so no lock is needed to keep frames whole.

use crate::error::{ConnectResult, ReceiveResult, SendResult};
use crate::frame::Frame;
use async_trait::async_trait;
use std::fmt;

/// WebSocket close code for a normal closure.
pub const CLOSE_NORMAL: u16 = 1000;
/// WebSocket close code for an unexpected server-side condition.
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;
/// WebSocket close code for a gateway that could not reach its upstream.
pub const CLOSE_BAD_GATEWAY: u16 = 1014;

/// Why a connection is being closed by this side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    Normal,
    /// The session failed mid-stream.
    Error(String),
    /// The upstream connection could not be established.
    UpstreamUnavailable(String),
}

impl CloseReason {
    pub fn code(&self) -> u16 {
        match self {
            CloseReason::Normal => CLOSE_NORMAL,
            CloseReason::Error(_) => CLOSE_INTERNAL_ERROR,
            CloseReason::UpstreamUnavailable(_) => CLOSE_BAD_GATEWAY,
        }
    }

    /// Human-readable reason text for the close frame.
    ///
    /// WebSocket close reasons are limited to 123 bytes, so longer messages are
    /// cut at a character boundary.
    pub fn text(&self) -> String {
        let full = match self {
            CloseReason::Normal => return String::new(),
            CloseReason::Error(message) | CloseReason::UpstreamUnavailable(message) => message,
        };
        let mut end = full.len().min(123);
        while !full.is_char_boundary(end) {
            end -= 1;
        }
        full[..end].to_string()
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, CloseReason::Normal)
    }
}

/// The writing half of a duplex connection.
#[async_trait]
pub trait FrameSink: Send {
    /// Sends one frame. Each call delivers the whole frame or fails.
    async fn send(&mut self, frame: Frame) -> SendResult;

    /// Closes the connection. Calling it again after a close is a no-op.
    async fn close(&mut self, reason: CloseReason) -> SendResult;
}

/// The reading half of a duplex connection.
#[async_trait]
pub trait FrameSource: Send {
    /// Waits for the next frame.
    ///
    /// Returns `Ok(None)` once the peer has closed the connection gracefully.
    async fn receive(&mut self) -> ReceiveResult<Option<Frame>>;
}

/// One connected duplex channel, split into its two halves.
pub struct Connection {
    peer: String,
    sink: Box<dyn FrameSink>,
    source: Box<dyn FrameSource>,
}

impl Connection {
    pub fn new(
        peer: impl Into<String>,
        sink: impl FrameSink + 'static,
        source: impl FrameSource + 'static,
    ) -> Self {
        Self {
            peer: peer.into(),
            sink: Box::new(sink),
            source: Box::new(source),
        }
    }

    /// Description of the remote end, used in logs.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn sink_mut(&mut self) -> &mut dyn FrameSink {
        self.sink.as_mut()
    }

    pub fn source_mut(&mut self) -> &mut dyn FrameSource {
        self.source.as_mut()
    }

    pub fn into_parts(self) -> (Box<dyn FrameSink>, Box<dyn FrameSource>) {
        (self.sink, self.source)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").field("peer", &self.peer).finish()
    }
}

/// Opens a fresh upstream connection for one client session.
///
/// Implementations must never hand the same connection to two sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpstreamConnector: Send + Sync {
    async fn connect(&self) -> ConnectResult<Connection>;
}
