//! Error taxonomy for connecting, sending and receiving.
//!
//! A graceful close is not an error: sources report it as `Ok(None)`.

use std::fmt;
use std::time::Duration;

pub type ConnectResult<T> = Result<T, ConnectError>;
pub type SendResult<T = ()> = Result<T, SendError>;
pub type ReceiveResult<T> = Result<T, ReceiveError>;

/// Failure to establish an upstream connection. Never retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Invalid upstream request: {0}")]
    InvalidRequest(String),
    #[error("Upstream rejected the credential (HTTP {0})")]
    Unauthorized(u16),
    #[error("Upstream rejected the handshake (HTTP {0})")]
    Rejected(u16),
    #[error("Upstream handshake timed out after {0:?}")]
    Timeout(Duration),
    #[error("Upstream handshake failed: {0}")]
    Handshake(String),
}

/// Failure to deliver a frame or close notification.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("Connection is closed")]
    Closed,
    #[error("Send did not complete within {0:?}")]
    Timeout(Duration),
    #[error("Transport error while sending: {0}")]
    Transport(String),
}

/// Failure while waiting for the next frame.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ReceiveError {
    #[error("Protocol violation: {0}")]
    Protocol(String),
    #[error("Transport error while receiving: {0}")]
    Transport(String),
}

/// The two forwarding directions of a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToUpstream,
    UpstreamToClient,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ClientToUpstream => write!(f, "client->upstream"),
            Direction::UpstreamToClient => write!(f, "upstream->client"),
        }
    }
}

/// A transport failure that terminated a relay, tagged with where it happened.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("{direction}: receive failed: {source}")]
    Receive {
        direction: Direction,
        #[source]
        source: ReceiveError,
    },
    #[error("{direction}: send failed: {source}")]
    Send {
        direction: Direction,
        #[source]
        source: SendError,
    },
}

impl RelayError {
    pub fn direction(&self) -> Direction {
        match self {
            RelayError::Receive { direction, .. } | RelayError::Send { direction, .. } => {
                *direction
            }
        }
    }
}
