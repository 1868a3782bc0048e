//! Relay core for the voice gateway.
//!
//! Bridges one browser connection to one upstream voice-API connection and
//! forwards frames between them in both directions. Transports plug in through
//! the [`connection::FrameSink`] and [`connection::FrameSource`] traits.

pub mod chat;
pub mod connection;
pub mod error;
pub mod frame;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod relay;
pub mod session;
pub mod speech;

pub use connection::{CloseReason, Connection, FrameSink, FrameSource, UpstreamConnector};
pub use error::{
    ConnectError, ConnectResult, Direction, ReceiveError, ReceiveResult, RelayError, SendError,
    SendResult,
};
pub use frame::Frame;
pub use relay::{RELAY_FAILED_REASON, Relay, RelaySummary, Side};
pub use session::{SessionManager, SessionOutcome, SessionRecord, SessionReport, SessionState};
pub use speech::{SpeechAudio, SpeechSynthesizer};
