//! Frame-for-frame forwarding between a client connection and its upstream.
//!
//! A relay runs two pumps at once, client to upstream and upstream to client,
//! inside a single `select!`. The first pump to finish decides the outcome and
//! the other one is cancelled by being dropped, so a session never leaves a
//! task parked on a `receive()` that will never complete. Each sink is written
//! by exactly one pump.
//!
//! Backpressure is fully blocking: at most one frame per direction is in
//! flight, and a pump waits for its sink before reading the next frame. Every
//! send is bounded by the relay's send timeout.

use crate::connection::{CloseReason, Connection, FrameSink, FrameSource};
use crate::error::{Direction, RelayError, SendError};
use std::fmt;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

/// Default bound on a single send or close.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Close reason sent to both peers when the relay fails. Error details stay in
/// the logs.
pub const RELAY_FAILED_REASON: &str = "relay error";

/// One end of a relayed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Client,
    Upstream,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Client => write!(f, "client"),
            Side::Upstream => write!(f, "upstream"),
        }
    }
}

/// Counters for one forwarding direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionStats {
    pub frames: u64,
    pub bytes: u64,
}

impl DirectionStats {
    fn record(&mut self, len: usize) {
        self.frames += 1;
        self.bytes += len as u64;
    }
}

/// The result of a relay that ended with a graceful close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaySummary {
    /// The side whose close ended the relay.
    pub closed_by: Side,
    pub client_to_upstream: DirectionStats,
    pub upstream_to_client: DirectionStats,
}

/// Bidirectional relay settings.
#[derive(Debug, Clone, Copy)]
pub struct Relay {
    send_timeout: Duration,
}

impl Default for Relay {
    fn default() -> Self {
        Self::new(DEFAULT_SEND_TIMEOUT)
    }
}

impl Relay {
    pub fn new(send_timeout: Duration) -> Self {
        Self { send_timeout }
    }

    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    /// Forwards frames between `client` and `upstream` until one side closes
    /// or fails.
    ///
    /// On a graceful close the other side is closed normally and a summary is
    /// returned. On any transport error both sides are closed with an error
    /// reason and the error is returned. Both connections are closed before
    /// this returns, whatever the outcome.
    pub async fn run(
        &self,
        client: Connection,
        upstream: Connection,
    ) -> Result<RelaySummary, RelayError> {
        debug!(client = client.peer(), upstream = upstream.peer(), "Relay started");
        let (mut client_sink, mut client_source) = client.into_parts();
        let (mut upstream_sink, mut upstream_source) = upstream.into_parts();
        let mut uplink = DirectionStats::default();
        let mut downlink = DirectionStats::default();

        let ended = {
            let client_to_upstream = pump(
                Direction::ClientToUpstream,
                client_source.as_mut(),
                upstream_sink.as_mut(),
                self.send_timeout,
                &mut uplink,
            );
            let upstream_to_client = pump(
                Direction::UpstreamToClient,
                upstream_source.as_mut(),
                client_sink.as_mut(),
                self.send_timeout,
                &mut downlink,
            );
            tokio::select! {
                result = client_to_upstream => result.map(|()| Side::Client),
                result = upstream_to_client => result.map(|()| Side::Upstream),
            }
        };

        let reason = match &ended {
            Ok(side) => {
                debug!(%side, "Peer closed gracefully, closing the other side");
                CloseReason::Normal
            }
            Err(e) => {
                warn!(error = %e, "Relay failed, closing both sides");
                CloseReason::Error(RELAY_FAILED_REASON.to_string())
            }
        };
        tokio::join!(
            close_quietly(Side::Client, client_sink.as_mut(), reason.clone(), self.send_timeout),
            close_quietly(Side::Upstream, upstream_sink.as_mut(), reason, self.send_timeout),
        );

        ended.map(|closed_by| RelaySummary {
            closed_by,
            client_to_upstream: uplink,
            upstream_to_client: downlink,
        })
    }
}

/// Moves frames from `from` to `to` until `from` closes or either side fails.
async fn pump(
    direction: Direction,
    from: &mut dyn FrameSource,
    to: &mut dyn FrameSink,
    send_timeout: Duration,
    stats: &mut DirectionStats,
) -> Result<(), RelayError> {
    loop {
        let frame = match from.receive().await {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(()),
            Err(source) => return Err(RelayError::Receive { direction, source }),
        };
        let len = frame.len();
        trace!(%direction, kind = frame.kind(), len, "Forwarding frame");
        match timeout(send_timeout, to.send(frame)).await {
            Ok(Ok(())) => stats.record(len),
            Ok(Err(source)) => return Err(RelayError::Send { direction, source }),
            Err(_) => {
                return Err(RelayError::Send {
                    direction,
                    source: SendError::Timeout(send_timeout),
                });
            }
        }
    }
}

// Close failures are expected here: the side being closed may already be gone.
async fn close_quietly(
    side: Side,
    sink: &mut dyn FrameSink,
    reason: CloseReason,
    limit: Duration,
) {
    match timeout(limit, sink.close(reason)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(%side, error = %e, "Close was not delivered"),
        Err(_) => debug!(%side, "Close timed out"),
    }
}
