//! An in-process duplex transport built on bounded tokio channels.
//!
//! [`pair`] returns a [`Connection`] that can be handed to a relay together
//! with a [`MemoryPeer`] that plays the remote end: it injects frames, closes
//! or breaks the connection, and observes everything the connection sends.

use crate::connection::{CloseReason, Connection, FrameSink, FrameSource};
use crate::error::{ReceiveError, ReceiveResult, SendError, SendResult};
use crate::frame::Frame;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Traffic from the peer into the connection.
#[derive(Debug)]
enum Inbound {
    Frame(Frame),
    Close,
    Fail(String),
}

/// What the peer observes from the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    Frame(Frame),
    Closed(CloseReason),
}

/// Creates a connected in-memory pair.
///
/// `capacity` bounds each direction; once the peer stops draining, sends on
/// the connection suspend, just like a socket whose write buffer is full.
pub fn pair(peer: impl Into<String>, capacity: usize) -> (Connection, MemoryPeer) {
    let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
    let (outbound_tx, outbound_rx) = mpsc::channel(capacity);
    let connection = Connection::new(
        peer,
        MemorySink {
            tx: outbound_tx,
            closed: false,
        },
        MemorySource {
            rx: inbound_rx,
            finished: false,
        },
    );
    let peer = MemoryPeer {
        tx: inbound_tx,
        rx: outbound_rx,
    };
    (connection, peer)
}

struct MemorySink {
    tx: mpsc::Sender<PeerEvent>,
    closed: bool,
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send(&mut self, frame: Frame) -> SendResult {
        if self.closed {
            return Err(SendError::Closed);
        }
        self.tx
            .send(PeerEvent::Frame(frame))
            .await
            .map_err(|_| SendError::Closed)
    }

    async fn close(&mut self, reason: CloseReason) -> SendResult {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.tx
            .send(PeerEvent::Closed(reason))
            .await
            .map_err(|_| SendError::Closed)
    }
}

struct MemorySource {
    rx: mpsc::Receiver<Inbound>,
    finished: bool,
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn receive(&mut self) -> ReceiveResult<Option<Frame>> {
        if self.finished {
            return Ok(None);
        }
        match self.rx.recv().await {
            Some(Inbound::Frame(frame)) => Ok(Some(frame)),
            Some(Inbound::Close) => {
                self.finished = true;
                Ok(None)
            }
            Some(Inbound::Fail(message)) => Err(ReceiveError::Transport(message)),
            // The peer vanished without a close; that is an abrupt disconnect.
            None => Err(ReceiveError::Transport(
                "peer dropped without closing".to_string(),
            )),
        }
    }
}

/// The remote end of an in-memory connection.
#[derive(Debug)]
pub struct MemoryPeer {
    tx: mpsc::Sender<Inbound>,
    rx: mpsc::Receiver<PeerEvent>,
}

impl MemoryPeer {
    /// Delivers a frame to the connection's source.
    pub async fn send(&self, frame: impl Into<Frame>) -> SendResult {
        self.tx
            .send(Inbound::Frame(frame.into()))
            .await
            .map_err(|_| SendError::Closed)
    }

    /// Closes gracefully; the connection's source yields `Ok(None)`.
    pub async fn close(&self) -> SendResult {
        self.tx
            .send(Inbound::Close)
            .await
            .map_err(|_| SendError::Closed)
    }

    /// Breaks the connection; the connection's source yields a transport error.
    pub async fn fail(&self, message: impl Into<String>) -> SendResult {
        self.tx
            .send(Inbound::Fail(message.into()))
            .await
            .map_err(|_| SendError::Closed)
    }

    /// Stops accepting traffic; later sends on the connection fail with
    /// [`SendError::Closed`].
    pub fn stop_reading(&mut self) {
        self.rx.close();
    }

    /// Next frame or close notification sent by the connection.
    ///
    /// Returns `None` once the connection's sink has been dropped.
    pub async fn recv(&mut self) -> Option<PeerEvent> {
        self.rx.recv().await
    }
}
