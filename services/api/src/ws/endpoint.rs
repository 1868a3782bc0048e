//! Browser side of a relay session.

use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tracing::debug;
use voice_relay_core::{
    CloseReason, Connection, Frame, FrameSink, FrameSource, ReceiveError, ReceiveResult,
    SendError, SendResult,
};

/// Splits an upgraded browser socket into relay halves.
pub fn client_connection(socket: WebSocket, peer: impl Into<String>) -> Connection {
    let (sink, stream) = socket.split();
    Connection::new(
        peer,
        ClientSink {
            sink,
            closed: false,
        },
        ClientSource {
            stream,
            finished: false,
        },
    )
}

struct ClientSink {
    sink: SplitSink<WebSocket, Message>,
    closed: bool,
}

#[async_trait]
impl FrameSink for ClientSink {
    async fn send(&mut self, frame: Frame) -> SendResult {
        if self.closed {
            return Err(SendError::Closed);
        }
        let message = match frame {
            Frame::Binary(data) => Message::Binary(data),
            Frame::Text(text) => Message::Text(text.into()),
        };
        self.sink
            .send(message)
            .await
            .map_err(|e| SendError::Transport(e.to_string()))
    }

    async fn close(&mut self, reason: CloseReason) -> SendResult {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let frame = CloseFrame {
            code: reason.code(),
            reason: reason.text().into(),
        };
        // Fails when the browser already finished the closing handshake.
        if let Err(e) = self.sink.send(Message::Close(Some(frame))).await {
            debug!(error = %e, "Close frame not delivered to browser");
        }
        Ok(())
    }
}

struct ClientSource {
    stream: SplitStream<WebSocket>,
    finished: bool,
}

#[async_trait]
impl FrameSource for ClientSource {
    async fn receive(&mut self) -> ReceiveResult<Option<Frame>> {
        while !self.finished {
            match self.stream.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(Some(Frame::Binary(data))),
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(Frame::Text(text.as_str().to_owned())));
                }
                Some(Ok(Message::Close(close_frame))) => {
                    debug!(?close_frame, "Browser sent close frame");
                    self.finished = true;
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Err(e)) => return Err(ReceiveError::Transport(e.to_string())),
                None => self.finished = true,
            }
        }
        Ok(None)
    }
}
