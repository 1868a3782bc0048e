use async_trait::async_trait;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tokio::{net::TcpStream, time::timeout};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        self,
        client::IntoClientRequest,
        error::ProtocolError,
        http::{HeaderValue, header::AUTHORIZATION},
        protocol::{CloseFrame, Message, frame::coding::CloseCode},
    },
};
use tracing::{debug, info};
use voice_relay_core::{
    CloseReason, ConnectError, ConnectResult, Connection, Frame, FrameSink, FrameSource,
    ReceiveError, ReceiveResult, SendError, SendResult, UpstreamConnector,
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connects to one upstream streaming endpoint with a bearer credential.
///
/// Every call to [`connect`](Self::connect) opens a brand-new WebSocket, so a
/// single client can serve any number of independent sessions.
#[derive(Debug)]
pub struct UpstreamClient {
    url: String,
    credential: SecretString,
    connect_timeout: Duration,
}

impl UpstreamClient {
    pub fn new(url: impl Into<String>, credential: SecretString) -> Self {
        Self {
            url: url.into(),
            credential,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Performs the TCP/TLS and WebSocket handshakes.
    ///
    /// The credential travels as `Authorization: Bearer ...`. A 401 or 403
    /// answer is reported as [`ConnectError::Unauthorized`].
    pub async fn connect(&self) -> ConnectResult<Connection> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| ConnectError::InvalidRequest(e.to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.credential.expose_secret()))
            .map_err(|_| {
                ConnectError::InvalidRequest("credential is not a valid header value".to_string())
            })?;
        request.headers_mut().insert(AUTHORIZATION, bearer);
        // Logged instead of the full URL, whose query string may carry parameters.
        let peer = format!(
            "{}{}",
            request.uri().host().unwrap_or("upstream"),
            request.uri().path()
        );

        let (socket, response) = match timeout(self.connect_timeout, connect_async(request)).await
        {
            Ok(Ok(connected)) => connected,
            Ok(Err(e)) => return Err(handshake_error(e)),
            Err(_) => return Err(ConnectError::Timeout(self.connect_timeout)),
        };
        info!(%peer, status = %response.status(), "Connected to upstream voice API");

        let (sink, stream) = socket.split();
        Ok(Connection::new(
            peer,
            UpstreamSink {
                sink,
                closed: false,
            },
            UpstreamSource {
                stream,
                finished: false,
            },
        ))
    }
}

#[async_trait]
impl UpstreamConnector for UpstreamClient {
    async fn connect(&self) -> ConnectResult<Connection> {
        UpstreamClient::connect(self).await
    }
}

fn handshake_error(err: tungstenite::Error) -> ConnectError {
    match err {
        tungstenite::Error::Http(response) => {
            let status = response.status().as_u16();
            if status == 401 || status == 403 {
                ConnectError::Unauthorized(status)
            } else {
                ConnectError::Rejected(status)
            }
        }
        tungstenite::Error::Url(e) => ConnectError::InvalidRequest(e.to_string()),
        other => ConnectError::Handshake(other.to_string()),
    }
}

fn is_already_closed(err: &tungstenite::Error) -> bool {
    matches!(
        err,
        tungstenite::Error::ConnectionClosed
            | tungstenite::Error::AlreadyClosed
            | tungstenite::Error::Protocol(ProtocolError::SendAfterClosing)
    )
}

struct UpstreamSink {
    sink: SplitSink<Socket, Message>,
    closed: bool,
}

#[async_trait]
impl FrameSink for UpstreamSink {
    async fn send(&mut self, frame: Frame) -> SendResult {
        if self.closed {
            return Err(SendError::Closed);
        }
        let message = match frame {
            Frame::Binary(data) => Message::Binary(data),
            Frame::Text(text) => Message::Text(text.into()),
        };
        self.sink.send(message).await.map_err(|e| {
            if is_already_closed(&e) {
                SendError::Closed
            } else {
                SendError::Transport(e.to_string())
            }
        })
    }

    async fn close(&mut self, reason: CloseReason) -> SendResult {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let frame = CloseFrame {
            code: CloseCode::from(reason.code()),
            reason: reason.text().into(),
        };
        match self.sink.send(Message::Close(Some(frame))).await {
            Ok(()) => Ok(()),
            Err(e) if is_already_closed(&e) => Ok(()),
            Err(e) => Err(SendError::Transport(e.to_string())),
        }
    }
}

struct UpstreamSource {
    stream: SplitStream<Socket>,
    finished: bool,
}

#[async_trait]
impl FrameSource for UpstreamSource {
    async fn receive(&mut self) -> ReceiveResult<Option<Frame>> {
        while !self.finished {
            match self.stream.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(Some(Frame::Binary(data))),
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(Frame::Text(text.as_str().to_owned())));
                }
                Some(Ok(Message::Close(close_frame))) => {
                    debug!(?close_frame, "Upstream sent close frame");
                    self.finished = true;
                }
                // Pings are answered by tungstenite itself.
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                Some(Err(tungstenite::Error::ConnectionClosed)) | None => self.finished = true,
                // A reset is the network failing, not the peer misbehaving.
                Some(Err(
                    e @ tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake),
                )) => return Err(ReceiveError::Transport(e.to_string())),
                Some(Err(tungstenite::Error::Protocol(e))) => {
                    return Err(ReceiveError::Protocol(e.to_string()));
                }
                Some(Err(e)) => return Err(ReceiveError::Transport(e.to_string())),
            }
        }
        Ok(None)
    }
}
