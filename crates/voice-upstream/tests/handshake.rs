//! Upstream client tests against a local WebSocket server.

use futures_util::{SinkExt, StreamExt};
use secrecy::SecretString;
use std::future::Future;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{
    WebSocketStream, accept_hdr_async,
    tungstenite::{
        handshake::server::{ErrorResponse, Request, Response},
        http::StatusCode,
        protocol::Message,
    },
};
use voice_relay_core::{CloseReason, ConnectError, Frame, ReceiveError, SendError};
use voice_upstream::UpstreamClient;

const KEY: &str = "test-upstream-key";
const STEP: Duration = Duration::from_secs(2);

/// Serves one WebSocket connection that must present `KEY` as a bearer token.
async fn serve_once<F, Fut>(handler: F) -> String
where
    F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let check_bearer = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            let expected = format!("Bearer {}", KEY);
            match req.headers().get("authorization") {
                Some(value) if value.as_bytes() == expected.as_bytes() => Ok(resp),
                _ => {
                    let mut rejection = ErrorResponse::new(Some("bad credential".to_string()));
                    *rejection.status_mut() = StatusCode::UNAUTHORIZED;
                    Err(rejection)
                }
            }
        };
        if let Ok(socket) = accept_hdr_async(stream, check_bearer).await {
            handler(socket).await;
        }
    });
    format!("ws://{}/v1/streaming?language=en", addr)
}

fn client(url: &str, key: &str) -> UpstreamClient {
    UpstreamClient::new(url, SecretString::from(key.to_string()))
}

#[tokio::test]
async fn test_bearer_credential_and_frames_round_trip() {
    let url = serve_once(|mut socket| async move {
        while let Some(Ok(message)) = socket.next().await {
            match message {
                Message::Binary(_) | Message::Text(_) => socket.send(message).await.unwrap(),
                Message::Close(_) => break,
                _ => {}
            }
        }
    })
    .await;

    let connection = client(&url, KEY).connect().await.unwrap();
    assert!(connection.peer().starts_with("127.0.0.1/v1/streaming"));
    let (mut sink, mut source) = connection.into_parts();

    sink.send(Frame::from(vec![0x01, 0x02])).await.unwrap();
    sink.send(Frame::from(vec![0x03])).await.unwrap();
    sink.send(Frame::from("{\"type\":\"flush\"}")).await.unwrap();

    assert_eq!(source.receive().await, Ok(Some(Frame::from(vec![0x01, 0x02]))));
    assert_eq!(source.receive().await, Ok(Some(Frame::from(vec![0x03]))));
    assert_eq!(
        source.receive().await,
        Ok(Some(Frame::from("{\"type\":\"flush\"}")))
    );

    sink.close(CloseReason::Normal).await.unwrap();
    sink.close(CloseReason::Normal).await.unwrap();
    assert_eq!(sink.send(Frame::from("late")).await, Err(SendError::Closed));
}

#[tokio::test]
async fn test_wrong_credential_is_unauthorized() {
    let url = serve_once(|_socket| async {}).await;

    let err = client(&url, "not-the-key").connect().await.unwrap_err();
    assert!(matches!(err, ConnectError::Unauthorized(401)), "got {:?}", err);
}

#[tokio::test]
async fn test_invalid_url_is_rejected_before_dialing() {
    let err = client("not a url", KEY).connect().await.unwrap_err();
    assert!(matches!(err, ConnectError::InvalidRequest(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = tokio::spawn(async move {
        // Accept the TCP connection but never answer the upgrade.
        let (_stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let err = client(&format!("ws://{}/", addr), KEY)
        .with_connect_timeout(Duration::from_millis(100))
        .connect()
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectError::Timeout(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_close_frame_is_not_an_error() {
    let url = serve_once(|mut socket| async move {
        socket.send(Message::Binary(vec![0x07].into())).await.unwrap();
        socket.close(None).await.unwrap();
        // Drain until the client completes the closing handshake.
        while socket.next().await.is_some() {}
    })
    .await;

    let (_sink, mut source) = client(&url, KEY).connect().await.unwrap().into_parts();
    assert_eq!(source.receive().await, Ok(Some(Frame::from(vec![0x07]))));
    assert_eq!(timeout(STEP, source.receive()).await.unwrap(), Ok(None));
    assert_eq!(timeout(STEP, source.receive()).await.unwrap(), Ok(None));
}

#[tokio::test]
async fn test_dropped_socket_is_a_transport_error() {
    let url = serve_once(|socket| async move {
        // Drop the TCP stream without a closing handshake.
        drop(socket);
    })
    .await;

    let (_sink, mut source) = client(&url, KEY).connect().await.unwrap().into_parts();
    let result = timeout(STEP, source.receive()).await.unwrap();
    assert!(
        matches!(result, Err(ReceiveError::Transport(_))),
        "got {:?}",
        result
    );
}
