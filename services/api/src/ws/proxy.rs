//! Upgrade handler for the streaming proxy routes.

use super::endpoint::client_connection;
use crate::{config::StreamRoute, state::AppState};
use axum::{
    extract::{
        Path, State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use voice_relay_core::{SessionOutcome, UpstreamConnector};

/// Axum handler to upgrade `/api/streaming/{route}` to a WebSocket.
///
/// Unknown routes answer 404 without upgrading.
pub async fn stream_handler(
    ws: WebSocketUpgrade,
    Path(route): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some((route, connector)) = route
        .parse::<StreamRoute>()
        .ok()
        .and_then(|route| state.upstream(route).map(|connector| (route, connector)))
    else {
        return StatusCode::NOT_FOUND.into_response();
    };
    ws.on_upgrade(move |socket| handle_socket(socket, route, connector, state))
}

/// Runs one browser connection as a relay session.
#[instrument(name = "ws_client", skip_all, fields(route = %route))]
async fn handle_socket(
    socket: WebSocket,
    route: StreamRoute,
    connector: Arc<dyn UpstreamConnector>,
    state: Arc<AppState>,
) {
    info!("Browser connected. Opening upstream connection...");
    let client = client_connection(socket, format!("browser/{}", route));
    let report = state
        .sessions
        .run(route.as_str(), connector.as_ref(), client)
        .await;

    match report.outcome {
        SessionOutcome::Completed(_) => {
            info!(session_id = %report.record.id, "Browser session finished.")
        }
        SessionOutcome::Failed(e) => {
            warn!(session_id = %report.record.id, error = %e, "Browser session failed.")
        }
        SessionOutcome::UpstreamUnavailable(e) => {
            warn!(session_id = %report.record.id, error = %e, "Browser session rejected: upstream unavailable.")
        }
    }
}
