//! Session lifecycle: one fresh upstream connection and one relay per client.

use crate::connection::{CloseReason, Connection, UpstreamConnector};
use crate::error::{ConnectError, RelayError};
use crate::relay::{Relay, RelaySummary};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Closing,
    Closed,
}

/// Registry entry for one client session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub id: Uuid,
    /// Name of the stream route the client connected to.
    pub route: String,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
}

/// How a session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// One side closed gracefully.
    Completed(RelaySummary),
    /// A transport error ended the relay.
    Failed(RelayError),
    /// No upstream connection could be opened; the relay never started.
    UpstreamUnavailable(ConnectError),
}

#[derive(Debug)]
pub struct SessionReport {
    /// The session's final record, in the `Closed` state.
    pub record: SessionRecord,
    pub outcome: SessionOutcome,
}

/// Accepts client connections, pairs each one with its own upstream
/// connection and relays between them.
///
/// Sessions are independent: one failing never touches another. Cloning the
/// manager shares its registry.
#[derive(Clone, Default)]
pub struct SessionManager {
    sessions: Arc<DashMap<Uuid, SessionRecord>>,
    relay: Relay,
}

impl SessionManager {
    pub fn new(relay: Relay) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            relay,
        }
    }

    /// Number of sessions that have not yet finished.
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    /// Live sessions, oldest first.
    pub fn snapshot(&self) -> Vec<SessionRecord> {
        let mut records: Vec<SessionRecord> = self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| record.created_at);
        records
    }

    /// Runs one session to completion.
    ///
    /// Opens an upstream connection through `connector`, relays until either
    /// side closes or fails, and guarantees both connections are closed and
    /// the session is deregistered on every exit path, including when the
    /// returned future is dropped.
    pub async fn run(
        &self,
        route: &str,
        connector: &dyn UpstreamConnector,
        client: Connection,
    ) -> SessionReport {
        let registration = self.register(route);
        let span = info_span!("relay_session", session_id = %registration.record.id, route);
        let outcome = self
            .drive(&registration, connector, client)
            .instrument(span)
            .await;
        SessionReport {
            record: registration.finish(),
            outcome,
        }
    }

    fn register(&self, route: &str) -> Registration {
        let record = SessionRecord {
            id: Uuid::new_v4(),
            route: route.to_string(),
            state: SessionState::Active,
            created_at: Utc::now(),
        };
        self.sessions.insert(record.id, record.clone());
        Registration {
            record,
            sessions: self.sessions.clone(),
        }
    }

    async fn drive(
        &self,
        registration: &Registration,
        connector: &dyn UpstreamConnector,
        mut client: Connection,
    ) -> SessionOutcome {
        info!(client = client.peer(), "Session opened, connecting upstream");
        let upstream = match connector.connect().await {
            Ok(upstream) => upstream,
            Err(e) => {
                error!(error = %e, "Upstream connection failed, closing client");
                registration.set_state(SessionState::Closing);
                let reason = CloseReason::UpstreamUnavailable(e.to_string());
                match timeout(self.relay.send_timeout(), client.sink_mut().close(reason)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(close_err)) => debug!(error = %close_err, "Client close was not delivered"),
                    Err(_) => debug!("Client close timed out"),
                }
                return SessionOutcome::UpstreamUnavailable(e);
            }
        };

        info!(upstream = upstream.peer(), "Upstream connected, relaying");
        let result = self.relay.run(client, upstream).await;
        registration.set_state(SessionState::Closing);
        match result {
            Ok(summary) => {
                info!(
                    closed_by = %summary.closed_by,
                    uplink_frames = summary.client_to_upstream.frames,
                    uplink_bytes = summary.client_to_upstream.bytes,
                    downlink_frames = summary.upstream_to_client.frames,
                    downlink_bytes = summary.upstream_to_client.bytes,
                    "Session completed"
                );
                SessionOutcome::Completed(summary)
            }
            Err(e) => {
                warn!(error = %e, "Session terminated with error");
                SessionOutcome::Failed(e)
            }
        }
    }
}

/// Keeps a session in the registry for exactly as long as it runs.
struct Registration {
    record: SessionRecord,
    sessions: Arc<DashMap<Uuid, SessionRecord>>,
}

impl Registration {
    fn set_state(&self, state: SessionState) {
        if let Some(mut record) = self.sessions.get_mut(&self.record.id) {
            record.state = state;
        }
    }

    fn finish(self) -> SessionRecord {
        let mut record = self
            .sessions
            .remove(&self.record.id)
            .map(|(_, record)| record)
            .unwrap_or_else(|| self.record.clone());
        record.state = SessionState::Closed;
        record
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.sessions.remove(&self.record.id);
    }
}
