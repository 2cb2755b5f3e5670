use crate::error::SignalError;
use crate::signaling::SignalingService;
use crate::transport::TransportKind;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use callbell_core::{ClientEvent, ConnectionId, ServerEvent};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

struct PollSession {
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<ServerEvent>>>,
    last_seen: Instant,
}

/// Сессии HTTP long-polling, для которых нет постоянного сокета.
pub(crate) struct PollSessions {
    sessions: DashMap<ConnectionId, PollSession>,
}

enum PollOutcome {
    Events(Vec<ServerEvent>),
    Unknown,
    Closed,
}

impl PollSessions {
    pub(crate) fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    fn insert(&self, connection_id: ConnectionId, receiver: mpsc::UnboundedReceiver<ServerEvent>) {
        self.sessions.insert(
            connection_id,
            PollSession {
                receiver: Arc::new(Mutex::new(receiver)),
                last_seen: Instant::now(),
            },
        );
    }

    fn touch(&self, connection_id: &ConnectionId) -> Option<Arc<Mutex<mpsc::UnboundedReceiver<ServerEvent>>>> {
        let mut session = self.sessions.get_mut(connection_id)?;
        session.last_seen = Instant::now();
        Some(session.receiver.clone())
    }

    fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.sessions.contains_key(connection_id)
    }

    fn remove(&self, connection_id: &ConnectionId) -> bool {
        self.sessions.remove(connection_id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Sessions idle past the limit that nobody is currently polling.
    fn take_idle(&self, now: Instant, idle: Duration) -> Vec<ConnectionId> {
        let stale: Vec<ConnectionId> = self
            .sessions
            .iter()
            .filter(|entry| {
                now.saturating_duration_since(entry.last_seen) >= idle
                    && Arc::strong_count(&entry.receiver) == 1
            })
            .map(|entry| *entry.key())
            .collect();

        stale
            .into_iter()
            .filter(|id| self.sessions.remove(id).is_some())
            .collect()
    }

    /// Disconnects sessions that stopped polling. Exits once the service is gone.
    pub(crate) fn spawn_reaper(service: &SignalingService) {
        let inner = Arc::downgrade(&service.inner);
        let hub_tx = service.hub_tx.downgrade();
        let idle = service.config().poll_idle_timeout();

        tokio::spawn(async move {
            let mut tick = tokio::time::interval((idle / 2).max(Duration::from_millis(10)));
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tick.tick().await;
                let (Some(inner), Some(hub_tx)) = (inner.upgrade(), hub_tx.upgrade()) else {
                    break;
                };
                let service = SignalingService { inner, hub_tx };

                let idle_sessions = service.inner.polls.take_idle(Instant::now(), idle);
                if idle_sessions.is_empty() {
                    continue;
                }
                for connection_id in idle_sessions {
                    info!("Polling session {} went idle, disconnecting", connection_id);
                    if service.disconnect(connection_id).await.is_err() {
                        return;
                    }
                }
                debug!("{} polling sessions remain", service.inner.polls.len());
            }
            debug!("Poll reaper stopped");
        });
    }
}

impl SignalingService {
    pub async fn open_poll(&self) -> Result<ConnectionId, SignalError> {
        let (connection_id, rx) = self.connect(TransportKind::Polling).await?;
        self.inner.polls.insert(connection_id, rx);
        Ok(connection_id)
    }

    async fn poll(&self, connection_id: &ConnectionId) -> PollOutcome {
        let Some(receiver) = self.inner.polls.touch(connection_id) else {
            return PollOutcome::Unknown;
        };
        let limit = self.config().poll_batch_limit;
        let wait = self.config().poll_wait();

        let outcome = {
            let mut rx = receiver.lock().await;
            match tokio::time::timeout(wait, rx.recv()).await {
                Ok(Some(first)) => {
                    let mut batch = vec![first];
                    while batch.len() < limit {
                        match rx.try_recv() {
                            Ok(event) => batch.push(event),
                            Err(_) => break,
                        }
                    }
                    PollOutcome::Events(batch)
                }
                Ok(None) => PollOutcome::Closed,
                Err(_) => PollOutcome::Events(Vec::new()),
            }
        };

        drop(receiver);
        if matches!(outcome, PollOutcome::Closed) {
            self.inner.polls.remove(connection_id);
        } else {
            self.inner.polls.touch(connection_id);
        }
        outcome
    }

    pub async fn close_poll(&self, connection_id: ConnectionId) -> Result<bool, SignalError> {
        if !self.inner.polls.remove(&connection_id) {
            return Ok(false);
        }
        self.disconnect(connection_id).await?;
        Ok(true)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OpenedPoll {
    connection_id: ConnectionId,
}

fn hub_unavailable(e: SignalError) -> Response {
    warn!("Polling request failed: {}", e);
    StatusCode::SERVICE_UNAVAILABLE.into_response()
}

fn parse_id(raw: &str) -> Option<ConnectionId> {
    raw.parse().ok()
}

pub async fn open_poll(State(service): State<SignalingService>) -> Response {
    match service.open_poll().await {
        Ok(connection_id) => {
            info!("New polling session: {}", connection_id);
            (StatusCode::CREATED, Json(OpenedPoll { connection_id })).into_response()
        }
        Err(e) => hub_unavailable(e),
    }
}

pub async fn poll_events(
    Path(raw_id): Path<String>,
    State(service): State<SignalingService>,
) -> Response {
    let Some(connection_id) = parse_id(&raw_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match service.poll(&connection_id).await {
        PollOutcome::Events(events) => Json(events).into_response(),
        PollOutcome::Unknown | PollOutcome::Closed => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn push_event(
    Path(raw_id): Path<String>,
    State(service): State<SignalingService>,
    body: String,
) -> Response {
    let Some(connection_id) = parse_id(&raw_id).filter(|id| service.inner.polls.contains(id)) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let event = match ClientEvent::decode(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!("Invalid event from polling session {}: {}", connection_id, e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    service.inner.polls.touch(&connection_id);
    match service.emit(connection_id, event).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => hub_unavailable(e),
    }
}

pub async fn close_poll(
    Path(raw_id): Path<String>,
    State(service): State<SignalingService>,
) -> Response {
    let Some(connection_id) = parse_id(&raw_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match service.close_poll(connection_id).await {
        Ok(true) => {
            info!("Polling session {} closed by client", connection_id);
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => hub_unavailable(e),
    }
}
