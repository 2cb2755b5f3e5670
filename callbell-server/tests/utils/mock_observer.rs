use async_trait::async_trait;
use callbell_core::{CallId, CallState, ConnectionId, UserId};
use callbell_server::HubObserver;
use callbell_server::hub::CallRecord;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Callbacks recorded by RecordingObserver, in the order the hub made them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverEvent {
    /// A connection joined a personal room.
    Announce {
        connection_id: ConnectionId,
        user: UserId,
    },
    /// A connection went away.
    Leave {
        connection_id: ConnectionId,
        user: Option<UserId>,
    },
    /// A call record changed state.
    Call { call_id: CallId, state: CallState },
}

/// A HubObserver that records every callback.
#[derive(Clone)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ObserverEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get all recorded events (convenience method).
    pub async fn get_events(&self) -> Vec<ObserverEvent> {
        self.events.lock().await.clone()
    }

    /// Wait for a specific number of events with timeout.
    pub async fn wait_for_events(&self, count: usize, timeout_ms: u64) -> bool {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        loop {
            if self.events.lock().await.len() >= count {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }
}

impl Default for RecordingObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HubObserver for RecordingObserver {
    async fn on_announce(&self, connection_id: ConnectionId, user: UserId) {
        self.events.lock().await.push(ObserverEvent::Announce {
            connection_id,
            user,
        });
    }

    async fn on_leave(&self, connection_id: ConnectionId, user: Option<UserId>) {
        self.events.lock().await.push(ObserverEvent::Leave {
            connection_id,
            user,
        });
    }

    async fn on_call(&self, record: CallRecord) {
        self.events.lock().await.push(ObserverEvent::Call {
            call_id: record.call_id,
            state: record.state,
        });
    }
}
