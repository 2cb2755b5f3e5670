use crate::hub::call_table::CallRecord;
use async_trait::async_trait;
use callbell_core::{ConnectionId, UserId};
use tracing::info;

/// Крючки для приложения: хаб сообщает о присутствии и переходах звонков.
///
/// Хаб вызывает их в своем цикле после обработки события, поэтому
/// долгая работа должна уходить в отдельную задачу. Долговременная
/// история звонков хранится здесь, а не в сигнальном слое.
#[async_trait]
pub trait HubObserver: Send + Sync + 'static {
    async fn on_announce(&self, connection_id: ConnectionId, user: UserId);

    async fn on_leave(&self, connection_id: ConnectionId, user: Option<UserId>);

    async fn on_call(&self, record: CallRecord);
}

/// Observer that only writes structured log lines.
pub struct TracingObserver;

#[async_trait]
impl HubObserver for TracingObserver {
    async fn on_announce(&self, connection_id: ConnectionId, user: UserId) {
        info!("User '{}' online via {}", user, connection_id);
    }

    async fn on_leave(&self, connection_id: ConnectionId, user: Option<UserId>) {
        match user {
            Some(user) => info!("Connection {} of '{}' closed", connection_id, user),
            None => info!("Anonymous connection {} closed", connection_id),
        }
    }

    async fn on_call(&self, record: CallRecord) {
        info!(
            "Call {} ({} -> {}) is now {}",
            record.call_id, record.caller, record.callee, record.state
        );
    }
}

/// Что хаб накопил за один шаг цикла для наблюдателя.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubNotice {
    Announced {
        connection_id: ConnectionId,
        user: UserId,
    },
    Left {
        connection_id: ConnectionId,
        user: Option<UserId>,
    },
    Call(CallRecord),
}

impl HubNotice {
    pub async fn dispatch(self, observer: &dyn HubObserver) {
        match self {
            Self::Announced {
                connection_id,
                user,
            } => observer.on_announce(connection_id, user).await,
            Self::Left {
                connection_id,
                user,
            } => observer.on_leave(connection_id, user).await,
            Self::Call(record) => observer.on_call(record).await,
        }
    }
}
