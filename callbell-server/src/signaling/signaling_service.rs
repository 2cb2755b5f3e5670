use crate::config::ServerConfig;
use crate::error::SignalError;
use crate::hub::{Hub, HubCommand, HubObserver, HubStats};
use crate::signaling::polling::PollSessions;
use crate::transport::{Outbound, TransportKind};
use callbell_core::{ClientEvent, ConnectionId, ServerEvent};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

pub(crate) struct SignalingInner {
    pub(crate) config: ServerConfig,
    pub(crate) polls: PollSessions,
}

/// Дескриптор запущенного хаба. Клоны разделяют один и тот же хаб.
#[derive(Clone)]
pub struct SignalingService {
    pub(crate) inner: Arc<SignalingInner>,
    pub(crate) hub_tx: mpsc::Sender<HubCommand>,
}

impl SignalingService {
    /// Spawns the hub actor (and the idle-poll reaper) on the current runtime.
    pub fn spawn(config: ServerConfig, observer: Arc<dyn HubObserver>) -> Self {
        let (hub_tx, hub_rx) = mpsc::channel(config.command_buffer.max(1));
        let hub = Hub::new(
            config.switchboard_settings(),
            observer,
            hub_rx,
            config.sweep_interval(),
        );
        tokio::spawn(hub.run());

        info!("Signaling hub spawned for path '{}'", config.path);

        let service = Self {
            inner: Arc::new(SignalingInner {
                config,
                polls: PollSessions::new(),
            }),
            hub_tx,
        };
        PollSessions::spawn_reaper(&service);
        service
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Registers a new connection with the hub and returns its outbound queue.
    pub async fn connect(
        &self,
        kind: TransportKind,
    ) -> Result<(ConnectionId, mpsc::UnboundedReceiver<ServerEvent>), SignalError> {
        let connection_id = ConnectionId::new();
        let (outbound, rx) = Outbound::channel();
        self.send(HubCommand::Connect {
            connection_id,
            kind,
            outbound,
        })
        .await?;
        Ok((connection_id, rx))
    }

    pub async fn emit(&self, connection_id: ConnectionId, event: ClientEvent) -> Result<(), SignalError> {
        self.send(HubCommand::Event {
            connection_id,
            event,
        })
        .await
    }

    pub async fn disconnect(&self, connection_id: ConnectionId) -> Result<(), SignalError> {
        self.send(HubCommand::Disconnect { connection_id }).await
    }

    /// Snapshot taken after every command sent before this call.
    pub async fn stats(&self) -> Result<HubStats, SignalError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Stats { reply }).await?;
        rx.await.map_err(|_| SignalError::HubClosed)
    }

    pub fn same_instance(&self, other: &SignalingService) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    async fn send(&self, cmd: HubCommand) -> Result<(), SignalError> {
        self.hub_tx.send(cmd).await.map_err(|e| {
            error!("Hub died: {}", e);
            SignalError::HubClosed
        })
    }
}
