use callbell_core::ServerEvent;
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;

/// Способ, которым клиент подключен к шине.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    WebSocket,
    Polling,
    /// In-process connection opened through `SignalingService::connect`.
    Local,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::WebSocket => "websocket",
            Self::Polling => "polling",
            Self::Local => "local",
        };
        f.write_str(s)
    }
}

/// Очередь исходящих событий одного соединения.
///
/// Отправка никогда не блокирует хаб; порядок внутри очереди FIFO.
#[derive(Debug, Clone)]
pub struct Outbound {
    tx: mpsc::UnboundedSender<ServerEvent>,
}

impl Outbound {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Returns `false` when the transport side has already gone away.
    pub fn deliver(&self, event: ServerEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
