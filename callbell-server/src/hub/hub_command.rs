use crate::hub::switchboard::HubStats;
use crate::transport::{Outbound, TransportKind};
use callbell_core::{ClientEvent, ConnectionId};
use tokio::sync::oneshot;

/// Команды, поступающие в хаб от транспортов (WebSocket/HTTP polling).
///
/// Один канал на все команды: порядок событий одного соединения
/// сохраняется от транспорта до доставки.
#[derive(Debug)]
pub enum HubCommand {
    /// Новое соединение и очередь исходящих событий для него.
    Connect {
        connection_id: ConnectionId,
        kind: TransportKind,
        outbound: Outbound,
    },

    /// Разобранное событие от клиента.
    Event {
        connection_id: ConnectionId,
        event: ClientEvent,
    },

    /// Транспорт закрыт.
    Disconnect { connection_id: ConnectionId },

    /// Запрос снимка состояния. Отвечается после всех ранее принятых команд.
    Stats { reply: oneshot::Sender<HubStats> },
}
