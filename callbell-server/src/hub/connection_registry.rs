use crate::transport::{Outbound, TransportKind};
use callbell_core::{ConnectionId, ServerEvent, UserId};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

struct ConnectionEntry {
    outbound: Outbound,
    kind: TransportKind,
    user: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announce {
    Joined,
    AlreadyJoined,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnounceRefused {
    UnknownConnection,
    /// Соединение уже объявило другую идентичность.
    IdentityLocked(UserId),
}

/// Живые соединения и личные комнаты.
///
/// Инвариант: соединение, объявившее `U`, состоит ровно в комнате `U`;
/// пустые комнаты в таблице не хранятся.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    rooms: HashMap<UserId, BTreeSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connection_id: ConnectionId, kind: TransportKind, outbound: Outbound) {
        if let Some(previous) = self.connections.insert(
            connection_id,
            ConnectionEntry {
                outbound,
                kind,
                user: None,
            },
        ) {
            // Ids are server-generated, so this only happens on a transport bug.
            if let Some(user) = previous.user {
                self.leave_room(&user, &connection_id);
            }
        }
    }

    /// Removes the connection and its room membership. Returns the identity it had announced.
    pub fn unregister(&mut self, connection_id: &ConnectionId) -> Option<UserId> {
        let entry = self.connections.remove(connection_id)?;
        let user = entry.user?;
        self.leave_room(&user, connection_id);
        Some(user)
    }

    pub fn announce(
        &mut self,
        connection_id: &ConnectionId,
        user: UserId,
    ) -> Result<Announce, AnnounceRefused> {
        let entry = self
            .connections
            .get_mut(connection_id)
            .ok_or(AnnounceRefused::UnknownConnection)?;

        match &entry.user {
            Some(current) if *current == user => return Ok(Announce::AlreadyJoined),
            Some(current) => return Err(AnnounceRefused::IdentityLocked(current.clone())),
            None => {}
        }

        entry.user = Some(user.clone());
        self.rooms.entry(user).or_default().insert(*connection_id);
        Ok(Announce::Joined)
    }

    pub fn identity_of(&self, connection_id: &ConnectionId) -> Option<&UserId> {
        self.connections
            .get(connection_id)
            .and_then(|entry| entry.user.as_ref())
    }

    pub fn kind_of(&self, connection_id: &ConnectionId) -> Option<TransportKind> {
        self.connections.get(connection_id).map(|entry| entry.kind)
    }

    /// Fan-out to every live connection in room `user`. Returns how many queues accepted it.
    pub fn deliver_to_room(&self, user: &UserId, event: &ServerEvent) -> usize {
        let Some(members) = self.rooms.get(user) else {
            debug!("Room '{}' is empty, dropping {}", user, event.name());
            return 0;
        };

        members
            .iter()
            .filter_map(|id| self.connections.get(id))
            .filter(|entry| entry.outbound.deliver(event.clone()))
            .count()
    }

    pub fn deliver_to_connection(&self, connection_id: &ConnectionId, event: ServerEvent) -> bool {
        self.connections
            .get(connection_id)
            .is_some_and(|entry| entry.outbound.deliver(event))
    }

    pub fn room_size(&self, user: &UserId) -> usize {
        self.rooms.get(user).map_or(0, BTreeSet::len)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn announced_count(&self) -> usize {
        self.rooms.values().map(BTreeSet::len).sum()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn leave_room(&mut self, user: &UserId, connection_id: &ConnectionId) {
        let Some(members) = self.rooms.get_mut(user) else {
            return;
        };
        members.remove(connection_id);
        if members.is_empty() {
            self.rooms.remove(user);
        }
    }
}
