use crate::hub::call_table::{CallRecord, CallSettings, CallTable, SweptCall};
use crate::hub::connection_registry::{Announce, AnnounceRefused, ConnectionRegistry};
use crate::hub::hub_observer::HubNotice;
use crate::transport::{Outbound, TransportKind};
use callbell_core::{
    CallAccepted, CallCancelled, CallEndReason, CallEnded, CallId, CallRef, CallReject, CallRejected,
    CallRequest, CallState, ClientEvent, ConnectionId, ErrorCode, PresenceQuery, PresenceState,
    ServerEvent, UserId, UserPresence,
};
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchboardSettings {
    pub calls: CallSettings,
    pub max_identity_len: usize,
    pub max_call_id_len: usize,
    pub max_presence_query: usize,
}

impl Default for SwitchboardSettings {
    fn default() -> Self {
        Self {
            calls: CallSettings::default(),
            max_identity_len: 256,
            max_call_id_len: 128,
            max_presence_query: 64,
        }
    }
}

/// Снимок состояния хаба для `/healthz` и тестов.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStats {
    pub connections: usize,
    pub announced: usize,
    pub rooms: usize,
    pub live_calls: usize,
    pub tracked_calls: usize,
    pub relayed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelayKind {
    Offer,
    Answer,
    Candidate,
}

/// Все состояние сигнального ядра: реестр, комнаты, звонки, ретрансляция.
///
/// Методы синхронные и не ждут ничего внешнего; сериализацию доступа
/// обеспечивает цикл `Hub`, которому принадлежит коммутатор.
pub struct Switchboard {
    registry: ConnectionRegistry,
    calls: CallTable,
    settings: SwitchboardSettings,
    notices: Vec<HubNotice>,
    relayed: u64,
}

impl Switchboard {
    pub fn new(settings: SwitchboardSettings) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            calls: CallTable::new(settings.calls),
            settings,
            notices: Vec::new(),
            relayed: 0,
        }
    }

    pub fn connect(&mut self, connection_id: ConnectionId, kind: TransportKind, outbound: Outbound) {
        debug!("Connection {} opened over {}", connection_id, kind);
        self.registry.register(connection_id, kind, outbound);
    }

    pub fn disconnect(&mut self, connection_id: ConnectionId, now: Instant) {
        let kind = self.registry.kind_of(&connection_id);
        let user = self.registry.unregister(&connection_id);
        if kind.is_none() {
            return;
        }
        debug!(
            "Connection {} closed, left room {:?}",
            connection_id,
            user.as_ref().map(UserId::as_str)
        );
        self.notices.push(HubNotice::Left {
            connection_id,
            user: user.clone(),
        });

        if let Some(user) = user.filter(|user| self.registry.room_size(user) == 0) {
            self.cancel_abandoned(&user, now);
        }
    }

    /// The caller has no live connection left: nobody could take the accept.
    fn cancel_abandoned(&mut self, caller: &UserId, now: Instant) {
        for call_id in self.calls.ringing_from(caller) {
            let Some(record) = self
                .calls
                .transition(&call_id, CallState::Requested, CallState::Cancelled, now)
                .cloned()
            else {
                continue;
            };
            self.registry.deliver_to_room(
                &record.callee,
                &ServerEvent::CallCancelled(CallCancelled {
                    call_id: record.call_id.clone(),
                    reason: Some(CallEndReason::CallerLeft),
                }),
            );
            info!("Call {} cancelled, '{}' went offline", record.call_id, caller);
            self.notices.push(HubNotice::Call(record));
        }
    }

    pub fn handle(&mut self, from: ConnectionId, event: ClientEvent, now: Instant) {
        match event {
            ClientEvent::JoinRoom(raw) => self.announce(from, raw),
            ClientEvent::CallRequest(request) => self.request_call(from, request, now),
            ClientEvent::CallAccept(accept) => self.accept_call(from, accept, now),
            ClientEvent::CallReject(reject) => self.reject_call(from, reject, now),
            ClientEvent::CallCancel(call) => self.cancel_call(from, call, now),
            ClientEvent::CallEnd(call) => self.end_call(from, call, now),
            ClientEvent::PresenceQuery(query) => self.presence(from, query),
            ClientEvent::Offer(payload) => self.relay(from, RelayKind::Offer, payload),
            ClientEvent::Answer(payload) => self.relay(from, RelayKind::Answer, payload),
            ClientEvent::Candidate(payload) => self.relay(from, RelayKind::Candidate, payload),
        }
    }

    pub fn sweep(&mut self, now: Instant) {
        for SweptCall { record, reason } in self.calls.sweep(now) {
            info!(
                "Call {} swept to {} ({:?})",
                record.call_id, record.state, reason
            );
            match record.state {
                CallState::Expired => {
                    self.registry.deliver_to_room(
                        &record.caller,
                        &ServerEvent::CallRejected(CallRejected {
                            call_id: record.call_id.clone(),
                            reason: Some(reason),
                        }),
                    );
                    self.registry.deliver_to_room(
                        &record.callee,
                        &ServerEvent::CallCancelled(CallCancelled {
                            call_id: record.call_id.clone(),
                            reason: Some(reason),
                        }),
                    );
                }
                _ => {
                    let ended = ServerEvent::CallEnded(CallEnded {
                        call_id: record.call_id.clone(),
                        ended_by: None,
                        reason: Some(reason),
                    });
                    self.registry.deliver_to_room(&record.caller, &ended);
                    self.registry.deliver_to_room(&record.callee, &ended);
                }
            }
            self.notices.push(HubNotice::Call(record));
        }
    }

    pub fn drain_notices(&mut self) -> Vec<HubNotice> {
        std::mem::take(&mut self.notices)
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            connections: self.registry.connection_count(),
            announced: self.registry.announced_count(),
            rooms: self.registry.room_count(),
            live_calls: self.calls.live_count(),
            tracked_calls: self.calls.len(),
            relayed: self.relayed,
        }
    }

    pub fn call(&self, call_id: &CallId) -> Option<&CallRecord> {
        self.calls.get(call_id)
    }

    fn announce(&mut self, from: ConnectionId, raw: Option<String>) {
        let Some(raw) = raw else {
            self.refuse(from, ErrorCode::InvalidIdentity, "join-room expects a user id string");
            return;
        };
        let user = match UserId::parse(&raw, self.settings.max_identity_len) {
            Ok(user) => user,
            Err(e) => {
                self.refuse(from, ErrorCode::InvalidIdentity, e.to_string());
                return;
            }
        };

        match self.registry.announce(&from, user.clone()) {
            Ok(Announce::Joined) => {
                info!("Connection {} joined room '{}'", from, user);
                self.notices.push(HubNotice::Announced {
                    connection_id: from,
                    user,
                });
            }
            Ok(Announce::AlreadyJoined) => {
                debug!("Connection {} re-announced '{}'", from, user);
            }
            Err(AnnounceRefused::IdentityLocked(current)) => {
                self.refuse(
                    from,
                    ErrorCode::IdentityLocked,
                    format!("connection is already announced as '{current}'"),
                );
            }
            Err(AnnounceRefused::UnknownConnection) => {
                warn!("join-room from unregistered connection {}", from);
            }
        }
    }

    fn request_call(&mut self, from: ConnectionId, request: CallRequest, now: Instant) {
        let Some(sender) = self.registry.identity_of(&from).cloned() else {
            self.refuse(from, ErrorCode::NotAnnounced, "announce an identity before calling");
            return;
        };
        if sender != request.caller_id {
            self.refuse(
                from,
                ErrorCode::NotAParticipant,
                "callerId does not match the announced identity",
            );
            return;
        }
        if let Err(e) = request.call_id.validate(self.settings.max_call_id_len) {
            self.refuse(from, ErrorCode::InvalidCall, e.to_string());
            return;
        }
        if request.callee_id.is_blank() || request.callee_id == request.caller_id {
            self.refuse(from, ErrorCode::InvalidCall, "calleeId must name another user");
            return;
        }

        let opened = self
            .calls
            .open(
                request.call_id.clone(),
                request.caller_id.clone(),
                request.callee_id.clone(),
                now,
            )
            .cloned();
        let record = match opened {
            Ok(record) => record,
            Err(duplicate) => {
                self.refuse(
                    from,
                    ErrorCode::DuplicateCall,
                    format!("call '{}' already exists", duplicate.0),
                );
                return;
            }
        };

        let callee = request.callee_id.clone();
        let delivered = self
            .registry
            .deliver_to_room(&callee, &ServerEvent::CallIncoming(request));
        info!(
            "Call {} requested by '{}' for '{}' ({} connections reached)",
            record.call_id, record.caller, record.callee, delivered
        );
        self.notices.push(HubNotice::Call(record));
    }

    fn accept_call(&mut self, from: ConnectionId, accept: CallRequest, now: Instant) {
        let Some(record) = self.calls.get(&accept.call_id) else {
            debug!("Accept for unknown call {} ignored", accept.call_id);
            return;
        };
        let pinned = record.caller == accept.caller_id && record.callee == accept.callee_id;
        if !pinned || self.registry.identity_of(&from) != Some(&record.callee) {
            warn!("Connection {} tried to accept call {} it is not the callee of", from, accept.call_id);
            self.refuse(from, ErrorCode::NotAParticipant, "only the callee may accept");
            return;
        }

        let Some(record) = self
            .calls
            .transition(&accept.call_id, CallState::Requested, CallState::Accepted, now)
            .cloned()
        else {
            debug!("Accept for call {} is stale, ignored", accept.call_id);
            return;
        };

        self.registry.deliver_to_room(
            &record.caller,
            &ServerEvent::CallAccepted(CallAccepted {
                call_id: record.call_id.clone(),
                callee_id: record.callee.clone(),
            }),
        );
        info!("Call {} accepted by '{}'", record.call_id, record.callee);
        self.notices.push(HubNotice::Call(record));
    }

    fn reject_call(&mut self, from: ConnectionId, reject: CallReject, now: Instant) {
        let Some(record) = self.calls.get(&reject.call_id) else {
            debug!("Reject for unknown call {} ignored", reject.call_id);
            return;
        };
        if record.caller != reject.caller_id
            || self.registry.identity_of(&from) != Some(&record.callee)
        {
            warn!("Connection {} tried to reject call {} it is not the callee of", from, reject.call_id);
            self.refuse(from, ErrorCode::NotAParticipant, "only the callee may reject");
            return;
        }

        let Some(record) = self
            .calls
            .transition(&reject.call_id, CallState::Requested, CallState::Rejected, now)
            .cloned()
        else {
            debug!("Reject for call {} is stale, ignored", reject.call_id);
            return;
        };

        self.registry.deliver_to_room(
            &record.caller,
            &ServerEvent::CallRejected(CallRejected {
                call_id: record.call_id.clone(),
                reason: None,
            }),
        );
        info!("Call {} rejected by '{}'", record.call_id, record.callee);
        self.notices.push(HubNotice::Call(record));
    }

    fn cancel_call(&mut self, from: ConnectionId, call: CallRef, now: Instant) {
        let Some(record) = self.calls.get(&call.call_id) else {
            debug!("Cancel for unknown call {} ignored", call.call_id);
            return;
        };
        if self.registry.identity_of(&from) != Some(&record.caller) {
            self.refuse(from, ErrorCode::NotAParticipant, "only the caller may cancel");
            return;
        }

        let Some(record) = self
            .calls
            .transition(&call.call_id, CallState::Requested, CallState::Cancelled, now)
            .cloned()
        else {
            debug!("Cancel for call {} is stale, ignored", call.call_id);
            return;
        };

        self.registry.deliver_to_room(
            &record.callee,
            &ServerEvent::CallCancelled(CallCancelled {
                call_id: record.call_id.clone(),
                reason: None,
            }),
        );
        info!("Call {} cancelled by '{}'", record.call_id, record.caller);
        self.notices.push(HubNotice::Call(record));
    }

    fn end_call(&mut self, from: ConnectionId, call: CallRef, now: Instant) {
        let Some(record) = self.calls.get(&call.call_id) else {
            debug!("End for unknown call {} ignored", call.call_id);
            return;
        };
        let Some(by) = self
            .registry
            .identity_of(&from)
            .filter(|user| record.is_participant(user))
            .cloned()
        else {
            self.refuse(from, ErrorCode::NotAParticipant, "only a participant may end the call");
            return;
        };

        let Some(record) = self
            .calls
            .transition(&call.call_id, CallState::Accepted, CallState::Ended, now)
            .cloned()
        else {
            debug!("End for call {} is stale, ignored", call.call_id);
            return;
        };

        if let Some(peer) = record.peer_of(&by) {
            self.registry.deliver_to_room(
                peer,
                &ServerEvent::CallEnded(CallEnded {
                    call_id: record.call_id.clone(),
                    ended_by: Some(by.clone()),
                    reason: None,
                }),
            );
        }
        info!("Call {} ended by '{}'", record.call_id, by);
        self.notices.push(HubNotice::Call(record));
    }

    fn presence(&mut self, from: ConnectionId, query: PresenceQuery) {
        let limit = self.settings.max_presence_query;
        if query.user_ids.len() > limit {
            warn!(
                "Presence query from {} asks for {} users, answering the first {}",
                from,
                query.user_ids.len(),
                limit
            );
        }

        let users = query
            .user_ids
            .into_iter()
            .take(limit)
            .map(|user_id| {
                let connections = self.registry.room_size(&user_id);
                UserPresence {
                    user_id,
                    online: connections > 0,
                    connections,
                }
            })
            .collect();

        self.registry
            .deliver_to_connection(&from, ServerEvent::PresenceState(PresenceState { users }));
    }

    fn relay(&mut self, from: ConnectionId, kind: RelayKind, payload: Value) {
        let Some(to) = payload
            .get("to")
            .and_then(Value::as_str)
            .filter(|to| !to.is_empty())
            .map(UserId::from)
        else {
            warn!("Dropping {:?} from {}: payload has no 'to'", kind, from);
            return;
        };

        let event = match kind {
            RelayKind::Offer => ServerEvent::Offer(payload),
            RelayKind::Answer => ServerEvent::Answer(payload),
            RelayKind::Candidate => ServerEvent::Candidate(payload),
        };
        let delivered = self.registry.deliver_to_room(&to, &event);
        self.relayed += 1;
        debug!(
            "Relayed {} from {} to '{}' ({} connections)",
            event.name(),
            from,
            to,
            delivered
        );
    }

    fn refuse(&self, to: ConnectionId, code: ErrorCode, message: impl Into<String>) {
        let message = message.into();
        debug!("Refusing event from {}: {:?} {}", to, code, message);
        self.registry
            .deliver_to_connection(&to, ServerEvent::error(code, message));
    }
}
