use callbell_core::{CallEndReason, CallId, CallState, UserId};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSettings {
    /// Сколько звонок может висеть в REQUESTED.
    pub call_timeout: Duration,
    /// Верхняя граница длительности принятого звонка.
    pub max_call_duration: Duration,
    /// Сколько хранить завершенные записи, чтобы поздние события были no-op.
    pub retention: Duration,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(45),
            max_call_duration: Duration::from_secs(4 * 60 * 60),
            retention: Duration::from_secs(120),
        }
    }
}

/// Запись звонка. Звонящий и вызываемый фиксируются при создании.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub call_id: CallId,
    pub caller: UserId,
    pub callee: UserId,
    pub state: CallState,
    pub created_at: Instant,
    pub updated_at: Instant,
}

impl CallRecord {
    pub fn is_participant(&self, user: &UserId) -> bool {
        self.caller == *user || self.callee == *user
    }

    /// The other side of the call, if `user` takes part in it.
    pub fn peer_of(&self, user: &UserId) -> Option<&UserId> {
        if self.caller == *user {
            Some(&self.callee)
        } else if self.callee == *user {
            Some(&self.caller)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCall(pub CallId);

/// A record the sweep moved to a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweptCall {
    pub record: CallRecord,
    pub reason: CallEndReason,
}

pub struct CallTable {
    calls: HashMap<CallId, CallRecord>,
    settings: CallSettings,
}

impl CallTable {
    pub fn new(settings: CallSettings) -> Self {
        Self {
            calls: HashMap::new(),
            settings,
        }
    }

    pub fn open(
        &mut self,
        call_id: CallId,
        caller: UserId,
        callee: UserId,
        now: Instant,
    ) -> Result<&CallRecord, DuplicateCall> {
        if self.calls.contains_key(&call_id) {
            return Err(DuplicateCall(call_id));
        }

        let record = CallRecord {
            call_id: call_id.clone(),
            caller,
            callee,
            state: CallState::Requested,
            created_at: now,
            updated_at: now,
        };
        Ok(self.calls.entry(call_id).or_insert(record))
    }

    pub fn get(&self, call_id: &CallId) -> Option<&CallRecord> {
        self.calls.get(call_id)
    }

    /// Moves the call to `next` only if it is currently in `expected`.
    pub fn transition(
        &mut self,
        call_id: &CallId,
        expected: CallState,
        next: CallState,
        now: Instant,
    ) -> Option<&CallRecord> {
        let record = self.calls.get_mut(call_id)?;
        if record.state != expected {
            return None;
        }
        record.state = next;
        record.updated_at = now;
        Some(record)
    }

    /// Ids of REQUESTED calls placed by `caller`.
    pub fn ringing_from(&self, caller: &UserId) -> Vec<CallId> {
        self.calls
            .values()
            .filter(|record| record.state == CallState::Requested && record.caller == *caller)
            .map(|record| record.call_id.clone())
            .collect()
    }

    /// Expires stale REQUESTED calls, ends over-long ACCEPTED calls and purges old terminal records.
    pub fn sweep(&mut self, now: Instant) -> Vec<SweptCall> {
        let settings = self.settings;
        let mut swept = Vec::new();

        self.calls.retain(|_, record| match record.state {
            CallState::Requested
                if now.saturating_duration_since(record.created_at) >= settings.call_timeout =>
            {
                record.state = CallState::Expired;
                record.updated_at = now;
                swept.push(SweptCall {
                    record: record.clone(),
                    reason: CallEndReason::Timeout,
                });
                true
            }
            CallState::Accepted
                if now.saturating_duration_since(record.updated_at)
                    >= settings.max_call_duration =>
            {
                record.state = CallState::Ended;
                record.updated_at = now;
                swept.push(SweptCall {
                    record: record.clone(),
                    reason: CallEndReason::MaxDuration,
                });
                true
            }
            state if state.is_terminal() => {
                now.saturating_duration_since(record.updated_at) < settings.retention
            }
            _ => true,
        });

        swept
    }

    pub fn live_count(&self) -> usize {
        self.calls
            .values()
            .filter(|record| !record.state.is_terminal())
            .count()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}
