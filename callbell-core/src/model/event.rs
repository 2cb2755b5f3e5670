use crate::model::error::DecodeError;
use crate::model::payload::{
    CallAccepted, CallCancelled, CallEnded, CallRef, CallReject, CallRejected, CallRequest,
    ErrorCode, ErrorPayload, PresenceQuery, PresenceState,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// События от клиента к серверу.
///
/// Кадр на проводе: `{"event": "<name>", "data": <payload>}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Объявление идентичности. `None`, если клиент прислал не строку.
    #[serde(rename = "join-room")]
    JoinRoom(Option<String>),

    #[serde(rename = "call:request")]
    CallRequest(CallRequest),

    #[serde(rename = "call:accept")]
    CallAccept(CallRequest),

    #[serde(rename = "call:reject")]
    CallReject(CallReject),

    #[serde(rename = "call:cancel")]
    CallCancel(CallRef),

    #[serde(rename = "call:end")]
    CallEnd(CallRef),

    #[serde(rename = "presence:query")]
    PresenceQuery(PresenceQuery),

    #[serde(rename = "webrtc:offer")]
    Offer(Value),

    #[serde(rename = "webrtc:answer")]
    Answer(Value),

    #[serde(rename = "webrtc:candidate")]
    Candidate(Value),
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

fn payload<T: DeserializeOwned>(event: &'static str, data: Value) -> Result<T, DecodeError> {
    serde_json::from_value(data).map_err(|source| DecodeError::Payload { event, source })
}

impl ClientEvent {
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let envelope: Envelope = serde_json::from_str(text).map_err(DecodeError::Envelope)?;
        Self::from_parts(&envelope.event, envelope.data)
    }

    pub fn from_parts(event: &str, data: Value) -> Result<Self, DecodeError> {
        match event {
            "join-room" => Ok(Self::JoinRoom(match data {
                Value::String(s) => Some(s),
                _ => None,
            })),
            "call:request" => payload("call:request", data).map(Self::CallRequest),
            "call:accept" => payload("call:accept", data).map(Self::CallAccept),
            "call:reject" => payload("call:reject", data).map(Self::CallReject),
            "call:cancel" => payload("call:cancel", data).map(Self::CallCancel),
            "call:end" => payload("call:end", data).map(Self::CallEnd),
            "presence:query" => payload("presence:query", data).map(Self::PresenceQuery),
            "webrtc:offer" => Ok(Self::Offer(data)),
            "webrtc:answer" => Ok(Self::Answer(data)),
            "webrtc:candidate" => Ok(Self::Candidate(data)),
            other => Err(DecodeError::UnknownEvent(other.to_owned())),
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom(_) => "join-room",
            Self::CallRequest(_) => "call:request",
            Self::CallAccept(_) => "call:accept",
            Self::CallReject(_) => "call:reject",
            Self::CallCancel(_) => "call:cancel",
            Self::CallEnd(_) => "call:end",
            Self::PresenceQuery(_) => "presence:query",
            Self::Offer(_) => "webrtc:offer",
            Self::Answer(_) => "webrtc:answer",
            Self::Candidate(_) => "webrtc:candidate",
        }
    }
}

/// События от сервера к клиенту.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "call:incoming")]
    CallIncoming(CallRequest),

    #[serde(rename = "call:accepted")]
    CallAccepted(CallAccepted),

    #[serde(rename = "call:rejected")]
    CallRejected(CallRejected),

    #[serde(rename = "call:cancelled")]
    CallCancelled(CallCancelled),

    #[serde(rename = "call:ended")]
    CallEnded(CallEnded),

    #[serde(rename = "presence:state")]
    PresenceState(PresenceState),

    #[serde(rename = "error")]
    Error(ErrorPayload),

    #[serde(rename = "webrtc:offer")]
    Offer(Value),

    #[serde(rename = "webrtc:answer")]
    Answer(Value),

    #[serde(rename = "webrtc:candidate")]
    Candidate(Value),
}

impl ServerEvent {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            code,
            message: message.into(),
        })
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CallIncoming(_) => "call:incoming",
            Self::CallAccepted(_) => "call:accepted",
            Self::CallRejected(_) => "call:rejected",
            Self::CallCancelled(_) => "call:cancelled",
            Self::CallEnded(_) => "call:ended",
            Self::PresenceState(_) => "presence:state",
            Self::Error(_) => "error",
            Self::Offer(_) => "webrtc:offer",
            Self::Answer(_) => "webrtc:answer",
            Self::Candidate(_) => "webrtc:candidate",
        }
    }
}
