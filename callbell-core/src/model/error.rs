use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseIdError {
    #[error("invalid connection id: {0}")]
    Connection(String),

    #[error("user id is empty")]
    EmptyUser,

    #[error("user id is {len} bytes, limit is {max}")]
    UserTooLong { len: usize, max: usize },

    #[error("call id is empty")]
    EmptyCall,

    #[error("call id is {len} bytes, limit is {max}")]
    CallTooLong { len: usize, max: usize },
}

/// Ошибка разбора входящего кадра от клиента.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("frame is not a JSON event envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    #[error("payload of '{event}' is malformed: {source}")]
    Payload {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
