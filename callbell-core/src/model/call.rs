use crate::model::error::ParseIdError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Токен звонка. Генерируется звонящим клиентом.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct CallId(String);

impl CallId {
    /// Random 128-bit token in the form clients are expected to send.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn validate(&self, max_len: usize) -> Result<(), ParseIdError> {
        if self.0.trim().is_empty() {
            return Err(ParseIdError::EmptyCall);
        }
        if self.0.len() > max_len {
            return Err(ParseIdError::CallTooLong {
                len: self.0.len(),
                max: max_len,
            });
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CallId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for CallId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CallState {
    Requested,
    Accepted,
    Rejected,
    Cancelled,
    Ended,
    Expired,
}

impl CallState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Requested | Self::Accepted)
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Requested => "requested",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Ended => "ended",
            Self::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// Причина, по которой сервер сам завершил звонок.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum CallEndReason {
    Timeout,
    MaxDuration,
    /// Последнее соединение звонящего закрылось, пока звонок звонил.
    CallerLeft,
}
