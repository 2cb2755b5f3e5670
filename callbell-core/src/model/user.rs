use crate::model::error::ParseIdError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Стабильная идентичность пользователя. Она же ключ его личной комнаты.
///
/// Десериализация не проверяет значение: пустой идентификатор должен
/// дойти до хаба, чтобы тот ответил ошибкой, а не потерял кадр.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Rejects blank or oversized identities. The string is kept exactly as sent,
    /// since it is also the room key every other event addresses.
    pub fn parse(raw: &str, max_len: usize) -> Result<Self, ParseIdError> {
        if raw.trim().is_empty() {
            return Err(ParseIdError::EmptyUser);
        }
        if raw.len() > max_len {
            return Err(ParseIdError::UserTooLong {
                len: raw.len(),
                max: max_len,
            });
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for UserId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
