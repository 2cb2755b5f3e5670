use crate::error::ConfigError;
use crate::hub::{CallSettings, SwitchboardSettings};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Конфигурация сигнального сервера. Все поля необязательны в файле.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Путь WebSocket; polling живет под `{path}/poll`.
    pub path: String,
    pub call_timeout_secs: u64,
    pub max_call_duration_secs: u64,
    pub call_retention_secs: u64,
    pub sweep_interval_ms: u64,
    pub max_identity_len: usize,
    pub max_call_id_len: usize,
    pub max_presence_query: usize,
    pub poll_wait_secs: u64,
    pub poll_idle_timeout_secs: u64,
    pub poll_batch_limit: usize,
    pub command_buffer: usize,
    pub cors_permissive: bool,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            path: "/signal".to_owned(),
            call_timeout_secs: 45,
            max_call_duration_secs: 4 * 60 * 60,
            call_retention_secs: 120,
            sweep_interval_ms: 1000,
            max_identity_len: 256,
            max_call_id_len: 128,
            max_presence_query: 64,
            poll_wait_secs: 25,
            poll_idle_timeout_secs: 60,
            poll_batch_limit: 100,
            command_buffer: 1024,
            cors_permissive: false,
            log_level: "info".to_owned(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: "<memory>".to_owned(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.path.starts_with('/') || self.path.len() < 2 || self.path.ends_with('/') {
            return Err(ConfigError::Invalid(format!(
                "path must look like '/signal', got '{}'",
                self.path
            )));
        }
        if self.path.contains('{') || self.path.contains('}') {
            return Err(ConfigError::Invalid("path must not contain captures".into()));
        }

        let positive = [
            ("call_timeout_secs", self.call_timeout_secs),
            ("max_call_duration_secs", self.max_call_duration_secs),
            ("sweep_interval_ms", self.sweep_interval_ms),
            ("poll_wait_secs", self.poll_wait_secs),
            ("poll_idle_timeout_secs", self.poll_idle_timeout_secs),
            ("max_identity_len", self.max_identity_len as u64),
            ("max_call_id_len", self.max_call_id_len as u64),
            ("max_presence_query", self.max_presence_query as u64),
            ("poll_batch_limit", self.poll_batch_limit as u64),
            ("command_buffer", self.command_buffer as u64),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
        }

        if self.poll_idle_timeout_secs <= self.poll_wait_secs {
            return Err(ConfigError::Invalid(
                "poll_idle_timeout_secs must exceed poll_wait_secs".into(),
            ));
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn max_call_duration(&self) -> Duration {
        Duration::from_secs(self.max_call_duration_secs)
    }

    pub fn call_retention(&self) -> Duration {
        Duration::from_secs(self.call_retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn poll_wait(&self) -> Duration {
        Duration::from_secs(self.poll_wait_secs)
    }

    pub fn poll_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_idle_timeout_secs)
    }

    pub fn switchboard_settings(&self) -> SwitchboardSettings {
        SwitchboardSettings {
            calls: CallSettings {
                call_timeout: self.call_timeout(),
                max_call_duration: self.max_call_duration(),
                retention: self.call_retention(),
            },
            max_identity_len: self.max_identity_len,
            max_call_id_len: self.max_call_id_len,
            max_presence_query: self.max_presence_query,
        }
    }
}
