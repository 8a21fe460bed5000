use std::path::Path;

use serde::{Deserialize, Serialize};

/// Env var naming a JSON config file. Unset means all defaults.
pub const CONFIG_ENV: &str = "CLIENT_PROFILER_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field}: {message}")]
    Invalid {
        field: &'static str,
        message: &'static str,
    },
}

/// Whether sending a snapshot also clears the sample table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPolicy {
    /// Every snapshot covers everything since start.
    #[default]
    Cumulative,
    /// Each sent snapshot starts a fresh window.
    ResetAfterSend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Redis list that receives outbound messages.
    #[serde(default = "default_redis_list_key")]
    pub redis_list_key: String,

    /// Max messages kept on the list.
    #[serde(default = "default_redis_list_cap")]
    pub redis_list_cap: usize,

    /// Type tag on messages sent by the periodic sender.
    #[serde(default = "default_message_type")]
    pub message_type: String,

    #[serde(default = "default_stream_interval_ms")]
    pub stream_interval_ms: u64,

    #[serde(default = "default_send_interval_ms")]
    pub send_interval_ms: u64,

    #[serde(default)]
    pub window: WindowPolicy,

    /// Used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".into()
}
fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".into()
}
fn default_redis_list_key() -> String {
    "profiler:messages".into()
}
fn default_redis_list_cap() -> usize {
    10_000
}
fn default_message_type() -> String {
    "information".into()
}
fn default_stream_interval_ms() -> u64 {
    500
}
fn default_send_interval_ms() -> u64 {
    5_000
}
fn default_log_filter() -> String {
    "info".into()
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            redis_url: default_redis_url(),
            redis_list_key: default_redis_list_key(),
            redis_list_cap: default_redis_list_cap(),
            message_type: default_message_type(),
            stream_interval_ms: default_stream_interval_ms(),
            send_interval_ms: default_send_interval_ms(),
            window: WindowPolicy::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl ProfilerConfig {
    /// File named by `CLIENT_PROFILER_CONFIG`, or defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "stream_interval_ms",
                message: "must be greater than 0",
            });
        }
        if self.send_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "send_interval_ms",
                message: "must be greater than 0",
            });
        }
        if self.redis_list_cap == 0 {
            return Err(ConfigError::Invalid {
                field: "redis_list_cap",
                message: "must be greater than 0",
            });
        }
        if self.redis_list_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "redis_list_key",
                message: "must not be empty",
            });
        }
        if self.message_type.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "message_type",
                message: "must not be empty",
            });
        }
        Ok(())
    }
}
