use gerencia_core::password::HashParams;
use gerencia_db::config::{ConfigError, DbConfig};

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Process configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db: DbConfig,
    pub hash_params: HashParams,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// Database variables are documented on [`DbConfig::from_env`]. In addition:
    ///
    /// | Env Var                | Default                  |
    /// |------------------------|--------------------------|
    /// | `PASSWORD_HASH_ROUNDS` | `pbkdf2` crate default   |
    /// | `LOG_FORMAT`           | `text` (or `json`)       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db = DbConfig::from_lookup(&lookup)?;

        let hash_params = match lookup("PASSWORD_HASH_ROUNDS") {
            Some(raw) => HashParams {
                rounds: raw
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or(ConfigError {
                        key: "PASSWORD_HASH_ROUNDS",
                        expected: "a positive integer",
                        value: raw,
                    })?,
            },
            None => HashParams::default(),
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError {
                    key: "LOG_FORMAT",
                    expected: "'text' or 'json'",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            db,
            hash_params,
            log_format,
        })
    }
}
