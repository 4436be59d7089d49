use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

/// Where the store lives: a full URL, or the individual parts.
#[derive(Clone, PartialEq, Eq)]
pub enum ConnectTarget {
    Url(String),
    Parts {
        host: String,
        database: String,
        user: String,
        password: String,
    },
}

/// Connection settings for the PostgreSQL store.
#[derive(Clone)]
pub struct DbConfig {
    pub target: ConnectTarget,
    /// Upper bound on pooled connections (default: `5`).
    pub max_connections: u32,
    /// How long one connection attempt may take before it counts as failed
    /// (default: 5 s).
    pub connect_timeout: Duration,
    /// Fixed sleep between startup connection attempts (default: 2 s).
    pub retry_interval: Duration,
}

/// A configuration variable was present but could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("{key} must be {expected}, got '{value}'")]
pub struct ConfigError {
    pub key: &'static str,
    pub expected: &'static str,
    pub value: String,
}

impl DbConfig {
    /// Default settings for the store at `url`.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            target: ConnectTarget::Url(url.into()),
            max_connections: 5,
            connect_timeout: Duration::from_secs(5),
            retry_interval: Duration::from_secs(2),
        }
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                                  |
    /// |----------------------------|------------------------------------------|
    /// | `DATABASE_URL`             | unset: the four variables below are used |
    /// | `HOST_TO_POSTGRES`         | `localhost`                              |
    /// | `POSTGRES_DB`              | `database-postgres`                      |
    /// | `POSTGRES_USER`            | `root`                                   |
    /// | `POSTGRES_PASSWORD`        | `root`                                   |
    /// | `DB_MAX_CONNECTIONS`       | `5`                                      |
    /// | `DB_CONNECT_TIMEOUT_SECS`  | `5`                                      |
    /// | `DB_RETRY_INTERVAL_SECS`   | `2`                                      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DbConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let target = match lookup("DATABASE_URL") {
            Some(url) => ConnectTarget::Url(url),
            None => ConnectTarget::Parts {
                host: lookup("HOST_TO_POSTGRES").unwrap_or_else(|| "localhost".into()),
                database: lookup("POSTGRES_DB").unwrap_or_else(|| "database-postgres".into()),
                user: lookup("POSTGRES_USER").unwrap_or_else(|| "root".into()),
                password: lookup("POSTGRES_PASSWORD").unwrap_or_else(|| "root".into()),
            },
        };

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError {
                    key: "DB_MAX_CONNECTIONS",
                    expected: "a positive integer",
                    value: raw,
                })?,
            None => 5,
        };

        let connect_secs = match lookup("DB_CONNECT_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError {
                    key: "DB_CONNECT_TIMEOUT_SECS",
                    expected: "a positive whole number of seconds",
                    value: raw,
                })?,
            None => 5,
        };

        let retry_secs = match lookup("DB_RETRY_INTERVAL_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError {
                key: "DB_RETRY_INTERVAL_SECS",
                expected: "a whole number of seconds",
                value: raw,
            })?,
            None => 2,
        };

        Ok(Self {
            target,
            max_connections,
            connect_timeout: Duration::from_secs(connect_secs),
            retry_interval: Duration::from_secs(retry_secs),
        })
    }

    /// Driver options for [`DbConfig::target`].
    ///
    /// Parts are passed to the driver as-is, so credentials need no URL
    /// escaping. An unparsable URL is a [`sqlx::Error::Configuration`].
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        match &self.target {
            ConnectTarget::Url(url) => url.parse(),
            ConnectTarget::Parts {
                host,
                database,
                user,
                password,
            } => Ok(PgConnectOptions::new()
                .host(host)
                .database(database)
                .username(user)
                .password(password)),
        }
    }
}

// The URL and the parts carry the password.
impl std::fmt::Debug for ConnectTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectTarget::Url(_) => f.write_str("<redacted url>"),
            ConnectTarget::Parts {
                host,
                database,
                user,
                ..
            } => write!(f, "{user}@{host}/{database}"),
        }
    }
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("target", &self.target)
            .field("max_connections", &self.max_connections)
            .field("connect_timeout", &self.connect_timeout)
            .field("retry_interval", &self.retry_interval)
            .finish()
    }
}
