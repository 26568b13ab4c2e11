//! Server configuration from environment variables.
//!
//! `from_lookup` takes the variable source as a closure so tests can build a
//! configuration without touching the process environment. Empty values are
//! treated as unset.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::http::HeaderValue;
use thiserror::Error;

use bodhi_core::defaults::{HOST, PORT};
use bodhi_db::pool::DEFAULT_MAX_CONNECTIONS;

/// Configuration errors reported at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("no backend configured: set DATABASE_URL, SUPABASE_URL, or BODHI_BACKEND=memory")]
    NoBackend,
}

/// Which [`bodhi_core::RowStore`] the server runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    PostgRest {
        url: String,
        service_key: String,
    },
    Memory,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Postgres { .. } => "postgres",
            BackendKind::PostgRest { .. } => "postgrest",
            BackendKind::Memory => "memory",
        }
    }
}

/// CORS origin policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<HeaderValue>),
}

/// Log line encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// `json` (any case) selects JSON lines; anything else is text.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(v) if v.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    }
}

/// Log output settings consumed by [`crate::telemetry::init_tracing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Daily-rotated log file; stdout when unset.
    pub file: Option<String>,
    /// Force ANSI colours on or off. Unset means on for stdout, off for files.
    pub ansi: Option<bool>,
}

impl LogConfig {
    /// Directory and file-name prefix for the rolling appender.
    pub fn file_target(&self) -> Option<(PathBuf, String)> {
        let path = Path::new(self.file.as_deref()?);
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or(DEFAULT_LOG_FILE_NAME)
            .to_string();
        Some((dir, name))
    }

    pub fn use_ansi(&self) -> bool {
        self.ansi.unwrap_or(self.file.is_none())
    }
}

const DEFAULT_LOG_FILE_NAME: &str = "bodhi-api.log";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub backend: BackendKind,
    /// Secret for `/set_img`. `None` refuses every mutation.
    pub admin_key: Option<String>,
    pub allowed_origins: AllowedOrigins,
    pub log: LogConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                value: raw,
            })?,
            None => PORT,
        };

        let log = LogConfig {
            format: LogFormat::parse(get("LOG_FORMAT").as_deref()),
            file: get("LOG_FILE"),
            ansi: get("LOG_ANSI").map(|v| v == "true" || v == "1"),
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| HOST.to_string()),
            port,
            backend: backend_from_lookup(&get)?,
            admin_key: get("ADMIN_KEY"),
            allowed_origins: parse_allowed_origins(get("ALLOWED_ORIGINS").as_deref()),
            log,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::Invalid {
            var: "HOST",
            value: raw,
        })
    }
}

fn backend_from_lookup<F>(get: &F) -> Result<BackendKind, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let postgres = || -> Result<BackendKind, ConfigError> {
        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid {
                    var: "DB_MAX_CONNECTIONS",
                    value: raw,
                })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        Ok(BackendKind::Postgres {
            database_url,
            max_connections,
        })
    };
    let postgrest = || -> Result<BackendKind, ConfigError> {
        Ok(BackendKind::PostgRest {
            url: get("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?,
            service_key: get("SUPABASE_SERVICE_ROLE_KEY")
                .ok_or(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"))?,
        })
    };

    match get("BODHI_BACKEND").map(|v| v.trim().to_ascii_lowercase()) {
        Some(kind) => match kind.as_str() {
            "postgres" => postgres(),
            "postgrest" | "supabase" => postgrest(),
            "memory" => Ok(BackendKind::Memory),
            _ => Err(ConfigError::Invalid {
                var: "BODHI_BACKEND",
                value: kind,
            }),
        },
        None if get("DATABASE_URL").is_some() => postgres(),
        None if get("SUPABASE_URL").is_some() => postgrest(),
        None => Err(ConfigError::NoBackend),
    }
}

/// Parse a comma-separated origin list. Unset, empty, or `*` allows any
/// origin; entries that are not valid header values are skipped.
pub fn parse_allowed_origins(raw: Option<&str>) -> AllowedOrigins {
    let raw = match raw.map(str::trim) {
        None | Some("") | Some("*") => return AllowedOrigins::Any,
        Some(raw) => raw,
    };

    let origins: Vec<HeaderValue> = raw
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect();

    if origins.is_empty() {
        AllowedOrigins::Any
    } else {
        AllowedOrigins::List(origins)
    }
}
