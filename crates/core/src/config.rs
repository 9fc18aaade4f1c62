//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed by reference into the directory
//! client, the webhook sink and the REST layer. Nothing reads process-wide environment variables
//! while handling a request.
//!
//! [`CoreConfig::from_lookup`] takes the variable source as a function so tests can build a
//! configuration from a plain map instead of mutating the environment.

use crate::constants::{
    DEFAULT_AIRTABLE_API_URL, DEFAULT_AIRTABLE_TABLE, DEFAULT_HTTP_TIMEOUT, DEFAULT_REST_ADDR,
};
use crate::error::{ConfigError, ConfigResult};
use std::time::Duration;

/// Connection settings for the Airtable-style directory store.
///
/// API key and base id are optional here: a missing value is reported by the directory client
/// when it is first used, not at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub base_id: Option<String>,
    pub table: String,
    pub view: Option<String>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_AIRTABLE_API_URL.to_string(),
            api_key: None,
            base_id: None,
            table: DEFAULT_AIRTABLE_TABLE.to_string(),
            view: None,
        }
    }
}

/// Which directory capability the orchestrator is wired to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectoryMode {
    /// Look patients up in the Airtable-style store.
    Airtable,
    /// No directory; every start call must carry name and phone.
    Disabled,
}

/// Allowed CORS origins for the REST surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    directory: DirectoryConfig,
    directory_mode: DirectoryMode,
    sink_url: Option<String>,
    cors_origins: CorsOrigins,
    http_timeout: Duration,
    rest_addr: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            directory: DirectoryConfig::default(),
            directory_mode: DirectoryMode::Airtable,
            sink_url: None,
            cors_origins: CorsOrigins::Any,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            rest_addr: DEFAULT_REST_ADDR.to_string(),
        }
    }
}

impl CoreConfig {
    /// Create a `CoreConfig` from explicit parts.
    pub fn new(directory: DirectoryConfig, sink_url: Option<String>) -> Self {
        Self {
            directory,
            sink_url: sink_url.filter(|u| !u.trim().is_empty()),
            ..Self::default()
        }
    }

    /// Resolve configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`CoreConfig::from_lookup`].
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary variable source.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - `HTTP_TIMEOUT_SECS` is not a positive integer,
    /// - `MEDREC_DIRECTORY` is neither `airtable` nor `none`.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let directory = DirectoryConfig {
            api_url: get("AIRTABLE_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_AIRTABLE_API_URL.to_string()),
            api_key: get("AIRTABLE_API_KEY"),
            base_id: get("AIRTABLE_BASE_ID"),
            table: get("AIRTABLE_TABLE").unwrap_or_else(|| DEFAULT_AIRTABLE_TABLE.to_string()),
            view: get("AIRTABLE_VIEW"),
        };

        let directory_mode = match get("MEDREC_DIRECTORY").as_deref() {
            None | Some("airtable") => DirectoryMode::Airtable,
            Some("none") => DirectoryMode::Disabled,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "MEDREC_DIRECTORY",
                    reason: format!("expected 'airtable' or 'none', got '{other}'"),
                })
            }
        };

        let cors_origins = match get("CORS_ORIGINS") {
            None => CorsOrigins::Any,
            Some(raw) => parse_cors_origins(&raw),
        };

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            None => DEFAULT_HTTP_TIMEOUT,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "HTTP_TIMEOUT_SECS",
                        reason: format!("expected a positive number of seconds, got '{raw}'"),
                    })
                }
            },
        };

        let rest_addr = get("MEDREC_REST_ADDR")
            .or_else(|| get("PORT").map(|port| format!("0.0.0.0:{port}")))
            .unwrap_or_else(|| DEFAULT_REST_ADDR.to_string());

        Ok(Self {
            directory,
            directory_mode,
            sink_url: get("N8N_WEBHOOK_URL"),
            cors_origins,
            http_timeout,
            rest_addr,
        })
    }

    pub fn directory(&self) -> &DirectoryConfig {
        &self.directory
    }

    pub fn directory_mode(&self) -> DirectoryMode {
        self.directory_mode
    }

    pub fn with_directory_mode(mut self, mode: DirectoryMode) -> Self {
        self.directory_mode = mode;
        self
    }

    pub fn sink_url(&self) -> Option<&str> {
        self.sink_url.as_deref()
    }

    pub fn cors_origins(&self) -> &CorsOrigins {
        &self.cors_origins
    }

    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn rest_addr(&self) -> &str {
        &self.rest_addr
    }

    /// Build the HTTP client shared by the directory client and the webhook sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the TLS backend cannot be initialised.
    pub fn http_client(&self) -> ConfigResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.http_timeout)
            .build()
            .map_err(ConfigError::HttpClient)
    }
}

/// `*` anywhere in the list allows every origin.
fn parse_cors_origins(raw: &str) -> CorsOrigins {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        CorsOrigins::Any
    } else {
        CorsOrigins::List(origins)
    }
}
