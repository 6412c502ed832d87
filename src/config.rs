use std::{env, net::SocketAddr};

use thiserror::Error;

/// AppConfig
///
/// Holds the guard service's configuration. Immutable once loaded and shared with
/// every request through `AppState` and `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects log format and which settings are mandatory.
    pub env: Env,
    // Address the HTTP host listens on.
    pub bind_addr: SocketAddr,
    // Name of the cookie carrying the credential to the edge.
    pub token_cookie: String,
    // Local storage key the client reads the credential from.
    pub token_storage_key: String,
}

/// Env
///
/// `Local` favours defaults and readable logs; `Production` demands explicit
/// settings and logs JSON.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
    #[error("{name} is not a valid socket address: {value}")]
    InvalidAddr { name: &'static str, value: String },
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_TOKEN_NAME: &str = "token";

impl Default for AppConfig {
    /// default
    ///
    /// Local settings with no environment lookups, for tests and scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            token_cookie: DEFAULT_TOKEN_NAME.to_string(),
            token_storage_key: DEFAULT_TOKEN_NAME.to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables (call `dotenv` first to
    /// honour a `.env` file).
    ///
    /// * `APP_ENV`: `production` or anything else for local.
    /// * `BIND_ADDR`: defaults to `0.0.0.0:3000` locally, mandatory in production.
    /// * `TOKEN_COOKIE`, `TOKEN_STORAGE_KEY`: default to `token`.
    ///
    /// Fails fast on a missing production setting or an unparseable value.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let bind_value = match (env, env::var("BIND_ADDR")) {
            (_, Ok(value)) => value,
            (Env::Local, Err(_)) => DEFAULT_BIND_ADDR.to_string(),
            (Env::Production, Err(_)) => return Err(ConfigError::Missing("BIND_ADDR")),
        };
        let bind_addr = bind_value
            .parse()
            .map_err(|_| ConfigError::InvalidAddr {
                name: "BIND_ADDR",
                value: bind_value.clone(),
            })?;

        Ok(Self {
            env,
            bind_addr,
            token_cookie: token_name("TOKEN_COOKIE")?,
            token_storage_key: token_name("TOKEN_STORAGE_KEY")?,
        })
    }
}

fn token_name(var: &'static str) -> Result<String, ConfigError> {
    match env::var(var) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::Empty(var)),
        Ok(value) => Ok(value),
        Err(_) => Ok(DEFAULT_TOKEN_NAME.to_string()),
    }
}
