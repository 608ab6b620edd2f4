//! Process configuration from an optional `stockroom.toml` and the environment.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::Error;

/// Optional config file in the working directory (`stockroom.toml`).
const CONFIG_FILE: &str = "stockroom";

/// Process configuration, read once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Listen host
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret expected in `x-api-key`. Unset means every request is
    /// rejected.
    #[serde(default)]
    pub api_key: Option<String>,

    /// `pretty` or `json`
    #[serde(default)]
    pub log_format: LogFormat,

    /// Largest request body accepted, in bytes. Larger bodies get 413.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: None,
            log_format: LogFormat::default(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Config {
    /// Loads `stockroom.toml` if present, then lets process environment
    /// (`HOST`, `PORT`, `API_KEY`, `LOG_FORMAT`, `MAX_BODY_BYTES`) override it.
    ///
    /// Environment values stay strings until deserialization, so numeric
    /// fields parse while `API_KEY` is kept byte for byte.
    pub fn load() -> Result<Self, Error> {
        Self::build(None)
    }

    /// Like [`load`](Config::load), with `vars` standing in for the process
    /// environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, Error> {
        Self::build(Some(vars))
    }

    fn build(vars: Option<HashMap<String, String>>) -> Result<Self, Error> {
        let builder = ::config::Config::builder()
            .add_source(::config::File::with_name(CONFIG_FILE).required(false))
            .add_source(::config::Environment::default().source(vars));

        let mut config: Config = builder.build()?.try_deserialize()?;
        if config.api_key.as_deref().is_some_and(str::is_empty) {
            config.api_key = None;
        }
        Ok(config)
    }

    /// `host:port`, resolved when the server binds.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_body_bytes() -> usize {
    crate::server::DEFAULT_BODY_LIMIT
}
