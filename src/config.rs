//! Runtime configuration, layered: built-in defaults, then an optional
//! `config/config.toml`, then `BOTICA_*` environment variables
//! (`__` separates nesting, e.g. `BOTICA_BIND_ADDR`).

use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
    #[serde(default = "default_reset_token_hours")]
    pub reset_token_hours: i64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_cache_capacity() -> usize {
    256
}

fn default_cache_ttl_seconds() -> u64 {
    30
}

fn default_reset_token_hours() -> i64 {
    24
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
            reset_token_hours: default_reset_token_hours(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/config").required(false))
            .add_source(Environment::with_prefix("BOTICA").separator("__"))
            .build()?
            .try_deserialize()
    }
}
