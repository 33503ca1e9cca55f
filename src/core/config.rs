use std::path::PathBuf;

use config::Config;
use serde::Deserialize;

use crate::core::error::ConfigError;

#[derive(Debug, Deserialize, Clone)]
pub struct Args {
    pub api_url: String,
    pub credentials_path: PathBuf,
    pub user_agent: String,
    pub request_timeout: u64,
    pub log_level: String,
}

impl Args {
    /// Layered lookup: defaults, then an optional `avrid.toml`, then
    /// `AVRID_`-prefixed environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("user_agent", concat!("avrid/", env!("CARGO_PKG_VERSION")))?
            .set_default("request_timeout", 10_i64)?
            .set_default("log_level", "info")?
            .add_source(config::File::with_name("avrid").required(false))
            .add_source(config::Environment::with_prefix("AVRID"))
            .build()?;

        Ok(config.try_deserialize::<Args>()?)
    }
}
