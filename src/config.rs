//! Configuration
//!
//! Layered with figment: built-in defaults, then a TOML file
//! (`initrack.toml` unless another path is given), then `INITRACK_*`
//! environment variables.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file looked up in the working directory
pub const CONFIG_FILE: &str = "initrack.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "INITRACK_";

/// Tracker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database path; None = in-memory
    pub database: Option<String>,
    /// Tracing filter used when RUST_LOG is unset
    pub log_filter: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Some("initrack.db".to_string()),
            log_filter: "initrack=info".to_string(),
            log_json: false,
        }
    }
}

impl Config {
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.unwrap_or_else(|| Path::new(CONFIG_FILE));
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }
}
