//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` and overridden by `SPLITZ__*` environment
//! variables, e.g. `SPLITZ__APP__LEVEL=debug`.
use config::{Config, ConfigError, Environment, File};
use engine::UnknownIdPolicy;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: String::from("info"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Database::Sqlite(String::from("splitz.db"))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub unknown_ids: UnknownIdPolicy,
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub engine: EngineSettings,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("SPLITZ").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
