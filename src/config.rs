use config::{Config, ConfigError, Environment, File, Map};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::theme::Theme;

pub const DEFAULT_API_URL: &str = "https://fintracker-backend-v4fu.onrender.com";
pub const DEFAULT_CONFIG_FILE: &str = "fintracker.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_url: String,
    pub data_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub currency_symbol: String,
    pub default_theme: Theme,
    pub log_level: String,
}

impl Settings {
    /// Defaults, then the TOML file (optional), then `FINTRACKER_*` env vars,
    /// then explicit overrides from the command line.
    pub fn load(path: Option<&Path>, api_url: Option<&str>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, api_url, None)
    }

    /// Same layering, with the environment read from `env` instead of the
    /// process when given.
    pub fn load_with_env(
        path: Option<&Path>,
        api_url: Option<&str>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let mut builder = Config::builder()
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("data_dir", default_data_dir().to_string_lossy().to_string())?
            .set_default("request_timeout_secs", 30)?
            .set_default("currency_symbol", "₦")?
            .set_default("default_theme", "light")?
            .set_default("log_level", "info")?
            .add_source(file)
            .add_source(Environment::with_prefix("FINTRACKER").source(env));

        if let Some(url) = api_url {
            builder = builder.set_override("api_url", url)?;
        }

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        settings.api_url = settings.api_url.trim_end_matches('/').to_string();
        Ok(settings)
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("storage.db")
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("fintracker"))
        .unwrap_or_else(|| PathBuf::from(".fintracker"))
}
