//! Layered configuration.
//!
//! Sources, highest priority first:
//! 1. Command line flags ([`AppConfig::apply`])
//! 2. Environment variables (`INSIGHTS_*`, `__` separates sections)
//! 3. The `--config` file, or `./insights.toml`
//! 4. `~/.config/insights-tui/config.toml`
//! 5. Built-in defaults
//!
//! `INSIGHTS_API__BASE_URL` maps to `api.base_url`, `INSIGHTS_UI__WEEK_START`
//! to `ui.week_start`, and so on.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::dates::WeekStart;
use crate::error::ConfigError;

pub const ENV_PREFIX: &str = "INSIGHTS_";
pub const LOCAL_CONFIG: &str = "insights.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: crate::api::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    /// Milliseconds per revealed summary character
    pub reveal_interval_ms: u64,
    /// Pause between the ten upload progress steps
    pub upload_step_ms: u64,
    pub notice_secs: u64,
    pub week_start: WeekStart,
    /// Number of speakers offered for relevance (`spk_0` ..)
    pub speakers: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            reveal_interval_ms: 30,
            upload_step_ms: 300,
            notice_secs: 3,
            week_start: WeekStart::Monday,
            speakers: 2,
        }
    }
}

impl UiConfig {
    pub fn reveal_interval(&self) -> Duration {
        Duration::from_millis(self.reveal_interval_ms)
    }

    pub fn upload_step(&self) -> Duration {
        Duration::from_millis(self.upload_step_ms)
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_secs(self.notice_secs)
    }

    pub fn speaker_ids(&self) -> Vec<String> {
        (0..self.speakers).map(|i| format!("spk_{i}")).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log file; `None` uses `insights-tui.log` in the platform cache dir
    pub file: Option<PathBuf>,
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: None,
            filter: "info".to_string(),
        }
    }
}

impl LogConfig {
    pub fn resolved_file(&self) -> PathBuf {
        self.file.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("insights-tui")
                .join("insights-tui.log")
        })
    }
}

/// Command line values that win over every other source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub log_file: Option<PathBuf>,
    pub week_start: Option<WeekStart>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// Load from every source, including the user config, and validate.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(Self::global_config_path().as_deref(), config_path)
    }

    /// Like [`AppConfig::load`] with an explicit user config path; `None`
    /// skips that layer.
    pub fn load_from(global: Option<&Path>, config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(global, config_path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// The provider chain below the command line.
    pub fn figment(global: Option<&Path>, config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global) = global {
            if global.exists() {
                figment = figment.merge(Toml::file(global));
            }
        }

        // An explicit path is merged even if missing so the mistake surfaces
        // as an error instead of silently using defaults.
        match config_path {
            Some(path) => figment = figment.merge(Toml::file_exact(path)),
            None => {
                let local = PathBuf::from(LOCAL_CONFIG);
                if local.exists() {
                    figment = figment.merge(Toml::file(local));
                }
            }
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// `~/.config/insights-tui/config.toml` or the platform equivalent
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("insights-tui").join("config.toml"))
    }

    /// Apply command line values on top and re-validate.
    pub fn apply(&mut self, overrides: Overrides) -> Result<(), ConfigError> {
        if let Some(url) = overrides.api_url {
            self.api.base_url = url;
        }
        if let Some(path) = overrides.log_file {
            self.log.file = Some(path);
        }
        if let Some(week_start) = overrides.week_start {
            self.ui.week_start = week_start;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.api.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url".into(),
                reason: format!("'{base}' is not an http(s) URL"),
            });
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.ui.speakers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ui.speakers".into(),
                reason: "at least one speaker is required".into(),
            });
        }
        Ok(())
    }
}
