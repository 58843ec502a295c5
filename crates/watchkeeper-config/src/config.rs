use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_REFERENCE_URL_BASE: &str = "https://www.filmaffinity.com/es/search.php?stext=";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub ratings: RatingsConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub presentation: PresentationConfig,
}

/// The media server whose libraries are reconciled against the watchlist
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub name: String,
    /// Language requested for watchlist metadata
    #[serde(default = "default_language")]
    pub language: String,
    /// Accept self-signed certificates on server connections
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_ratings_language")]
    pub language: String,
}

impl Default for RatingsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            language: default_ratings_language(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelegramConfig {
    pub chat_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            run_on_startup: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresentationConfig {
    /// Prefix of the outbound reference link; title words are appended
    #[serde(default = "default_reference_url_base")]
    pub reference_url_base: String,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            reference_url_base: default_reference_url_base(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en".to_string()
}

fn default_ratings_language() -> String {
    "en-US".to_string()
}

fn default_interval_secs() -> u64 {
    3600
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_reference_url_base() -> String {
    DEFAULT_REFERENCE_URL_BASE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "Navidad".to_string(),
                language: default_language(),
                accept_invalid_certs: false,
            },
            ratings: RatingsConfig::default(),
            notifications: NotificationsConfig::default(),
            scheduler: SchedulerConfig::default(),
            api: ApiConfig::default(),
            presentation: PresentationConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file if present, fall back to defaults, then apply environment overrides
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `SERVER_NAME` and `TELEGRAM_CHAT_ID` take precedence over the file
    pub fn apply_env_overrides<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = env("SERVER_NAME").filter(|v| !v.trim().is_empty()) {
            self.server.name = name.trim().to_string();
        }
        if let Some(chat_id) = env("TELEGRAM_CHAT_ID").filter(|v| !v.trim().is_empty()) {
            self.notifications.telegram = Some(TelegramConfig {
                chat_id: chat_id.trim().to_string(),
            });
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.name.trim().is_empty() {
            return Err(anyhow::anyhow!("server.name is required and cannot be empty"));
        }

        if self.scheduler.interval_secs == 0 {
            return Err(anyhow::anyhow!("scheduler.interval_secs must be greater than zero"));
        }

        self.bind_addr()?;

        Ok(())
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        self.api
            .bind
            .parse::<SocketAddr>()
            .map_err(|e| anyhow::anyhow!("Invalid api.bind address '{}': {}", self.api.bind, e))
    }

    pub fn telegram_chat_id(&self) -> Option<&str> {
        self.notifications
            .telegram
            .as_ref()
            .map(|t| t.chat_id.as_str())
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.server.name = "Living Room".to_string();
        config.notifications.telegram = Some(TelegramConfig {
            chat_id: "-100123".to_string(),
        });
        config.scheduler.interval_secs = 900;

        config.save_to_file(file.path()).unwrap();
        let loaded = Config::load_from_file(file.path()).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.telegram_chat_id(), Some("-100123"));
    }

    #[test]
    fn test_minimal_file_gets_defaults() {
        let config: Config = toml::from_str("[server]\nname = \"Navidad\"\n").unwrap();

        assert_eq!(config.server.language, "en");
        assert!(!config.server.accept_invalid_certs);
        assert!(config.ratings.enabled);
        assert_eq!(config.ratings.language, "en-US");
        assert_eq!(config.scheduler.interval_secs, 3600);
        assert!(config.scheduler.run_on_startup);
        assert_eq!(config.api.bind, "127.0.0.1:5000");
        assert_eq!(config.presentation.reference_url_base, DEFAULT_REFERENCE_URL_BASE);
        assert_eq!(config.telegram_chat_id(), None);
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.server.name = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scheduler.interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.bind = "not-an-address".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(|name| match name {
            "SERVER_NAME" => Some("Basement".to_string()),
            "TELEGRAM_CHAT_ID" => Some("42".to_string()),
            _ => None,
        });

        assert_eq!(config.server.name, "Basement");
        assert_eq!(config.telegram_chat_id(), Some("42"));
    }

    #[test]
    fn test_blank_env_override_is_ignored() {
        let mut config = Config::default();
        config.apply_env_overrides(|_| Some(" ".to_string()));
        assert_eq!(config.server.name, "Navidad");
        assert!(config.notifications.telegram.is_none());
    }
}
