use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

const PLEX_TOKEN: &str = "plex_token";
const TMDB_API_KEY: &str = "tmdb_api_key";
const TELEGRAM_BOT_TOKEN: &str = "telegram_bot_token";

/// Load a `.env` file from the working directory if one exists.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => debug!("Ignoring unreadable .env file: {}", e),
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// Secrets kept outside `config.toml`.
///
/// Environment variables take precedence over values stored in the file.
pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.credentials.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.credentials.remove(key);
    }

    /// Resolve a credential: the environment variable wins, then the file.
    /// Blank values count as missing.
    pub fn resolve_with<F>(&self, key: &str, env_var: &str, env: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        env(env_var)
            .or_else(|| self.get(key).cloned())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn resolve(&self, key: &str, env_var: &str) -> Option<String> {
        self.resolve_with(key, env_var, |name| std::env::var(name).ok())
    }

    pub fn plex_token(&self) -> Option<String> {
        self.resolve(PLEX_TOKEN, "PLEX_TOKEN")
    }

    pub fn set_plex_token(&mut self, token: String) {
        self.set(PLEX_TOKEN.to_string(), token);
    }

    pub fn tmdb_api_key(&self) -> Option<String> {
        self.resolve(TMDB_API_KEY, "TMDB_API_KEY")
    }

    pub fn set_tmdb_api_key(&mut self, key: String) {
        self.set(TMDB_API_KEY.to_string(), key);
    }

    pub fn telegram_bot_token(&self) -> Option<String> {
        self.resolve(TELEGRAM_BOT_TOKEN, "TELEGRAM_BOT_TOKEN")
    }

    pub fn set_telegram_bot_token(&mut self, token: String) {
        self.set(TELEGRAM_BOT_TOKEN.to_string(), token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_credential_store_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut store = CredentialStore::new(path.clone());
        store.set_plex_token("plex-secret".to_string());
        store.set_tmdb_api_key("tmdb-secret".to_string());
        store.save().unwrap();

        let mut loaded_store = CredentialStore::new(path);
        loaded_store.load().unwrap();
        assert_eq!(loaded_store.get("plex_token"), Some(&"plex-secret".to_string()));
        assert_eq!(loaded_store.get("tmdb_api_key"), Some(&"tmdb-secret".to_string()));
        assert_eq!(loaded_store.get("telegram_bot_token"), None);
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/unused"));
        store.set_plex_token("from-file".to_string());

        let env = |name: &str| (name == "PLEX_TOKEN").then(|| "from-env".to_string());
        assert_eq!(store.resolve_with("plex_token", "PLEX_TOKEN", env), Some("from-env".to_string()));

        let no_env = |_: &str| None;
        assert_eq!(store.resolve_with("plex_token", "PLEX_TOKEN", no_env), Some("from-file".to_string()));
    }

    #[test]
    fn test_blank_credential_is_missing() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/unused"));
        store.set_tmdb_api_key("   ".to_string());
        assert_eq!(store.resolve_with("tmdb_api_key", "TMDB_API_KEY", |_| None), None);
    }

    #[test]
    fn test_credential_store_remove() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/test"));
        store.set("key1".to_string(), "value1".to_string());
        store.set("key2".to_string(), "value2".to_string());

        assert_eq!(store.get("key1"), Some(&"value1".to_string()));
        store.remove("key1");
        assert_eq!(store.get("key1"), None);
        assert_eq!(store.get("key2"), Some(&"value2".to_string()));
    }
}
