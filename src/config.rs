use std::{env, fs, path::Path, time::Duration};

use directories::ProjectDirs;
use serde::Deserialize;
use tracing::warn;

use crate::error::{ConfigError, Error};

pub const ENV_API_BASE_URL: &str = "INVITE_CONSOLE_API_BASE_URL";
pub const ENV_LOG_DIRECTORY: &str = "INVITE_CONSOLE_LOG_DIRECTORY";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    api_base_url: String,
    request_timeout_seconds: u64,
    items_per_page: u32,
    search_debounce_millis: u64,
    log_directory: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5001/api/v1/invite-user-dashboard".to_owned(),
            request_timeout_seconds: 30,
            items_per_page: 10,
            search_debounce_millis: 500,
            log_directory: None,
        }
    }
}

impl Config {
    ///Loads from the given path, falling back to the platform config
    ///directory, falling back to defaults. Environment variables override
    ///whatever was loaded.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        if let Ok(api_base_url) = env::var(ENV_API_BASE_URL) {
            config.api_base_url = api_base_url;
        }
        if let Ok(log_directory) = env::var(ENV_LOG_DIRECTORY) {
            config.log_directory = Some(log_directory);
        }
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, Error> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                return Err(
                    ConfigError::ReadFile(err, path.to_string_lossy().to_string()).into(),
                )
            }
        };
        let config: Self = match toml::from_str(&raw) {
            Ok(config) => config,
            Err(err) => return Err(ConfigError::Parse(err).into()),
        };
        Ok(config)
    }

    fn default_path() -> Option<std::path::PathBuf> {
        let project_dirs = match ProjectDirs::from("", "", "invite-console") {
            Some(project_dirs) => project_dirs,
            None => {
                warn!("no home directory available, skipping config file lookup");
                return None;
            }
        };
        Some(project_dirs.config_dir().join("config.toml"))
    }

    fn validate(&mut self) -> Result<(), Error> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidBaseUrl(self.api_base_url.to_owned()).into());
        }
        while self.api_base_url.ends_with('/') {
            self.api_base_url.pop();
        }
        if self.items_per_page == 0 {
            self.items_per_page = Self::default().items_per_page;
        }
        Ok(())
    }

    pub fn get_api_base_url(&self) -> &str {
        &self.api_base_url
    }
    pub fn get_request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
    pub fn get_items_per_page(&self) -> u32 {
        self.items_per_page
    }
    pub fn get_search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_millis)
    }
    pub fn get_log_directory(&self) -> Option<&String> {
        self.log_directory.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let config: Config = toml::from_str("items_per_page = 25").unwrap();
        assert_eq!(config.get_items_per_page(), 25);
        assert_eq!(config.get_request_timeout().as_secs(), 30);
        assert_eq!(config.get_search_debounce().as_millis(), 500);
        assert!(config.get_log_directory().is_none());
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        let mut config: Config =
            toml::from_str("api_base_url = \"http://localhost:5001/api/\"").unwrap();
        config.validate().unwrap();
        assert_eq!(config.get_api_base_url(), "http://localhost:5001/api");
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let mut config: Config = toml::from_str("api_base_url = \"localhost:5001\"").unwrap();
        assert!(config.validate().is_err());
    }
}
