use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "http://localhost:4000";
pub const DEFAULT_TOKEN_FILE: &str = "haaflah_token";
pub const API_URL_ENV: &str = "HAAFLAH_API_URL";
pub const LOG_ENV: &str = "RUST_LOG";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Logger reading its filter from `filter_env`, `info` when unset.
pub fn logger(filter_env: &str) -> env_logger::Builder {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or(filter_env, DEFAULT_LOG_FILTER))
}

/// Json struct for client settings
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    pub api_url: Option<String>,
    pub token_file: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
}

impl Settings {
    /// Read settings from `path`, or use defaults when no file is given.
    /// `HAAFLAH_API_URL` takes precedence over the file.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = match path {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read settings {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Invalid settings file {}", path.display()))?
            }
            None => Settings::default(),
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            settings.apply_api_url_override(Some(url));
        }
        Ok(settings)
    }

    pub fn apply_api_url_override(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            log::debug!("Using API URL override {}", url);
            self.api_url = Some(url);
        }
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn token_file(&self) -> PathBuf {
        self.token_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE))
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api_url(), DEFAULT_API_URL);
        assert_eq!(settings.token_file(), PathBuf::from("haaflah_token"));
        assert_eq!(settings.export_dir(), PathBuf::from("."));
        assert_eq!(settings.request_timeout(), None);
    }

    #[test]
    fn test_partial_file() {
        let settings: Settings =
            serde_json::from_str(r#"{"api_url":"https://api.example.com/v1","request_timeout_secs":5}"#)
                .unwrap();
        assert_eq!(settings.api_url(), "https://api.example.com/v1");
        assert_eq!(settings.request_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(settings.token_file(), PathBuf::from("haaflah_token"));
    }

    #[test]
    fn test_override_ignores_blank() {
        let mut settings = Settings::default();
        settings.apply_api_url_override(Some(" ".to_owned()));
        assert_eq!(settings.api_url(), DEFAULT_API_URL);

        settings.apply_api_url_override(Some("http://other:1".to_owned()));
        assert_eq!(settings.api_url(), "http://other:1");
    }

    #[test]
    fn test_logger_defaults_to_info() {
        let logger = logger("HAAFLAH_TEST_UNSET_LOG").build();
        assert_eq!(logger.filter(), log::LevelFilter::Info);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Settings::load(Some(Path::new("/nonexistent/haaflah.json"))).is_err());
    }
}
