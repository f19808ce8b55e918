use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_STORAGE_PATH: &str = "data/local_storage.json";
const DEFAULT_PORT: u16 = 3000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the feed service.
    pub api_url: String,
    /// File standing in for the browser's local storage in CLI mode.
    pub storage_path: PathBuf,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| get(name).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                expected: "a port number",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            api_url: non_empty("AUM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into()),
            storage_path: non_empty("AUM_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH)),
            port,
        })
    }
}
