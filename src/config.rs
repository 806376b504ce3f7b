use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{default_subjects, validate_subjects};
use crate::error::CiteError;

pub const CONFIG_FILE: &str = "kira-cite.json";
pub const SPRINGER_KEY_ENV: &str = "SPRINGER_API_KEY";
pub const PLOS_KEY_ENV: &str = "PLOS_API_KEY";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub subjects: Option<Vec<String>>,
    #[serde(default)]
    pub cache_path: Option<String>,
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default)]
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Credentials {
    #[serde(default)]
    pub springer_api_key: Option<String>,
    #[serde(default)]
    pub plos_api_key: Option<String>,
}

impl Credentials {
    pub fn springer(&self) -> Result<&str, CiteError> {
        non_blank(self.springer_api_key.as_deref()).ok_or(CiteError::MissingCredential {
            source_name: "springer",
            env_var: SPRINGER_KEY_ENV,
        })
    }

    pub fn plos(&self) -> Result<&str, CiteError> {
        non_blank(self.plos_api_key.as_deref()).ok_or(CiteError::MissingCredential {
            source_name: "plos",
            env_var: PLOS_KEY_ENV,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub subjects: Vec<String>,
    pub cache_path: Utf8PathBuf,
    pub database_path: Utf8PathBuf,
    pub credentials: Credentials,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, CiteError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| CiteError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content).map_err(|err| CiteError::ConfigParse(err.to_string()))?
        };

        let env = Credentials {
            springer_api_key: std::env::var(SPRINGER_KEY_ENV).ok(),
            plos_api_key: std::env::var(PLOS_KEY_ENV).ok(),
        };
        Self::resolve_config(config, env)
    }

    pub fn resolve_config(config: Config, env: Credentials) -> Result<ResolvedConfig, CiteError> {
        let subjects = config.subjects.unwrap_or_else(default_subjects);
        validate_subjects(&subjects)?;

        let credentials = Credentials {
            springer_api_key: non_blank(config.credentials.springer_api_key.as_deref())
                .or_else(|| non_blank(env.springer_api_key.as_deref()))
                .map(|key| key.to_string()),
            plos_api_key: non_blank(config.credentials.plos_api_key.as_deref())
                .or_else(|| non_blank(env.plos_api_key.as_deref()))
                .map(|key| key.to_string()),
        };

        Ok(ResolvedConfig {
            subjects,
            cache_path: config
                .cache_path
                .map(Utf8PathBuf::from)
                .unwrap_or_else(default_cache_path),
            database_path: config
                .database_path
                .map(Utf8PathBuf::from)
                .unwrap_or_else(default_database_path),
            credentials,
        })
    }
}

pub fn default_cache_path() -> Utf8PathBuf {
    Utf8PathBuf::from(".kira-cite").join("cache.json")
}

pub fn default_database_path() -> Utf8PathBuf {
    Utf8PathBuf::from(".kira-cite").join("articles.db")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
