use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CiteError {
    #[error("invalid DOI: {0}")]
    InvalidDoi(String),

    #[error("invalid subject term: {0}")]
    InvalidSubject(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("missing API key for {source_name} (set {env_var} or credentials in kira-cite.json)")]
    #[diagnostic(help("both bibliographic sources require a static API key"))]
    MissingCredential {
        source_name: &'static str,
        env_var: &'static str,
    },

    #[error("{source_name} request for {target} failed: {message}")]
    SourceHttp {
        source_name: &'static str,
        target: String,
        message: String,
    },

    #[error("{source_name} returned status {status} for {target}: {message}")]
    SourceStatus {
        source_name: &'static str,
        target: String,
        status: u16,
        message: String,
    },

    #[error("{source_name} returned a malformed payload for {target}: {message}")]
    SourcePayload {
        source_name: &'static str,
        target: String,
        message: String,
    },

    #[error("failed to persist response cache at {path}: {message}")]
    #[diagnostic(help("newly fetched responses were not saved; fix the cache location and rerun"))]
    CacheWrite { path: String, message: String },

    #[error("no {table} row labelled {label:?}")]
    #[diagnostic(help("every article subject must be part of the configured subject list"))]
    LabelNotFound { table: &'static str, label: String },

    #[error("no article store at {0}")]
    #[diagnostic(help("run `kira-cite rebuild` to fetch articles and build the store"))]
    StoreMissing(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl CiteError {
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CiteError::SourceHttp { .. }
                | CiteError::SourceStatus { .. }
                | CiteError::SourcePayload { .. }
        )
    }
}

impl From<rusqlite::Error> for CiteError {
    fn from(err: rusqlite::Error) -> Self {
        CiteError::Database(err.to_string())
    }
}
