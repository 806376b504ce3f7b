// The whole map is rewritten on every insert. Single writer only: concurrent
// runs against one cache path lose each other's inserts.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::CiteError;

pub fn fingerprint<'a, I>(base_url: &str, params: I) -> String
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let mut pairs: Vec<(&str, String)> = params.into_iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    let rendered: Vec<String> = pairs
        .into_iter()
        .map(|(key, value)| format!("{key}-{value}"))
        .collect();
    format!("{base_url}{}", rendered.join("_"))
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    path: Utf8PathBuf,
    entries: BTreeMap<String, Value>,
}

impl CacheStore {
    pub fn load(path: impl Into<Utf8PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(path.as_std_path()) {
            Ok(content) => match Self::parse(&content) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %path, error = %err, "response cache is unreadable, starting empty");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path, "no response cache yet");
                BTreeMap::new()
            }
            Err(err) => {
                warn!(path = %path, error = %err, "failed to read response cache, starting empty");
                BTreeMap::new()
            }
        };
        debug!(path = %path, entries = entries.len(), "response cache loaded");
        Self { path, entries }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.entries.contains_key(fingerprint)
    }

    pub fn get(&self, fingerprint: &str) -> Option<&Value> {
        self.entries.get(fingerprint)
    }

    pub fn get_or_fetch<F>(&mut self, fingerprint: &str, fetch: F) -> Result<&Value, CiteError>
    where
        F: FnOnce() -> Result<Value, CiteError>,
    {
        if self.entries.contains_key(fingerprint) {
            debug!(fingerprint, "cache hit");
        } else {
            debug!(fingerprint, "cache miss");
            let payload = fetch()?;
            self.entries.insert(fingerprint.to_string(), payload);
            if let Err(err) = self.persist() {
                self.entries.remove(fingerprint);
                return Err(err);
            }
        }
        Ok(&self.entries[fingerprint])
    }

    pub fn persist(&self) -> Result<(), CiteError> {
        let write_err = |message: String| CiteError::CacheWrite {
            path: self.path.to_string(),
            message,
        };
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
            _ => Utf8PathBuf::from("."),
        };
        fs::create_dir_all(parent.as_std_path()).map_err(|err| write_err(err.to_string()))?;
        let content = self.to_json().map_err(|err| write_err(err.to_string()))?;
        let mut temp = tempfile::Builder::new()
            .prefix("kira-cite-cache")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| write_err(err.to_string()))?;
        temp.write_all(content.as_bytes())
            .map_err(|err| write_err(err.to_string()))?;
        temp.persist(self.path.as_std_path())
            .map_err(|err| write_err(err.to_string()))?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.entries)
    }

    pub fn parse(content: &str) -> Result<BTreeMap<String, Value>, serde_json::Error> {
        serde_json::from_str(content)
    }
}
