use serde_json::Value;
use tracing::{debug, warn};

use super::{
    BibliographicSource, SourceRequest, first_text_or_unknown, text_or_unknown, title_or_unknown,
    year_or_unknown,
};
use crate::domain::{Doi, NormalizedDocument, OpenAccess};

const PLOS_BASE: &str = "http://api.plos.org/search";
pub const PLOS_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone)]
pub struct PlosSource {
    api_key: String,
}

impl PlosSource {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

impl BibliographicSource for PlosSource {
    fn name(&self) -> &'static str {
        "plos"
    }

    fn search_request(&self, subject: &str) -> SourceRequest {
        SourceRequest {
            source_name: self.name(),
            target: subject.to_string(),
            base_url: PLOS_BASE.to_string(),
            params: vec![
                ("api_key", self.api_key.as_str().into()),
                ("q", format!("abstract:{subject}").into()),
                ("rows", PLOS_PAGE_SIZE.to_string().into()),
                ("wt", "json".into()),
            ],
        }
    }

    fn normalize(&self, subject: &str, payload: &Value) -> Vec<NormalizedDocument> {
        let Some(docs) = payload
            .get("response")
            .and_then(|value| value.get("docs"))
            .and_then(|value| value.as_array())
        else {
            warn!(source = self.name(), subject, "payload has no response.docs array");
            return Vec::new();
        };

        docs.iter()
            .take(PLOS_PAGE_SIZE)
            .filter_map(|doc| {
                let raw_id = doc.get("id").and_then(|value| value.as_str());
                let Some(Ok(doi)) = raw_id.map(str::parse::<Doi>) else {
                    debug!(source = self.name(), id = ?raw_id, "skipping doc without DOI");
                    return None;
                };
                Some(NormalizedDocument {
                    doi,
                    title: title_or_unknown(doc.get("title_display")),
                    author: first_text_or_unknown(doc.get("author_display")),
                    year: year_or_unknown(doc.get("publication_date")),
                    journal: text_or_unknown(doc.get("journal")),
                    subject: subject.to_string(),
                    publisher: "PLOS".to_string(),
                    open_access: OpenAccess::Open,
                })
            })
            .collect()
    }
}
