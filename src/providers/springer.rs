use serde_json::Value;
use tracing::{debug, warn};

use super::{
    BibliographicSource, ParamValue, SourceRequest, text_or_unknown, title_or_unknown,
    year_or_unknown,
};
use crate::domain::{Doi, NormalizedDocument, OpenAccess};

const SPRINGER_BASE: &str = "http://api.springer.com/meta/v1/json?";
pub const SPRINGER_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone)]
pub struct SpringerSource {
    api_key: String,
}

impl SpringerSource {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

impl BibliographicSource for SpringerSource {
    fn name(&self) -> &'static str {
        "springer"
    }

    fn search_request(&self, subject: &str) -> SourceRequest {
        SourceRequest {
            source_name: self.name(),
            target: subject.to_string(),
            base_url: SPRINGER_BASE.to_string(),
            params: vec![
                ("api_key", self.api_key.as_str().into()),
                (
                    "q",
                    ParamValue::List(vec![
                        format!("keyword:{subject}"),
                        "country:\"United States\"".to_string(),
                        "type:Journal".to_string(),
                    ]),
                ),
                ("p", SPRINGER_PAGE_SIZE.to_string().into()),
            ],
        }
    }

    fn normalize(&self, subject: &str, payload: &Value) -> Vec<NormalizedDocument> {
        let Some(records) = payload.get("records").and_then(|value| value.as_array()) else {
            warn!(source = self.name(), subject, "payload has no records array");
            return Vec::new();
        };

        records
            .iter()
            .take(SPRINGER_PAGE_SIZE)
            .filter_map(|record| {
                let raw_id = record.get("doi").and_then(|value| value.as_str());
                let doi = match raw_id.map(str::parse::<Doi>) {
                    Some(Ok(doi)) => doi,
                    _ => {
                        debug!(source = self.name(), id = ?raw_id, "skipping record without DOI");
                        return None;
                    }
                };
                let creator = record
                    .get("creators")
                    .and_then(|value| value.as_array())
                    .and_then(|array| array.first())
                    .and_then(|value| value.get("creator"));
                Some(NormalizedDocument {
                    doi,
                    title: title_or_unknown(record.get("title")),
                    author: text_or_unknown(creator),
                    year: year_or_unknown(record.get("publicationDate")),
                    journal: text_or_unknown(record.get("publicationName")),
                    subject: subject.to_string(),
                    publisher: text_or_unknown(record.get("publisher")),
                    open_access: parse_open_access(record.get("openaccess")),
                })
            })
            .collect()
    }
}

fn parse_open_access(value: Option<&Value>) -> OpenAccess {
    match value {
        Some(Value::Bool(true)) => OpenAccess::Open,
        Some(Value::Bool(false)) => OpenAccess::Subscription,
        Some(Value::String(flag)) if flag.eq_ignore_ascii_case("true") => OpenAccess::Open,
        Some(Value::String(flag)) if flag.eq_ignore_ascii_case("false") => {
            OpenAccess::Subscription
        }
        _ => OpenAccess::Unspecified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn open_access_flag_is_tri_state() {
        assert_eq!(parse_open_access(Some(&json!("true"))), OpenAccess::Open);
        assert_eq!(parse_open_access(Some(&json!(false))), OpenAccess::Subscription);
        assert_eq!(parse_open_access(Some(&json!("FALSE"))), OpenAccess::Subscription);
        assert_eq!(parse_open_access(Some(&json!("maybe"))), OpenAccess::Unspecified);
        assert_eq!(parse_open_access(None), OpenAccess::Unspecified);
    }
}
