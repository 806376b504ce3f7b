use std::sync::LazyLock;

use reqwest::Url;
use serde_json::Value;

use super::{ImpactSource, SourceRequest};
use crate::domain::{Doi, ImpactMetrics, Metric};

static SEMANTIC_SCHOLAR_BASE: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://api.semanticscholar.org/v1/paper/").expect("base URL is valid")
});

// DOI suffixes may contain `?`, `#` or `%`; every segment is percent-encoded.
fn paper_url(doi: &Doi) -> String {
    let mut url = SEMANTIC_SCHOLAR_BASE.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().extend(doi.as_str().split('/'));
    }
    url.to_string()
}

#[derive(Debug, Clone, Default)]
pub struct SemanticScholarSource;

impl SemanticScholarSource {
    pub fn new() -> Self {
        Self
    }
}

impl ImpactSource for SemanticScholarSource {
    fn name(&self) -> &'static str {
        "semantic-scholar"
    }

    fn lookup_request(&self, doi: &Doi) -> SourceRequest {
        SourceRequest {
            source_name: self.name(),
            target: doi.to_string(),
            base_url: paper_url(doi),
            params: vec![("include_unknown_references", "true".into())],
        }
    }

    fn extract_metrics(&self, payload: &Value) -> ImpactMetrics {
        let citation_count = payload
            .get("citations")
            .and_then(|value| value.as_array())
            .map(|citations| Metric::Count(citations.len() as u64))
            .unwrap_or(Metric::Unknown);
        let influential_citation_count = payload
            .get("influentialCitationCount")
            .and_then(|value| value.as_u64())
            .map(Metric::Count)
            .unwrap_or(Metric::Unknown);
        ImpactMetrics {
            citation_count,
            influential_citation_count,
        }
    }
}
