pub mod plos;
pub mod semantic_scholar;
pub mod springer;

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::{info, warn};

use crate::cache::{CacheStore, fingerprint};
use crate::domain::{Doi, ImpactMetrics, NormalizedDocument, UNKNOWN};
use crate::error::CiteError;

pub use plos::PlosSource;
pub use semantic_scholar::SemanticScholarSource;
pub use springer::SpringerSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    List(Vec<String>),
}

impl ParamValue {
    pub fn render(&self) -> String {
        match self {
            ParamValue::Single(value) => value.clone(),
            ParamValue::List(values) => format!("[{}]", values.join(",")),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRequest {
    pub source_name: &'static str,
    pub target: String,
    pub base_url: String,
    pub params: Vec<(&'static str, ParamValue)>,
}

impl SourceRequest {
    pub fn fingerprint(&self) -> String {
        fingerprint(
            &self.base_url,
            self.params.iter().map(|(key, value)| (*key, value.render())),
        )
    }

    pub fn query_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs = Vec::new();
        for (key, value) in &self.params {
            match value {
                ParamValue::Single(value) => pairs.push((*key, value.as_str())),
                ParamValue::List(values) => {
                    pairs.extend(values.iter().map(|value| (*key, value.as_str())))
                }
            }
        }
        pairs
    }
}

pub trait HttpTransport: Send + Sync {
    fn get_json(&self, request: &SourceRequest) -> Result<Value, CiteError>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    fn get_json(&self, request: &SourceRequest) -> Result<Value, CiteError> {
        (**self).get_json(request)
    }
}

pub trait BibliographicSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn search_request(&self, subject: &str) -> SourceRequest;
    fn normalize(&self, subject: &str, payload: &Value) -> Vec<NormalizedDocument>;
}

pub trait ImpactSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn lookup_request(&self, doi: &Doi) -> SourceRequest;
    fn extract_metrics(&self, payload: &Value) -> ImpactMetrics;
}

pub struct SourceClient<T: HttpTransport> {
    transport: T,
    cache: CacheStore,
}

impl<T: HttpTransport> SourceClient<T> {
    pub fn new(transport: T, cache: CacheStore) -> Self {
        Self { transport, cache }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn search(
        &mut self,
        source: &dyn BibliographicSource,
        subject: &str,
    ) -> Result<Vec<NormalizedDocument>, CiteError> {
        let request = source.search_request(subject);
        info!(source = source.name(), subject, "searching");
        let transport = &self.transport;
        let payload = self
            .cache
            .get_or_fetch(&request.fingerprint(), || transport.get_json(&request))?;
        Ok(source.normalize(subject, payload))
    }

    // Transport failures degrade to unknown metrics; cache write failures do not.
    pub fn impact(
        &mut self,
        source: &dyn ImpactSource,
        doi: &Doi,
    ) -> Result<ImpactMetrics, CiteError> {
        let request = source.lookup_request(doi);
        let transport = &self.transport;
        match self
            .cache
            .get_or_fetch(&request.fingerprint(), || transport.get_json(&request))
        {
            Ok(payload) => Ok(source.extract_metrics(payload)),
            Err(err) if err.is_transport() => {
                warn!(source = source.name(), doi = %doi, error = %err, "impact lookup failed, metrics unknown");
                Ok(ImpactMetrics::unknown())
            }
            Err(err) => Err(err),
        }
    }
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, CiteError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("kira-cite/", env!("CARGO_PKG_VERSION"))),
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| CiteError::SourceHttp {
                source_name: "http",
                target: "client".to_string(),
                message: err.to_string(),
            })?;
        Ok(Self { client })
    }

    fn send_with_retries(
        &self,
        request: &SourceRequest,
    ) -> Result<reqwest::blocking::Response, CiteError> {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let pairs = request.query_pairs();
        let mut attempt = 0usize;
        loop {
            let response = self.client.get(&request.base_url).query(&pairs).send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(CiteError::SourceHttp {
                        source_name: request.source_name,
                        target: request.target.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }
    }
}

impl HttpTransport for ReqwestTransport {
    fn get_json(&self, request: &SourceRequest) -> Result<Value, CiteError> {
        let response = self.send_with_retries(request)?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "request failed".to_string());
            return Err(CiteError::SourceStatus {
                source_name: request.source_name,
                target: request.target.clone(),
                status,
                message,
            });
        }
        response.json().map_err(|err| CiteError::SourcePayload {
            source_name: request.source_name,
            target: request.target.clone(),
            message: err.to_string(),
        })
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

pub(crate) fn text_or_unknown(value: Option<&Value>) -> String {
    value
        .and_then(|value| value.as_str())
        .map(|value| value.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

pub(crate) fn title_or_unknown(value: Option<&Value>) -> String {
    value
        .and_then(|value| value.as_str())
        .map(|value| value.replace('\n', ""))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

pub(crate) fn first_text_or_unknown(value: Option<&Value>) -> String {
    text_or_unknown(
        value
            .and_then(|value| value.as_array())
            .and_then(|array| array.first()),
    )
}

pub(crate) fn year_or_unknown(value: Option<&Value>) -> String {
    value
        .and_then(|value| value.as_str())
        .and_then(|date| date.get(..4))
        .filter(|year| year.chars().all(|ch| ch.is_ascii_digit()))
        .map(|year| year.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}
