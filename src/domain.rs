use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::CiteError;

pub const UNKNOWN: &str = "Unknown";

static DOI_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^10\.\d{4,9}/\S+$").expect("DOI pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Doi(String);

impl Doi {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Doi {
    type Err = CiteError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let stripped = ["https://doi.org/", "http://doi.org/", "http://dx.doi.org/", "doi:"]
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix))
            .unwrap_or(trimmed);
        if !DOI_PATTERN.is_match(stripped) {
            return Err(CiteError::InvalidDoi(value.to_string()));
        }
        Ok(Self(stripped.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenAccess {
    Open,
    Subscription,
    Unspecified,
}

impl OpenAccess {
    // Only an explicit `false` is subscription-only.
    pub fn access_level(self) -> AccessLevel {
        match self {
            OpenAccess::Subscription => AccessLevel::SubscriptionRequired,
            OpenAccess::Open | OpenAccess::Unspecified => AccessLevel::OpenAccess,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessLevel {
    OpenAccess,
    SubscriptionRequired,
}

impl AccessLevel {
    pub const ALL: [AccessLevel; 2] = [AccessLevel::OpenAccess, AccessLevel::SubscriptionRequired];

    pub fn label(self) -> &'static str {
        match self {
            AccessLevel::OpenAccess => "Open Access",
            AccessLevel::SubscriptionRequired => "Subscription Required",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Count(u64),
    Unknown,
}

impl Metric {
    pub fn is_unknown(self) -> bool {
        matches!(self, Metric::Unknown)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Count(value) => write!(f, "{value}"),
            Metric::Unknown => f.write_str(UNKNOWN),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Metric::Count(value) => serializer.serialize_u64(*value),
            Metric::Unknown => serializer.serialize_str(UNKNOWN),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImpactMetrics {
    pub citation_count: Metric,
    pub influential_citation_count: Metric,
}

impl ImpactMetrics {
    pub fn unknown() -> Self {
        Self {
            citation_count: Metric::Unknown,
            influential_citation_count: Metric::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedDocument {
    pub doi: Doi,
    pub title: String,
    pub author: String,
    pub year: String,
    pub journal: String,
    pub subject: String,
    pub publisher: String,
    pub open_access: OpenAccess,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedArticle {
    #[serde(flatten)]
    pub document: NormalizedDocument,
    pub citation_count: Metric,
    pub influential_citation_count: Metric,
}

impl MergedArticle {
    pub fn new(document: NormalizedDocument, metrics: ImpactMetrics) -> Self {
        Self {
            document,
            citation_count: metrics.citation_count,
            influential_citation_count: metrics.influential_citation_count,
        }
    }

    pub fn doi(&self) -> &Doi {
        &self.document.doi
    }
}

pub fn default_subjects() -> Vec<String> {
    [
        "Chemistry",
        "Immunology",
        "Nutrition",
        "Engineering",
        "Statistics",
        "Psychology",
        "Environment",
        "Education",
        "Law",
        "History",
    ]
    .iter()
    .map(|subject| subject.to_string())
    .collect()
}

pub fn validate_subjects(subjects: &[String]) -> Result<(), CiteError> {
    if subjects.is_empty() {
        return Err(CiteError::InvalidSubject(
            "subject list is empty".to_string(),
        ));
    }
    let mut seen = BTreeSet::new();
    for subject in subjects {
        if subject.trim().is_empty() || subject.trim() != subject {
            return Err(CiteError::InvalidSubject(format!("{subject:?}")));
        }
        if !seen.insert(subject.as_str()) {
            return Err(CiteError::InvalidSubject(format!("duplicate {subject:?}")));
        }
    }
    Ok(())
}
