use std::time::{Duration, Instant};

use clap::ValueEnum;
use serde::Serialize;

use crate::cache::CacheStore;
use crate::config::ResolvedConfig;
use crate::error::CiteError;
use crate::merge::{ArticleMap, RecordMerger};
use crate::providers::{
    BibliographicSource, HttpTransport, PlosSource, SemanticScholarSource, SourceClient,
    SpringerSource,
};
use crate::query::{ArticleSample, GroupMean, SubjectImpact};
use crate::store::SchemaStore;

pub const DEFAULT_SAMPLE_SIZE: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportView {
    /// Mean citations per access level
    Access,
    /// Mean influential citations per access level
    Influence,
    /// Mean citations per publication year
    Year,
    /// Mean citations and influential citations per subject
    Subject,
    /// Random sample of articles with known metrics
    List,
}

#[derive(Debug, Clone, Serialize)]
pub struct RebuildResult {
    pub subjects: Vec<SubjectCount>,
    pub articles: usize,
    pub unknown_metrics: usize,
    pub cached_responses: usize,
    pub built_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectCount {
    pub subject: String,
    pub articles: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", content = "rows", rename_all = "lowercase")]
pub enum ReportResult {
    Access(Vec<GroupMean>),
    Influence(Vec<GroupMean>),
    Year(Vec<GroupMean>),
    Subject(Vec<SubjectImpact>),
    List(Vec<ArticleSample>),
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<T: HttpTransport> {
    config: ResolvedConfig,
    transport: T,
}

impl<T: HttpTransport> App<T> {
    pub fn new(config: ResolvedConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn rebuild(&self, sink: &dyn ProgressSink) -> Result<RebuildResult, CiteError> {
        let sources: Vec<Box<dyn BibliographicSource>> = vec![
            Box::new(SpringerSource::new(self.config.credentials.springer()?)),
            Box::new(PlosSource::new(self.config.credentials.plos()?)),
        ];

        sink.event(ProgressEvent {
            message: format!("phase=Fetch; {} subjects", self.config.subjects.len()),
            elapsed: None,
        });
        let start = Instant::now();
        let cache = CacheStore::load(self.config.cache_path.clone());
        let client = SourceClient::new(&self.transport, cache);
        let mut merger = RecordMerger::new(client, sources, Box::new(SemanticScholarSource::new()));
        let articles = merger.ingest_all(&self.config.subjects)?;
        let cached_responses = merger.client().cache().len();
        sink.event(ProgressEvent {
            message: format!("phase=Fetch; {} articles merged", articles.len()),
            elapsed: Some(start.elapsed()),
        });

        sink.event(ProgressEvent {
            message: format!("phase=Store; writing {}", self.config.database_path),
            elapsed: None,
        });
        let start = Instant::now();
        let mut store = SchemaStore::open(&self.config.database_path)?;
        let summary = store.reload(&articles, &self.config.subjects)?;
        sink.event(ProgressEvent {
            message: "phase=Store; done".to_string(),
            elapsed: Some(start.elapsed()),
        });

        Ok(RebuildResult {
            subjects: subject_counts(&articles, &self.config.subjects),
            articles: summary.articles,
            unknown_metrics: summary.unknown_metrics,
            cached_responses,
            built_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    pub fn report(
        &self,
        view: ReportView,
        limit: usize,
        sink: &dyn ProgressSink,
    ) -> Result<ReportResult, CiteError> {
        let path = &self.config.database_path;
        if !path.as_std_path().exists() {
            return Err(CiteError::StoreMissing(path.to_string()));
        }
        sink.event(ProgressEvent {
            message: format!("phase=Query; {view:?}"),
            elapsed: None,
        });
        let store = SchemaStore::open(path)?;
        let queries = store.queries();
        let result = match view {
            ReportView::Access => ReportResult::Access(queries.citations_by_access()?),
            ReportView::Influence => ReportResult::Influence(queries.influence_by_access()?),
            ReportView::Year => ReportResult::Year(queries.citations_by_year()?),
            ReportView::Subject => ReportResult::Subject(queries.citations_by_subject()?),
            ReportView::List => ReportResult::List(queries.sample_articles(limit)?),
        };
        Ok(result)
    }
}

fn subject_counts(articles: &ArticleMap, subjects: &[String]) -> Vec<SubjectCount> {
    subjects
        .iter()
        .map(|subject| SubjectCount {
            subject: subject.clone(),
            articles: articles
                .values()
                .filter(|article| &article.document.subject == subject)
                .count(),
        })
        .collect()
}
