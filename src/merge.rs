use std::collections::BTreeMap;

use tracing::info;

use crate::domain::{Doi, MergedArticle, NormalizedDocument};
use crate::error::CiteError;
use crate::providers::{BibliographicSource, HttpTransport, ImpactSource, SourceClient};

pub type ArticleMap = BTreeMap<Doi, MergedArticle>;

pub struct RecordMerger<T: HttpTransport> {
    client: SourceClient<T>,
    sources: Vec<Box<dyn BibliographicSource>>,
    impact: Box<dyn ImpactSource>,
}

impl<T: HttpTransport> RecordMerger<T> {
    pub fn new(
        client: SourceClient<T>,
        sources: Vec<Box<dyn BibliographicSource>>,
        impact: Box<dyn ImpactSource>,
    ) -> Self {
        Self {
            client,
            sources,
            impact,
        }
    }

    pub fn client(&self) -> &SourceClient<T> {
        &self.client
    }

    pub fn ingest(&mut self, subject: &str) -> Result<ArticleMap, CiteError> {
        let mut documents: BTreeMap<Doi, NormalizedDocument> = BTreeMap::new();
        for source in &self.sources {
            let batch = self.client.search(source.as_ref(), subject)?;
            info!(source = source.name(), subject, documents = batch.len(), "source results");
            for document in batch {
                documents.insert(document.doi.clone(), document);
            }
        }

        let mut articles = ArticleMap::new();
        for (doi, document) in documents {
            let metrics = self.client.impact(self.impact.as_ref(), &doi)?;
            articles.insert(doi, MergedArticle::new(document, metrics));
        }
        Ok(articles)
    }

    pub fn ingest_all(&mut self, subjects: &[String]) -> Result<ArticleMap, CiteError> {
        let mut combined = ArticleMap::new();
        for subject in subjects {
            let batch = self.ingest(subject)?;
            combined.extend(batch);
        }
        info!(subjects = subjects.len(), articles = combined.len(), "ingestion finished");
        Ok(combined)
    }
}
