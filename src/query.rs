use rusqlite::{Connection, params};
use serde::Serialize;

use crate::domain::{Metric, UNKNOWN};
use crate::error::CiteError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMean {
    pub label: String,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectImpact {
    pub subject: String,
    pub avg_citations: f64,
    pub avg_influential: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleSample {
    pub doi: String,
    pub title: String,
    pub subject: String,
    pub year: String,
    pub access_level: String,
    pub citation_count: Metric,
    pub influential_citation_count: Metric,
}

pub struct AggregateQueryEngine<'a> {
    conn: &'a Connection,
}

impl<'a> AggregateQueryEngine<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn citations_by_access(&self) -> Result<Vec<GroupMean>, CiteError> {
        self.group_means(
            "SELECT C.AccessLevel, AVG(A.CitationCount)
             FROM Articles AS A
             JOIN AccessLevels AS C ON A.AccessLevelId = C.Id
             WHERE A.CitationCount IS NOT ?1
             GROUP BY C.AccessLevel
             ORDER BY C.AccessLevel",
        )
    }

    pub fn influence_by_access(&self) -> Result<Vec<GroupMean>, CiteError> {
        self.group_means(
            "SELECT C.AccessLevel, AVG(A.InfluentialCitations)
             FROM Articles AS A
             JOIN AccessLevels AS C ON A.AccessLevelId = C.Id
             WHERE A.InfluentialCitations IS NOT ?1
             GROUP BY C.AccessLevel
             ORDER BY C.AccessLevel",
        )
    }

    pub fn citations_by_year(&self) -> Result<Vec<GroupMean>, CiteError> {
        self.group_means(
            "SELECT PubDate, AVG(CitationCount)
             FROM Articles
             WHERE CitationCount IS NOT ?1
             GROUP BY PubDate
             ORDER BY PubDate",
        )
    }

    pub fn citations_by_subject(&self) -> Result<Vec<SubjectImpact>, CiteError> {
        let mut stmt = self.conn.prepare(
            "SELECT S.Subject, AVG(A.CitationCount), AVG(A.InfluentialCitations)
             FROM Articles AS A
             JOIN Subjects AS S ON A.SubjectId = S.Id
             WHERE A.CitationCount IS NOT ?1 AND A.InfluentialCitations IS NOT ?1
             GROUP BY S.Subject
             ORDER BY S.Subject",
        )?;
        let rows = stmt
            .query_map(params![UNKNOWN], |row| {
                Ok(SubjectImpact {
                    subject: row.get(0)?,
                    avg_citations: row.get(1)?,
                    avg_influential: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn sample_articles(&self, limit: usize) -> Result<Vec<ArticleSample>, CiteError> {
        let mut stmt = self.conn.prepare(
            "SELECT A.DOI, A.Title, S.Subject, A.PubDate, C.AccessLevel,
                    A.CitationCount, A.InfluentialCitations
             FROM Articles AS A
             JOIN Subjects AS S ON A.SubjectId = S.Id
             JOIN AccessLevels AS C ON A.AccessLevelId = C.Id
             WHERE A.CitationCount IS NOT ?1 AND A.InfluentialCitations IS NOT ?1
             ORDER BY RANDOM()
             LIMIT ?2",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![UNKNOWN, limit], |row| {
                Ok(ArticleSample {
                    doi: row.get(0)?,
                    title: row.get(1)?,
                    subject: row.get(2)?,
                    year: row.get(3)?,
                    access_level: row.get(4)?,
                    citation_count: row.get(5)?,
                    influential_citation_count: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn group_means(&self, sql: &str) -> Result<Vec<GroupMean>, CiteError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params![UNKNOWN], |row| {
                Ok(GroupMean {
                    label: row.get(0)?,
                    mean: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
