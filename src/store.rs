// Dimension ids are only valid within one rebuild; articles resolve them by
// label at insert time.

use std::fs;

use camino::Utf8Path;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, ToSql, params};
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{AccessLevel, Doi, Metric, UNKNOWN};
use crate::error::CiteError;
use crate::merge::ArticleMap;
use crate::query::AggregateQueryEngine;

const DROP_TABLES: &str = "
    DROP TABLE IF EXISTS AccessLevels;
    DROP TABLE IF EXISTS Articles;
    DROP TABLE IF EXISTS Subjects;
";

// CitationCount and InfluentialCitations are BLOB-declared so SQLite applies
// no affinity: counts stay INTEGER and the sentinel stays TEXT.
const CREATE_TABLES: &str = "
    CREATE TABLE AccessLevels (
        Id INTEGER PRIMARY KEY AUTOINCREMENT,
        AccessLevel TEXT
    );
    CREATE TABLE Articles (
        Id INTEGER PRIMARY KEY AUTOINCREMENT,
        DOI TEXT,
        Title TEXT,
        Author TEXT,
        PubDate TEXT,
        Journal TEXT,
        SubjectId INTEGER,
        Publisher TEXT,
        AccessLevelId INTEGER,
        CitationCount BLOB,
        InfluentialCitations BLOB
    );
    CREATE TABLE Subjects (
        Id INTEGER PRIMARY KEY AUTOINCREMENT,
        Subject TEXT
    );
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PopulateSummary {
    pub subjects: usize,
    pub articles: usize,
    pub unknown_metrics: usize,
}

pub struct SchemaStore {
    conn: Connection,
}

impl SchemaStore {
    pub fn open(path: &Utf8Path) -> Result<Self, CiteError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| CiteError::Filesystem(err.to_string()))?;
        }
        let conn = Connection::open(path.as_std_path())?;
        debug!(path = %path, "opened article store");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, CiteError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn rebuild(&mut self) -> Result<(), CiteError> {
        let tx = self.conn.transaction()?;
        create_schema(&tx)?;
        tx.commit()?;
        info!("article store rebuilt");
        Ok(())
    }

    pub fn populate(
        &mut self,
        articles: &ArticleMap,
        subjects: &[String],
    ) -> Result<PopulateSummary, CiteError> {
        let tx = self.conn.transaction()?;
        let summary = insert_rows(&tx, articles, subjects)?;
        tx.commit()?;
        info!(
            subjects = summary.subjects,
            articles = summary.articles,
            unknown_metrics = summary.unknown_metrics,
            "article store populated"
        );
        Ok(summary)
    }

    // rebuild + populate in one transaction
    pub fn reload(
        &mut self,
        articles: &ArticleMap,
        subjects: &[String],
    ) -> Result<PopulateSummary, CiteError> {
        let tx = self.conn.transaction()?;
        create_schema(&tx)?;
        let summary = insert_rows(&tx, articles, subjects)?;
        tx.commit()?;
        info!(
            subjects = summary.subjects,
            articles = summary.articles,
            unknown_metrics = summary.unknown_metrics,
            "article store reloaded"
        );
        Ok(summary)
    }

    pub fn queries(&self) -> AggregateQueryEngine<'_> {
        AggregateQueryEngine::new(&self.conn)
    }

    pub fn article_count(&self) -> Result<u64, CiteError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM Articles", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn subject_labels(&self) -> Result<Vec<String>, CiteError> {
        let mut stmt = self.conn.prepare("SELECT Subject FROM Subjects ORDER BY Id")?;
        let labels = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(labels)
    }

    pub fn access_level_of(&self, doi: &Doi) -> Result<Option<String>, CiteError> {
        let label = self
            .conn
            .query_row(
                "SELECT C.AccessLevel
                 FROM Articles AS A
                 JOIN AccessLevels AS C ON A.AccessLevelId = C.Id
                 WHERE A.DOI = ?1",
                params![doi.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(label)
    }
}

fn create_schema(conn: &Connection) -> Result<(), CiteError> {
    conn.execute_batch(DROP_TABLES)?;
    conn.execute_batch(CREATE_TABLES)?;
    Ok(())
}

fn insert_rows(
    conn: &Connection,
    articles: &ArticleMap,
    subjects: &[String],
) -> Result<PopulateSummary, CiteError> {
    for level in AccessLevel::ALL {
        conn.execute(
            "INSERT INTO AccessLevels (AccessLevel) VALUES (?1)",
            params![level.label()],
        )?;
    }
    for subject in subjects {
        conn.execute(
            "INSERT INTO Subjects (Subject) VALUES (?1)",
            params![subject],
        )?;
    }

    let mut insert = conn.prepare(
        "INSERT INTO Articles (
            DOI, Title, Author, PubDate, Journal, SubjectId,
            Publisher, AccessLevelId, CitationCount, InfluentialCitations
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;
    let mut unknown_metrics = 0usize;
    for article in articles.values() {
        let document = &article.document;
        let access_id = lookup_id(
            conn,
            "AccessLevels",
            "SELECT Id FROM AccessLevels WHERE AccessLevel = ?1",
            document.open_access.access_level().label(),
        )?;
        let subject_id = lookup_id(
            conn,
            "Subjects",
            "SELECT Id FROM Subjects WHERE Subject = ?1",
            &document.subject,
        )?;
        if article.citation_count.is_unknown() {
            unknown_metrics += 1;
        }
        insert.execute(params![
            document.doi.as_str(),
            document.title,
            document.author,
            document.year,
            document.journal,
            subject_id,
            document.publisher,
            access_id,
            article.citation_count,
            article.influential_citation_count,
        ])?;
    }

    Ok(PopulateSummary {
        subjects: subjects.len(),
        articles: articles.len(),
        unknown_metrics,
    })
}

fn lookup_id(
    conn: &Connection,
    table: &'static str,
    sql: &str,
    label: &str,
) -> Result<i64, CiteError> {
    conn.query_row(sql, params![label], |row| row.get(0))
        .optional()?
        .ok_or_else(|| CiteError::LabelNotFound {
            table,
            label: label.to_string(),
        })
}

impl ToSql for Metric {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Metric::Count(value) => {
                let value = i64::try_from(*value)
                    .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))?;
                Ok(ToSqlOutput::from(value))
            }
            Metric::Unknown => Ok(ToSqlOutput::from(UNKNOWN)),
        }
    }
}

impl FromSql for Metric {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(count) if count >= 0 => Ok(Metric::Count(count as u64)),
            ValueRef::Text(text) if text == UNKNOWN.as_bytes() => Ok(Metric::Unknown),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}
