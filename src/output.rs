use std::io::{self, Write};
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::app::{ProgressEvent, ProgressSink, RebuildResult, ReportResult};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_rebuild(result: &RebuildResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_report(result: &ReportResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => info!(elapsed_ms = elapsed_ms(elapsed), "{}", event.message),
            None => info!("{}", event.message),
        }
    }
}

fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_rebuild(result: &RebuildResult) {
        println!("Rebuilt article store at {}", result.built_at);
        for subject in &result.subjects {
            println!("  {:<14} {:>4} articles", subject.subject, subject.articles);
        }
        println!(
            "{} articles, {} without citation data, {} cached responses",
            result.articles, result.unknown_metrics, result.cached_responses
        );
    }

    pub fn print_report(result: &ReportResult) {
        match result {
            ReportResult::Access(rows) | ReportResult::Year(rows) => {
                for row in rows {
                    println!("{}: {:.1} citations on average", row.label, row.mean);
                }
            }
            ReportResult::Influence(rows) => {
                for row in rows {
                    println!("{}: {:.1} influential citations on average", row.label, row.mean);
                }
            }
            ReportResult::Subject(rows) => {
                for row in rows {
                    println!(
                        "{}: {:.1} citation(s) (average), {:.1} influential citation(s) (average)",
                        row.subject, row.avg_citations, row.avg_influential
                    );
                }
            }
            ReportResult::List(rows) => {
                for row in rows {
                    println!(
                        "Subject: {} ({}), Access: {} - {} citation(s), {} influential citation(s)",
                        row.subject,
                        row.year,
                        row.access_level,
                        row.citation_count,
                        row.influential_citation_count
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_ms_saturates() {
        assert_eq!(elapsed_ms(Duration::from_millis(1500)), 1500);
        assert_eq!(elapsed_ms(Duration::MAX), u64::MAX);
    }
}
