use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_citations::app::{App, DEFAULT_SAMPLE_SIZE, ReportView};
use kira_citations::config::ConfigLoader;
use kira_citations::error::CiteError;
use kira_citations::output::{JsonOutput, LogSink, OutputMode, TextOutput};
use kira_citations::providers::ReqwestTransport;

#[derive(Parser)]
#[command(name = "kira-cite")]
#[command(about = "Journal article citation aggregator (Springer + PLOS + Semantic Scholar)")]
#[command(version, author)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to kira-cite.json
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch all subjects and rebuild the article store")]
    Rebuild,
    #[command(about = "Show an aggregate view of the article store")]
    Report(ReportArgs),
}

#[derive(Args)]
struct ReportArgs {
    #[arg(value_enum)]
    view: ReportView,

    /// Number of articles for the `list` view
    #[arg(long, default_value_t = DEFAULT_SAMPLE_SIZE)]
    limit: usize,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<CiteError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CiteError) -> u8 {
    match error {
        CiteError::SourceHttp { .. }
        | CiteError::SourceStatus { .. }
        | CiteError::SourcePayload { .. } => 3,
        CiteError::LabelNotFound { .. }
        | CiteError::StoreMissing(_)
        | CiteError::MissingCredential { .. }
        | CiteError::InvalidSubject(_)
        | CiteError::ConfigRead(_)
        | CiteError::ConfigParse(_) => 2,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let transport = ReqwestTransport::new()?;
    let app = App::new(config, transport);

    match cli.command {
        Commands::Rebuild => {
            let result = match output_mode {
                OutputMode::Json => app.rebuild(&JsonOutput)?,
                OutputMode::Text => app.rebuild(&LogSink)?,
            };
            match output_mode {
                OutputMode::Json => JsonOutput::print_rebuild(&result).into_diagnostic()?,
                OutputMode::Text => TextOutput::print_rebuild(&result),
            }
        }
        Commands::Report(args) => {
            let result = app.report(args.view, args.limit, &LogSink)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_report(&result).into_diagnostic()?,
                OutputMode::Text => TextOutput::print_report(&result),
            }
        }
    }
    Ok(())
}
