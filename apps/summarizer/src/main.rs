use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cv_summarizer::config::Config;
use cv_summarizer::extract::FileKind;
use cv_summarizer::jobs::{JobStatus, DEFAULT_PAGE_SIZE};
use cv_summarizer::models::analysis::JobResult;
use cv_summarizer::state::{check_health, AppState};
use cv_summarizer::submission::{ManualRecord, Submission, UploadedFile};

#[derive(Parser, Debug)]
#[command(name = "cv-summarizer", version, about = "Summarize and rank CVs with an LLM")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit CV files, wait for the job and print the final record.
    Submit {
        #[arg(long)]
        user_id: i64,

        /// Role description; ranks the CVs against it when given.
        #[arg(long)]
        query: Option<String>,

        /// CV group for each image file, in the order the images are listed.
        /// Images without one are grouped by file name prefix.
        #[arg(long = "group")]
        groups: Vec<String>,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print one job record.
    Show { request_id: String },

    /// List job records, newest first.
    List {
        #[arg(long, default_value_t = 0)]
        skip: i64,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: i64,
    },

    /// Full-text search over role queries.
    Search {
        text: String,
        #[arg(long, default_value_t = 0)]
        skip: i64,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: i64,
    },

    /// Store a record produced outside the pipeline.
    Record {
        #[arg(long)]
        user_id: i64,
        #[arg(long)]
        request_id: Option<String>,
        #[arg(long)]
        query: Option<String>,
        #[arg(long, value_parser = parse_status)]
        status: JobStatus,
        /// JSON file holding the job result.
        #[arg(long)]
        result: Option<PathBuf>,
    },

    /// Check database connectivity and OCR availability.
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("cv_summarizer={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting CV summarizer v{}", env!("CARGO_PKG_VERSION"));

    // Health must work without a reachable database
    if let Command::Health = cli.command {
        return print_json(&check_health(&config).await?);
    }

    let state = AppState::build(&config).await?;
    let outcome = run(&state, &config, cli.command).await;
    state.db.close().await;
    outcome
}

async fn run(state: &AppState, config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Submit {
            user_id,
            query,
            groups,
            files,
        } => {
            let files = read_uploads(&files, groups).await?;
            let submitted = state
                .submissions
                .submit(Submission {
                    user_id,
                    query,
                    files,
                })
                .await?;
            let request_id = submitted.record.request_id.clone();
            info!("Submitted job {request_id}");

            match submitted.handle.await? {
                Ok(record) => print_json(&record),
                Err(e) => {
                    error!("Job {request_id} failed: {e}");
                    if let Some(record) = state.store.get(&request_id).await? {
                        print_json(&record)?;
                    }
                    Err(e.into())
                }
            }
        }
        Command::Show { request_id } => match state.store.get(&request_id).await? {
            Some(record) => print_json(&record),
            None => bail!("Job record '{request_id}' not found"),
        },
        Command::List { skip, limit } => print_json(&state.store.list(skip, limit).await?),
        Command::Search { text, skip, limit } => {
            print_json(&state.store.search(&text, skip, limit).await?)
        }
        Command::Record {
            user_id,
            request_id,
            query,
            status,
            result,
        } => {
            let result = match result {
                Some(path) => Some(read_result(&path).await?),
                None => None,
            };
            let record = state
                .submissions
                .create_record(ManualRecord {
                    request_id,
                    user_id,
                    query,
                    status,
                    result,
                })
                .await?;
            print_json(&record)
        }
        Command::Health => print_json(&check_health(config).await?),
    }
}

/// Loads local files as uploads. The i-th `--group` labels the i-th image.
async fn read_uploads(paths: &[PathBuf], groups: Vec<String>) -> Result<Vec<UploadedFile>> {
    let mut groups = groups.into_iter();
    let mut uploads = Vec::with_capacity(paths.len());

    for path in paths {
        let content_type = FileKind::content_type_for(path).unwrap_or("application/octet-stream");
        let group = match FileKind::from_content_type(content_type) {
            Some(FileKind::Image) => groups.next(),
            _ => None,
        };
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;

        uploads.push(UploadedFile {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            content_type: content_type.to_string(),
            group,
            bytes: Bytes::from(bytes),
        });
    }

    Ok(uploads)
}

async fn read_result(path: &Path) -> Result<JobResult> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid job result in {}", path.display()))
}

fn parse_status(raw: &str) -> Result<JobStatus, String> {
    JobStatus::parse(&raw.to_ascii_uppercase())
        .ok_or_else(|| format!("expected PENDING, SUCCESS or FAILED, got '{raw}'"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
