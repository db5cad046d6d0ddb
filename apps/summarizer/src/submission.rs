//! Submission boundary: stages uploads, opens the PENDING record and hands
//! the job to the task runner.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::extract::FileKind;
use crate::jobs::runner::TaskRunner;
use crate::jobs::{JobRecord, JobStatus, JobStore, StoreError};
use crate::models::analysis::JobResult;
use crate::summarization::grouping::{filename_group_key, ImagePage};
use crate::summarization::pipeline::{remove_transient_files, SummarizeJob};

/// One uploaded file as received at the boundary.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    /// Explicit CV group for page images. Falls back to the file name prefix.
    pub group: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub user_id: i64,
    pub query: Option<String>,
    pub files: Vec<UploadedFile>,
}

/// A record written directly, outside the pipeline.
#[derive(Debug, Clone)]
pub struct ManualRecord {
    pub request_id: Option<String>,
    pub user_id: i64,
    pub query: Option<String>,
    pub status: JobStatus,
    pub result: Option<JobResult>,
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("failed to stage {path}: {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("a {status} record cannot carry a result")]
    UnexpectedResult { status: JobStatus },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The PENDING record plus the handle of the scheduled job.
pub struct Submitted {
    pub record: JobRecord,
    pub handle: JoinHandle<Result<JobRecord, PipelineError>>,
}

#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<dyn JobStore>,
    runner: TaskRunner,
    staging_dir: PathBuf,
}

impl SubmissionService {
    pub fn new(store: Arc<dyn JobStore>, runner: TaskRunner, staging_dir: PathBuf) -> Self {
        Self {
            store,
            runner,
            staging_dir,
        }
    }

    /// Stages the uploads and schedules processing. Does not wait for the job.
    pub async fn submit(&self, submission: Submission) -> Result<Submitted, SubmissionError> {
        self.submit_as(Uuid::new_v4().to_string(), submission).await
    }

    async fn submit_as(
        &self,
        request_id: String,
        submission: Submission,
    ) -> Result<Submitted, SubmissionError> {
        let job = self
            .stage(&request_id, submission.query.clone(), &submission.files)
            .await?;

        let pending = JobRecord::pending(&request_id, submission.user_id, submission.query);
        let record = match self.store.create(pending).await {
            Ok(record) => record,
            Err(e) => {
                remove_transient_files(&request_id, &job.input_paths()).await;
                return Err(e.into());
            }
        };

        info!(
            request_id = %request_id,
            "Accepted {} PDFs and {} images for user {}",
            job.pdfs.len(),
            job.images.len(),
            record.user_id
        );
        let handle = self.runner.spawn(job);
        Ok(Submitted { record, handle })
    }

    async fn stage(
        &self,
        request_id: &str,
        query: Option<String>,
        files: &[UploadedFile],
    ) -> Result<SummarizeJob, SubmissionError> {
        let mut job = SummarizeJob {
            request_id: request_id.to_string(),
            pdfs: Vec::new(),
            images: Vec::new(),
            query,
        };

        tokio::fs::create_dir_all(&self.staging_dir)
            .await
            .map_err(|source| SubmissionError::Staging {
                path: self.staging_dir.clone(),
                source,
            })?;

        for (index, file) in files.iter().enumerate() {
            let Some(kind) = FileKind::from_content_type(&file.content_type) else {
                warn!(
                    request_id,
                    "Skipping {} with unsupported content type '{}'",
                    file.file_name,
                    file.content_type
                );
                continue;
            };

            let path = self.staging_path(request_id, index, &file.file_name);
            if let Err(source) = tokio::fs::write(&path, &file.bytes).await {
                remove_transient_files(request_id, &job.input_paths()).await;
                return Err(SubmissionError::Staging { path, source });
            }

            match kind {
                FileKind::Pdf => job.pdfs.push(path),
                FileKind::Image => job.images.push(ImagePage {
                    path,
                    group_key: file
                        .group
                        .clone()
                        .unwrap_or_else(|| filename_group_key(&file.file_name)),
                }),
            }
        }

        Ok(job)
    }

    fn staging_path(&self, request_id: &str, index: usize, file_name: &str) -> PathBuf {
        self.staging_dir
            .join(format!("{request_id}_{index}_{}", sanitize_file_name(file_name)))
    }

    /// Inserts a record produced elsewhere. Only SUCCESS records carry a result.
    pub async fn create_record(&self, manual: ManualRecord) -> Result<JobRecord, SubmissionError> {
        if manual.result.is_some() && manual.status != JobStatus::Success {
            return Err(SubmissionError::UnexpectedResult {
                status: manual.status,
            });
        }

        let request_id = manual
            .request_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut record = JobRecord::pending(request_id, manual.user_id, manual.query);
        record.status = manual.status;
        record.result = manual.result;
        if manual.status.is_terminal() {
            record.updated_at = Some(Utc::now());
        }

        Ok(self.store.create(record).await?)
    }
}

/// Keeps only the final path component, with anything unusual replaced by `_`.
fn sanitize_file_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
