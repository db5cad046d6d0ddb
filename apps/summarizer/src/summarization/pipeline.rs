//! CV Summarization Pipeline: orchestrates one submitted job end to end.
//!
//! Flow: group images → extract text (PDFs, then image groups) → summarize
//!       each CV → rank (only with a role query) → merge + sort →
//!       terminal record update → delete transient files.
//!
//! Output order is deterministic for a given input order. Any failure before
//! the record update turns the job FAILED; the files are removed on every path.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::errors::PipelineError;
use crate::extract::TextExtractor;
use crate::jobs::{JobOutcome, JobRecord, JobStore, StoreError};
use crate::models::analysis::{CombinedCv, CvSummary, JobResult, RankingResult, SummaryResult};
use crate::summarization::gateway::CvAnalyst;
use crate::summarization::grouping::{group_images, ImagePage};

// ────────────────────────────────────────────────────────────────────────────
// Job input
// ────────────────────────────────────────────────────────────────────────────

/// Everything the pipeline needs to process one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizeJob {
    pub request_id: String,
    /// One CV per PDF, in submission order.
    pub pdfs: Vec<PathBuf>,
    /// Page images; grouped into CVs by `group_key`.
    pub images: Vec<ImagePage>,
    pub query: Option<String>,
}

impl SummarizeJob {
    /// The role description, if one was given and is not blank.
    pub fn role_query(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }

    /// Every transient file owned by this job.
    pub fn input_paths(&self) -> Vec<PathBuf> {
        self.pdfs
            .iter()
            .cloned()
            .chain(self.images.iter().map(|page| page.path.clone()))
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

pub struct Pipeline {
    store: Arc<dyn JobStore>,
    extractor: Arc<dyn TextExtractor>,
    analyst: Arc<dyn CvAnalyst>,
    job_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn JobStore>,
        extractor: Arc<dyn TextExtractor>,
        analyst: Arc<dyn CvAnalyst>,
        job_timeout: Duration,
    ) -> Self {
        Self {
            store,
            extractor,
            analyst,
            job_timeout,
        }
    }

    /// Runs the job and applies its single terminal update.
    ///
    /// On success the record becomes SUCCESS with the result. On any processing
    /// failure (including the time budget running out) the record becomes
    /// FAILED with no result and the original error is returned. A store
    /// failure on the success path is returned as-is, without a FAILED update.
    pub async fn run(&self, job: SummarizeJob) -> Result<JobRecord, PipelineError> {
        let started = Instant::now();
        let request_id = job.request_id.as_str();
        info!(request_id, "Starting CV processing job");

        let processed = match tokio::time::timeout(self.job_timeout, self.process(&job)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(PipelineError::Timeout(self.job_timeout)),
        };

        let reconciled = match processed {
            Ok(result) => {
                info!(request_id, "Updating job record with result");
                self.store
                    .update(request_id, JobOutcome::Succeeded(result))
                    .await
                    .map_err(PipelineError::from)
            }
            Err(e) => Err(self.mark_failed(request_id, e).await),
        };

        remove_transient_files(request_id, &job.input_paths()).await;

        info!(
            request_id,
            "Processed CVs in {:.2}s",
            started.elapsed().as_secs_f64()
        );
        reconciled
    }

    /// Grouping through ranking; everything before the record update.
    async fn process(&self, job: &SummarizeJob) -> Result<JobResult, PipelineError> {
        let request_id = job.request_id.as_str();

        if self.store.get(request_id).await?.is_none() {
            return Err(StoreError::NotFound(request_id.to_string()).into());
        }

        // Step 1: Group page images into logical CVs
        info!(request_id, "Grouping {} image files", job.images.len());
        let groups = group_images(&job.images);

        // Step 2: Extract text, PDFs first, then image groups
        let mut cv_texts = Vec::with_capacity(job.pdfs.len() + groups.len());

        info!(request_id, "Extracting text from {} PDFs", job.pdfs.len());
        for path in &job.pdfs {
            cv_texts.push(self.extractor.extract_pdf(path).await?);
        }

        if !groups.is_empty() {
            info!(request_id, "Extracting text from {} image groups", groups.len());
            for (key, pages) in groups.iter() {
                debug!(request_id, "OCR for group '{key}' ({} pages)", pages.len());
                cv_texts.push(self.extractor.extract_image_group(pages).await?);
            }
        }

        // Step 3: Summarize every CV, keeping text order
        info!(request_id, "Summarizing {} CVs", cv_texts.len());
        let mut summaries = Vec::with_capacity(cv_texts.len());
        for text in &cv_texts {
            summaries.push(self.analyst.summarize(text).await?);
        }

        // Step 4: Rank against the role query, or just sort the summaries
        match job.role_query() {
            Some(query) => {
                info!(request_id, "Ranking CVs against role query");
                let ranking = self.rank(query, summaries).await?;
                Ok(JobResult::Ranking(ranking))
            }
            None => {
                info!(request_id, "Sorting CV summaries by score");
                Ok(JobResult::Summary(SummaryResult::sorted(summaries)))
            }
        }
    }

    async fn rank(
        &self,
        query: &str,
        summaries: Vec<CvSummary>,
    ) -> Result<RankingResult, PipelineError> {
        if summaries.is_empty() {
            return Ok(RankingResult::sorted(String::new(), Vec::new()));
        }

        let batch = self.analyst.rank(query, &summaries).await?;
        if batch.summaries.len() != summaries.len() {
            return Err(PipelineError::Alignment {
                expected: summaries.len(),
                actual: batch.summaries.len(),
            });
        }

        let merged: Vec<CombinedCv> = summaries
            .into_iter()
            .zip(batch.summaries)
            .map(|(summary, ranking)| CombinedCv::merge(summary, ranking))
            .collect();

        Ok(RankingResult::sorted(batch.cvs_analysis, merged))
    }

    /// Moves the record to FAILED and hands back the error to surface.
    /// If the record itself cannot be updated, that store error wins.
    async fn mark_failed(&self, request_id: &str, cause: PipelineError) -> PipelineError {
        error!(request_id, "CV processing failed: {cause}");
        if let PipelineError::Extraction(e) = &cause {
            warn!(request_id, "Unreadable input file: {}", e.path().display());
        }
        match self.store.update(request_id, JobOutcome::Failed).await {
            Ok(_) => cause,
            Err(store_err) => {
                error!(request_id, "Could not mark job as FAILED: {store_err}");
                PipelineError::Store(store_err)
            }
        }
    }
}

/// Deletes every input file that still exists. Never fails the job.
pub async fn remove_transient_files(request_id: &str, paths: &[PathBuf]) {
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(request_id, "Failed to remove {}: {e}", path.display()),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
