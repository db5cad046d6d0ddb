use std::time::Duration;

use thiserror::Error;

use crate::extract::ExtractionError;
use crate::jobs::StoreError;
use crate::llm_client::LlmError;

/// Failure of one CV-processing job. Every variant aborts the whole job;
/// no partial result is ever stored.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("LLM error: {0}")]
    Gateway(#[from] LlmError),

    /// The ranking call must return one analysis per input summary.
    #[error("Ranking returned {actual} analyses for {expected} CVs")]
    Alignment { expected: usize, actual: usize },

    #[error("Job store error: {0}")]
    Store(#[from] StoreError),

    #[error("Job exceeded its time budget of {}s", .0.as_secs())]
    Timeout(Duration),
}
