use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::errors::PipelineError;
use crate::jobs::JobRecord;
use crate::summarization::pipeline::{Pipeline, SummarizeJob};

/// Runs pipeline jobs as background tokio tasks, detached from the caller.
///
/// The pipeline owns the terminal record update and file cleanup, so a
/// dropped handle still leaves the record in a final state.
#[derive(Clone)]
pub struct TaskRunner {
    pipeline: Arc<Pipeline>,
}

impl TaskRunner {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    pub fn spawn(&self, job: SummarizeJob) -> JoinHandle<Result<JobRecord, PipelineError>> {
        let pipeline = self.pipeline.clone();
        info!(request_id = %job.request_id, "Scheduling CV processing job");

        tokio::spawn(async move {
            let request_id = job.request_id.clone();
            let outcome = pipeline.run(job).await;
            match &outcome {
                Ok(record) => info!(%request_id, "Job finished with status {}", record.status),
                Err(e) => error!(%request_id, "Job failed: {e}"),
            }
            outcome
        })
    }
}
