//! Job records: one persisted record per submitted request.
//!
//! State machine: `PENDING` → `SUCCESS` | `FAILED`. Both terminal states are
//! final; the result is set on the success edge and cleared on the failure edge.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod runner;

use crate::models::analysis::JobResult;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Success,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Success => "SUCCESS",
            JobStatus::Failed => "FAILED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "PENDING" => Some(JobStatus::Pending),
            "SUCCESS" => Some(JobStatus::Success),
            "FAILED" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }

    pub const ALL: [JobStatus; 3] = [JobStatus::Pending, JobStatus::Success, JobStatus::Failed];

    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(self, JobStatus::Pending) && next.is_terminal()
    }

    /// States from which `next` may be entered.
    pub fn sources_of(next: JobStatus) -> Vec<JobStatus> {
        Self::ALL
            .into_iter()
            .filter(|from| from.can_transition_to(next))
            .collect()
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub request_id: String,
    pub user_id: i64,
    pub query: Option<String>,
    pub status: JobStatus,
    pub result: Option<JobResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
}

impl JobRecord {
    /// A fresh record as created at submission time.
    pub fn pending(request_id: impl Into<String>, user_id: i64, query: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            request_id: request_id.into(),
            user_id,
            query,
            status: JobStatus::Pending,
            result: None,
            created_at: now,
            updated_at: None,
            timestamp: now,
        }
    }
}

/// The single terminal update a pipeline run applies to its record.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Succeeded(JobResult),
    Failed,
}

impl JobOutcome {
    pub fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Succeeded(_) => JobStatus::Success,
            JobOutcome::Failed => JobStatus::Failed,
        }
    }

    pub fn into_result(self) -> Option<JobResult> {
        match self {
            JobOutcome::Succeeded(result) => Some(result),
            JobOutcome::Failed => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("A job record with request_id '{0}' already exists")]
    Conflict(String),

    #[error("Job record '{0}' not found")]
    NotFound(String),

    #[error("Job record '{request_id}' cannot move from {from} to {to}")]
    InvalidTransition {
        request_id: String,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Corrupt job record '{request_id}': {reason}")]
    Corrupt { request_id: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence seam for job records. Constructed once at startup and
/// injected wherever records are read or written.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Inserts a record; `Conflict` if the request_id is taken.
    async fn create(&self, record: JobRecord) -> Result<JobRecord, StoreError>;

    async fn get(&self, request_id: &str) -> Result<Option<JobRecord>, StoreError>;

    /// Applies the terminal outcome to a `PENDING` record and stamps `updated_at`.
    async fn update(&self, request_id: &str, outcome: JobOutcome) -> Result<JobRecord, StoreError>;

    /// Newest first.
    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<JobRecord>, StoreError>;

    /// Full-text search over the stored role query, newest first.
    async fn search(&self, text: &str, skip: i64, limit: i64) -> Result<Vec<JobRecord>, StoreError>;
}

pub fn clamp_page(skip: i64, limit: i64) -> (i64, i64) {
    (skip.max(0), limit.clamp(1, MAX_PAGE_SIZE))
}
