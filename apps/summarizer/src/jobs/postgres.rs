use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::jobs::{clamp_page, JobOutcome, JobRecord, JobStatus, JobStore, StoreError};
use crate::models::analysis::JobResult;

#[derive(Debug, FromRow)]
struct JobRecordRow {
    request_id: String,
    user_id: i64,
    query: Option<String>,
    status: String,
    result: Option<Json<JobResult>>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    timestamp: DateTime<Utc>,
}

impl TryFrom<JobRecordRow> for JobRecord {
    type Error = StoreError;

    fn try_from(row: JobRecordRow) -> Result<Self, Self::Error> {
        let status = JobStatus::parse(&row.status).ok_or_else(|| StoreError::Corrupt {
            request_id: row.request_id.clone(),
            reason: format!("unknown status '{}'", row.status),
        })?;

        Ok(JobRecord {
            request_id: row.request_id,
            user_id: row.user_id,
            query: row.query,
            status,
            result: row.result.map(|Json(result)| result),
            created_at: row.created_at,
            updated_at: row.updated_at,
            timestamp: row.timestamp,
        })
    }
}

fn into_records(rows: Vec<JobRecordRow>) -> Result<Vec<JobRecord>, StoreError> {
    rows.into_iter().map(JobRecord::try_from).collect()
}

/// Job records in the `cv_analysis_logs` table.
#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create(&self, record: JobRecord) -> Result<JobRecord, StoreError> {
        let row = sqlx::query_as::<_, JobRecordRow>(
            r#"
            INSERT INTO cv_analysis_logs
                (request_id, user_id, query, status, result, created_at, updated_at, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&record.request_id)
        .bind(record.user_id)
        .bind(&record.query)
        .bind(record.status.as_str())
        .bind(record.result.as_ref().map(Json))
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(record.timestamp)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(record.request_id.clone())
            }
            other => StoreError::Database(other),
        })?;

        info!("Created job record {} ({})", row.request_id, row.status);
        row.try_into()
    }

    async fn get(&self, request_id: &str) -> Result<Option<JobRecord>, StoreError> {
        sqlx::query_as::<_, JobRecordRow>("SELECT * FROM cv_analysis_logs WHERE request_id = $1")
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await?
            .map(JobRecord::try_from)
            .transpose()
    }

    async fn update(&self, request_id: &str, outcome: JobOutcome) -> Result<JobRecord, StoreError> {
        let status = outcome.status();
        let result = outcome.into_result();
        let sources: Vec<&str> = JobStatus::sources_of(status)
            .iter()
            .map(JobStatus::as_str)
            .collect();

        // Single conditional UPDATE: the row moves only from an allowed source state.
        let updated = sqlx::query_as::<_, JobRecordRow>(
            r#"
            UPDATE cv_analysis_logs
            SET status = $2, result = $3, updated_at = $4
            WHERE request_id = $1 AND status = ANY($5)
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(status.as_str())
        .bind(result.as_ref().map(Json))
        .bind(Utc::now())
        .bind(sources)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(row) => {
                info!("Job record {request_id} moved to {status}");
                row.try_into()
            }
            None => match self.get(request_id).await? {
                Some(current) => Err(StoreError::InvalidTransition {
                    request_id: request_id.to_string(),
                    from: current.status,
                    to: status,
                }),
                None => Err(StoreError::NotFound(request_id.to_string())),
            },
        }
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<JobRecord>, StoreError> {
        let (skip, limit) = clamp_page(skip, limit);
        let rows = sqlx::query_as::<_, JobRecordRow>(
            "SELECT * FROM cv_analysis_logs ORDER BY created_at DESC, request_id OFFSET $1 LIMIT $2",
        )
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        into_records(rows)
    }

    async fn search(&self, text: &str, skip: i64, limit: i64) -> Result<Vec<JobRecord>, StoreError> {
        let (skip, limit) = clamp_page(skip, limit);
        let rows = sqlx::query_as::<_, JobRecordRow>(
            r#"
            SELECT * FROM cv_analysis_logs
            WHERE to_tsvector('simple', COALESCE(query, '')) @@ plainto_tsquery('simple', $1)
            ORDER BY created_at DESC, request_id
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(text)
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        into_records(rows)
    }
}
