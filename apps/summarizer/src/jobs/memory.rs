//! In-process job store for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::jobs::{clamp_page, JobOutcome, JobRecord, JobStore, StoreError};

#[derive(Default)]
pub struct MemoryJobStore {
    records: Mutex<Vec<JobRecord>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn page(mut records: Vec<JobRecord>, skip: i64, limit: i64) -> Vec<JobRecord> {
        let (skip, limit) = clamp_page(skip, limit);
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, record: JobRecord) -> Result<JobRecord, StoreError> {
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.request_id == record.request_id) {
            return Err(StoreError::Conflict(record.request_id));
        }
        records.push(record.clone());
        Ok(record)
    }

    async fn get(&self, request_id: &str) -> Result<Option<JobRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| r.request_id == request_id).cloned())
    }

    async fn update(&self, request_id: &str, outcome: JobOutcome) -> Result<JobRecord, StoreError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.request_id == request_id)
            .ok_or_else(|| StoreError::NotFound(request_id.to_string()))?;

        let next = outcome.status();
        if !record.status.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                request_id: request_id.to_string(),
                from: record.status,
                to: next,
            });
        }

        record.status = next;
        record.result = outcome.into_result();
        record.updated_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<JobRecord>, StoreError> {
        let records = self.records.lock().unwrap().clone();
        Ok(Self::page(records, skip, limit))
    }

    async fn search(&self, text: &str, skip: i64, limit: i64) -> Result<Vec<JobRecord>, StoreError> {
        let terms: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
        let records: Vec<JobRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                let query = r.query.as_deref().unwrap_or_default().to_lowercase();
                let words: Vec<&str> = query.split_whitespace().collect();
                !terms.is_empty() && terms.iter().all(|t| words.contains(&t.as_str()))
            })
            .cloned()
            .collect();
        Ok(Self::page(records, skip, limit))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::jobs::JobStatus;
    use crate::models::analysis::{JobResult, SummaryResult};

    fn empty_summary() -> JobResult {
        JobResult::Summary(SummaryResult { summaries: vec![] })
    }

    #[tokio::test]
    async fn test_duplicate_request_id_conflicts() {
        let store = MemoryJobStore::new();
        store.create(JobRecord::pending("req-1", 1, None)).await.unwrap();
        let err = store
            .create(JobRecord::pending("req-1", 2, None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(id) if id == "req-1"));
    }

    #[tokio::test]
    async fn test_success_then_no_further_transitions() {
        let store = MemoryJobStore::new();
        store.create(JobRecord::pending("req-1", 1, None)).await.unwrap();

        let done = store
            .update("req-1", JobOutcome::Succeeded(empty_summary()))
            .await
            .unwrap();
        assert_eq!(done.status, JobStatus::Success);
        assert!(done.result.is_some());
        assert!(done.updated_at.is_some());

        let err = store.update("req-1", JobOutcome::Failed).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidTransition {
                from: JobStatus::Success,
                to: JobStatus::Failed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_failed_clears_result() {
        let store = MemoryJobStore::new();
        store.create(JobRecord::pending("req-1", 1, None)).await.unwrap();
        let failed = store.update("req-1", JobOutcome::Failed).await.unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert!(failed.result.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let store = MemoryJobStore::new();
        let err = store.update("ghost", JobOutcome::Failed).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_paged() {
        let store = MemoryJobStore::new();
        let base = Utc::now();
        for i in 0..5 {
            let mut record = JobRecord::pending(format!("req-{i}"), 1, None);
            record.created_at = base + Duration::seconds(i);
            store.create(record).await.unwrap();
        }

        let page = store.list(1, 2).await.unwrap();
        let ids: Vec<&str> = page.iter().map(|r| r.request_id.as_str()).collect();
        assert_eq!(ids, vec!["req-3", "req-2"]);
    }

    #[tokio::test]
    async fn test_search_matches_query_words() {
        let store = MemoryJobStore::new();
        store
            .create(JobRecord::pending("a", 1, Some("Senior backend engineer".to_string())))
            .await
            .unwrap();
        store
            .create(JobRecord::pending("b", 1, Some("Data analyst".to_string())))
            .await
            .unwrap();
        store.create(JobRecord::pending("c", 1, None)).await.unwrap();

        let hits = store.search("backend", 0, 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].request_id, "a");
        assert!(store.search("  ", 0, 10).await.unwrap().is_empty());
    }
}
