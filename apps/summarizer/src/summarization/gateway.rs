//! LLM gateway: the two structured calls the pipeline makes.
//!
//! `LlmGateway` is the production backend. The pipeline only sees the
//! [`CvAnalyst`] trait, so tests swap in scripted analysts.

use async_trait::async_trait;
use tracing::debug;

use crate::llm_client::{LlmClient, LlmError};
use crate::models::analysis::{validate_score, CvSummary, RankingBatch};
use crate::summarization::prompts::{
    build_ranking_prompt, build_summary_prompt, build_system, CV_RANKING_SCHEMA,
    CV_RANKING_SYSTEM, CV_SUMMARY_SCHEMA, CV_SUMMARY_SYSTEM,
};

#[async_trait]
pub trait CvAnalyst: Send + Sync {
    /// Summarizes one logical CV from its extracted text.
    async fn summarize(&self, cv_text: &str) -> Result<CvSummary, LlmError>;

    /// Scores every summary against a role description. The batch is
    /// expected to follow the input order and count.
    async fn rank(
        &self,
        role_description: &str,
        summaries: &[CvSummary],
    ) -> Result<RankingBatch, LlmError>;
}

#[derive(Clone)]
pub struct LlmGateway {
    llm: LlmClient,
    summary_system: String,
    ranking_system: String,
}

impl LlmGateway {
    pub fn new(llm: LlmClient, response_language: &str) -> Self {
        Self {
            llm,
            summary_system: build_system(CV_SUMMARY_SYSTEM, CV_SUMMARY_SCHEMA, response_language),
            ranking_system: build_system(CV_RANKING_SYSTEM, CV_RANKING_SCHEMA, response_language),
        }
    }
}

#[async_trait]
impl CvAnalyst for LlmGateway {
    async fn summarize(&self, cv_text: &str) -> Result<CvSummary, LlmError> {
        let summary: CvSummary = self
            .llm
            .call_json(&self.summary_system, &build_summary_prompt(cv_text))
            .await?;
        check_summary(&summary)?;
        debug!("CV summarized with score {:.1}", summary.score);
        Ok(summary)
    }

    async fn rank(
        &self,
        role_description: &str,
        summaries: &[CvSummary],
    ) -> Result<RankingBatch, LlmError> {
        let summaries_json = serde_json::to_string_pretty(summaries)?;
        let prompt = build_ranking_prompt(role_description, summaries.len(), &summaries_json);
        let batch: RankingBatch = self.llm.call_json(&self.ranking_system, &prompt).await?;
        check_ranking(&batch)?;
        Ok(batch)
    }
}

fn check_summary(summary: &CvSummary) -> Result<(), LlmError> {
    validate_score(summary.score).map_err(LlmError::Schema)
}

fn check_ranking(batch: &RankingBatch) -> Result<(), LlmError> {
    for (idx, ranking) in batch.summaries.iter().enumerate() {
        validate_score(ranking.score).map_err(|e| LlmError::Schema(format!("ranking {idx}: {e}")))?;
    }
    Ok(())
}
