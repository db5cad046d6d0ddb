//! CV summary and ranking payloads, as produced by the model and as persisted
//! on a job record.

use serde::{Deserialize, Serialize};

/// Upper bound of every score the model produces. The lower bound is exclusive 0.0.
pub const MAX_SCORE: f64 = 10.0;

/// Checks the `0.0 < score <= 10.0` contract shared by summaries and rankings.
pub fn validate_score(score: f64) -> Result<(), String> {
    if score.is_finite() && score > 0.0 && score <= MAX_SCORE {
        Ok(())
    } else {
        Err(format!("score {score} outside (0.0, {MAX_SCORE}]"))
    }
}

/// Standalone judgment of one logical CV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvSummary {
    pub summary: String,
    pub strong_points: Vec<String>,
    pub weak_points: Vec<String>,
    pub score: f64,
}

/// Fit of one CV against a role description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvRanking {
    pub cv_analysis: String,
    pub why_it_fits: String,
    pub things_to_watch_out: String,
    pub score: f64,
}

/// Output of one ranking call: the model's narrative plus one analysis per
/// input summary, positionally aligned with the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingBatch {
    pub cvs_analysis: String,
    pub summaries: Vec<CvRanking>,
}

/// Summary fields of a CV merged with its ranking analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedCv {
    pub summary: String,
    pub strong_points: Vec<String>,
    pub weak_points: Vec<String>,
    pub cv_analysis: String,
    pub why_it_fits: String,
    pub things_to_watch_out: String,
    pub ranking_score: f64,
}

impl CombinedCv {
    pub fn merge(summary: CvSummary, ranking: CvRanking) -> Self {
        Self {
            summary: summary.summary,
            strong_points: summary.strong_points,
            weak_points: summary.weak_points,
            cv_analysis: ranking.cv_analysis,
            why_it_fits: ranking.why_it_fits,
            things_to_watch_out: ranking.things_to_watch_out,
            ranking_score: ranking.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summaries: Vec<CvSummary>,
}

impl SummaryResult {
    /// Orders summaries by `score`, best first. Ties keep their input order.
    pub fn sorted(mut summaries: Vec<CvSummary>) -> Self {
        summaries.sort_by(|a, b| b.score.total_cmp(&a.score));
        Self { summaries }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingResult {
    pub cvs_analysis_process: String,
    pub cvs_analysis: Vec<CombinedCv>,
}

impl RankingResult {
    /// Orders merged CVs by `ranking_score`, best first. Ties keep their input order.
    pub fn sorted(cvs_analysis_process: String, mut cvs_analysis: Vec<CombinedCv>) -> Self {
        cvs_analysis.sort_by(|a, b| b.ranking_score.total_cmp(&a.ranking_score));
        Self {
            cvs_analysis_process,
            cvs_analysis,
        }
    }
}

/// Final payload of a job. Tagged so readers never need to sniff the shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobResult {
    Summary(SummaryResult),
    Ranking(RankingResult),
}
