use std::sync::Arc;

use anyhow::Result;
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::info;

use crate::config::Config;
use crate::db::{create_lazy_pool, create_pool, ping, run_migrations};
use crate::extract::ocr::TesseractOcr;
use crate::extract::LocalExtractor;
use crate::jobs::postgres::PgJobStore;
use crate::jobs::runner::TaskRunner;
use crate::jobs::JobStore;
use crate::llm_client::LlmClient;
use crate::submission::SubmissionService;
use crate::summarization::gateway::LlmGateway;
use crate::summarization::pipeline::Pipeline;

/// Everything a command needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub store: Arc<dyn JobStore>,
    pub submissions: SubmissionService,
}

impl AppState {
    pub async fn build(config: &Config) -> Result<Self> {
        let db = create_pool(&config.database_url, config.db_max_connections).await?;
        run_migrations(&db).await?;

        let store: Arc<dyn JobStore> = Arc::new(PgJobStore::new(db.clone()));

        let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_model.clone())?;
        info!("LLM client initialized (model: {})", llm.model());
        let analyst = Arc::new(LlmGateway::new(llm, &config.llm_response_language));

        let ocr = TesseractOcr::new(config.tesseract_bin.clone(), config.ocr_languages.clone());
        let extractor = Arc::new(LocalExtractor::new(ocr));

        let pipeline = Pipeline::new(
            store.clone(),
            extractor,
            analyst,
            config.job_timeout,
        );
        let runner = TaskRunner::new(Arc::new(pipeline));
        let submissions =
            SubmissionService::new(store.clone(), runner, config.staging_dir.clone());

        Ok(Self {
            db,
            store,
            submissions,
        })
    }
}

/// Database connectivity and OCR engine availability. Needs no migrated
/// schema and never fails; problems show up as a `degraded` status.
pub async fn health_report(db: &PgPool, ocr: &TesseractOcr) -> Value {
    let database = match ping(db).await {
        Ok(()) => "ok".to_string(),
        Err(e) => format!("error: {e}"),
    };
    let ocr = if ocr.is_available().await {
        "ok"
    } else {
        "unavailable"
    };
    let healthy = database == "ok" && ocr == "ok";

    json!({
        "status": if healthy { "ok" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "service": env!("CARGO_PKG_NAME"),
        "database": database,
        "ocr": ocr,
    })
}

/// Health check for the CLI: connects lazily so an unreachable database is
/// reported rather than aborting the command.
pub async fn check_health(config: &Config) -> Result<Value> {
    let db = create_lazy_pool(&config.database_url, 1)?;
    let ocr = TesseractOcr::new(config.tesseract_bin.clone(), config.ocr_languages.clone());
    let report = health_report(&db, &ocr).await;
    db.close().await;
    Ok(report)
}
