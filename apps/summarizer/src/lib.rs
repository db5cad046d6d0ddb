pub mod config;
pub mod db;
pub mod errors;
pub mod extract;
pub mod jobs;
pub mod llm_client;
pub mod models;
pub mod state;
pub mod submission;
pub mod summarization;
