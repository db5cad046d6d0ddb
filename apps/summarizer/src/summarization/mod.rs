//! CV summarization: grouping, LLM calls, and the job pipeline that ties
//! extraction and the job store together.

pub mod gateway;
pub mod grouping;
pub mod pipeline;
pub mod prompts;
