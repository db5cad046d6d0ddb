// Shared prompt fragments. Task-specific prompts live next to the code that
// sends them (see summarization/prompts.rs).

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction pinning the language of every free-text field in the answer.
pub fn language_instruction(language: &str) -> String {
    format!(
        "Every free-text value in your answer (summaries, points, analyses) MUST be written in {language}. \
        JSON keys stay exactly as specified."
    )
}
