//! Prompts for CV summarization and ranking.

use crate::llm_client::prompts::{language_instruction, JSON_ONLY_SYSTEM};

pub const CV_SUMMARY_SYSTEM: &str = "\
You are a senior Human Resources analyst with many years of experience screening CV applications. \
You skim a CV and pull out everything that matters: the candidate's roles, how long they held them \
(read the dates carefully), their education, certifications and courses, and the impact they delivered.

Your task is to analyze one applicant CV and:
- Think carefully about how to approach the task.
- Analyze the CV text thoroughly.
- Write a detailed summary of the CV without losing any important information.
- List the strong points of the CV. This MUST be a list of strings, one distinct observation per item.
- List the weak points of the CV. This MUST be a list of strings, one distinct observation per item.
- Give the CV a score, a number greater than 0.0 and at most 10.0, reflecting how good the CV is \
based on professional and academic experience, certifications and courses, impact delivered, \
and PROVEN hard skills.";

pub const CV_SUMMARY_SCHEMA: &str = r#"Respond with a JSON object of exactly this shape:
{
  "summary": "string",
  "strong_points": ["string", "..."],
  "weak_points": ["string", "..."],
  "score": 0.0
}"#;

pub const CV_RANKING_SYSTEM: &str = "\
You are a senior Human Resources analyst with many years of experience matching CVs to open roles. \
Given a role description and a list of CV summaries (with their strong and weak points), \
you rank the CVs from most to least suited for the role.

Your task is to:
- Think carefully about how to approach the task.
- Understand the role description completely, including what the perfect candidate looks like.
- For each CV, analyze its summary, strong points and weak points against the role description.
- Describe your analysis process and its outcome: what you paid attention to, what you looked for \
in the CVs, and which candidates are the most relevant.
- For each CV, give a detailed analysis of its adherence to the role.
- For each CV, explain why it fits the role. If it does not fit, say so plainly.
- For each CV, list the things to watch out for (possible red flags).
- For each CV, give a score greater than 0.0 and at most 10.0 for how well it fits the role, \
where 10.0 is the perfect CV for the role.

Return exactly one analysis per CV, in the SAME ORDER as the CVs were given.";

pub const CV_RANKING_SCHEMA: &str = r#"Respond with a JSON object of exactly this shape:
{
  "cvs_analysis": "string describing your analysis process and outcome",
  "summaries": [
    {
      "cv_analysis": "string",
      "why_it_fits": "string",
      "things_to_watch_out": "string",
      "score": 0.0
    }
  ]
}"#;

/// Full system prompt: task instructions, output schema, language and JSON rules.
pub fn build_system(task: &str, schema: &str, language: &str) -> String {
    format!(
        "{task}\n\n{schema}\n\n{}\n\n{JSON_ONLY_SYSTEM}",
        language_instruction(language)
    )
}

pub fn build_summary_prompt(cv_text: &str) -> String {
    format!("Summarize the given CV text:\n\n\"{cv_text}\"")
}

/// `summaries_json` is the ordered list of prior summaries, serialized.
pub fn build_ranking_prompt(role_description: &str, cv_count: usize, summaries_json: &str) -> String {
    format!(
        "Given the following role description and {cv_count} CV summaries, analyze and rank them all. \
        Return exactly {cv_count} analyses, in the order the CVs appear.\n\n\
        Role description:\n{role_description}\n\n\
        CV summaries:\n{summaries_json}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_contains_schema_and_language() {
        let system = build_system(CV_SUMMARY_SYSTEM, CV_SUMMARY_SCHEMA, "English");
        assert!(system.contains("\"strong_points\""));
        assert!(system.contains("English"));
        assert!(system.contains("valid JSON only"));
    }

    #[test]
    fn test_ranking_prompt_states_expected_count() {
        let prompt = build_ranking_prompt("Senior backend engineer", 3, "[]");
        assert!(prompt.contains("Senior backend engineer"));
        assert!(prompt.contains("exactly 3 analyses"));
    }

    #[test]
    fn test_summary_prompt_quotes_cv_text() {
        let prompt = build_summary_prompt("João Silva, Data Engineer");
        assert!(prompt.ends_with("\"João Silva, Data Engineer\""));
    }
}
