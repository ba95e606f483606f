//! Task instruction templates.
//!
//! Each task has a built-in instruction block. A non-empty file with the
//! task's template name in the configured prompt directory replaces it.

use anyhow::{Context, Result};
use std::path::Path;

use crate::generate::TaskType;

const RESUME_OPTIMIZATION: &str = "\
- Identify the requirements in the job description that my experience already covers and say where my resume should surface them.
- Point out gaps between the job requirements and my resume, and suggest truthful ways to address them.
- Suggest concrete rewrites of specific bullet points, using keywords from the job description.
- Recommend what to cut or shorten to keep the resume focused on this role.";

const INTERVIEW_PREP: &str = "\
- List the questions I am most likely to be asked for this role, grouped by theme.
- For each question, outline a suggested answer drawn from my actual experience, using the STAR format where it fits.
- Flag areas where my background looks thin for this role and how to prepare for them.
- Suggest two or three thoughtful questions I could ask the interviewer.";

const APPLICATION_QUESTION: &str = "\
- Answer in the first person, in my voice, as a ready-to-paste draft.
- Ground the answer in specific examples from my experience.
- Keep it concise: two to four short paragraphs unless the question asks for more.
- Connect the answer to the company or role when a job description is provided.";

pub fn template_file_name(task: &TaskType) -> &'static str {
    match task {
        TaskType::ResumeOptimization { .. } => "resume_optimization.txt",
        TaskType::InterviewPrep { .. } => "interview_prep.txt",
        TaskType::ApplicationQuestion { .. } => "application_question.txt",
    }
}

pub fn builtin_instructions(task: &TaskType) -> &'static str {
    match task {
        TaskType::ResumeOptimization { .. } => RESUME_OPTIMIZATION,
        TaskType::InterviewPrep { .. } => INTERVIEW_PREP,
        TaskType::ApplicationQuestion { .. } => APPLICATION_QUESTION,
    }
}

/// Instructions for `task`: the override file if present and non-empty,
/// otherwise the built-in block.
pub fn load_instructions(prompt_dir: &Path, task: &TaskType) -> Result<String> {
    let path = prompt_dir.join(template_file_name(task));
    if path.is_file() {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read prompt template: {}", path.display()))?;
        if !content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "using prompt override");
            return Ok(content.trim().to_string());
        }
    }
    Ok(builtin_instructions(task).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builtin_used_when_no_override() {
        let tmp = TempDir::new().unwrap();
        let text = load_instructions(tmp.path(), &TaskType::interview(None)).unwrap();
        assert_eq!(text, INTERVIEW_PREP);
    }

    #[test]
    fn override_file_replaces_builtin() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("resume_optimization.txt"),
            "\nOnly suggest three changes.\n",
        )
        .unwrap();
        let text = load_instructions(tmp.path(), &TaskType::resume(None)).unwrap();
        assert_eq!(text, "Only suggest three changes.");
    }

    #[test]
    fn blank_override_falls_back() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("application_question.txt"), "  \n").unwrap();
        let text = load_instructions(tmp.path(), &TaskType::question("Why us?")).unwrap();
        assert_eq!(text, APPLICATION_QUESTION);
    }
}
