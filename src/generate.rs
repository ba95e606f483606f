//! Personalized-response generation.
//!
//! A prompt is assembled from four parts, always in this order:
//!
//! 1. the task preamble and its instructions,
//! 2. `Personal context:` (left out entirely when the context is blank),
//! 3. `Relevant excerpts from your documents:` in retrieval order,
//! 4. the task input.
//!
//! [`build_prompt`] is pure so the exact text can be inspected with
//! `--print-prompt`; [`generate`] sends it to a [`LanguageModel`].

use std::fmt::Write as _;

use thiserror::Error;
use tracing::debug;

use crate::llm::{LanguageModel, LlmError};
use crate::models::RetrievedChunk;

pub const DEFAULT_INTERVIEW_TYPE: &str = "general";

#[derive(Debug, Clone, PartialEq)]
pub enum TaskType {
    ResumeOptimization { sections: Option<String> },
    InterviewPrep { interview_type: String },
    ApplicationQuestion { question: String },
}

impl TaskType {
    pub fn resume(sections: Option<&str>) -> Self {
        TaskType::ResumeOptimization {
            sections: sections
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
        }
    }

    pub fn interview(interview_type: Option<&str>) -> Self {
        let interview_type = interview_type
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_INTERVIEW_TYPE);
        TaskType::InterviewPrep {
            interview_type: interview_type.to_string(),
        }
    }

    pub fn question(question: &str) -> Self {
        TaskType::ApplicationQuestion {
            question: question.trim().to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaskType::ResumeOptimization { .. } => "resume",
            TaskType::InterviewPrep { .. } => "interview",
            TaskType::ApplicationQuestion { .. } => "answer",
        }
    }

    fn preamble(&self) -> String {
        match self {
            TaskType::ResumeOptimization { .. } => {
                "Analyze my resume against the job description below and suggest \
                 specific optimizations."
                    .to_string()
            }
            TaskType::InterviewPrep { interview_type } => format!(
                "Help me prepare for a {} interview for the role described below.",
                interview_type
            ),
            TaskType::ApplicationQuestion { .. } => {
                "I'm filling out a job application and need a draft answer to the \
                 question below."
                    .to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskInput {
    pub job_description: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("job description is empty")]
    EmptyJobDescription,

    #[error("application question is empty")]
    EmptyQuestion,
}

/// Resume and interview tasks need a job description; application
/// questions need the question and take the job description optionally.
pub fn validate(task: &TaskType, input: &TaskInput) -> Result<(), InputError> {
    match task {
        TaskType::ApplicationQuestion { question } => {
            if question.trim().is_empty() {
                return Err(InputError::EmptyQuestion);
            }
        }
        _ => {
            if input.job_description.trim().is_empty() {
                return Err(InputError::EmptyJobDescription);
            }
        }
    }
    Ok(())
}

/// Text used to retrieve excerpts for `task`.
pub fn retrieval_query(task: &TaskType, input: &TaskInput) -> String {
    let job = input.job_description.trim();
    match task {
        TaskType::ApplicationQuestion { question } if !job.is_empty() => {
            format!("{}\n\n{}", job, question.trim())
        }
        TaskType::ApplicationQuestion { question } => question.trim().to_string(),
        _ => job.to_string(),
    }
}

pub fn build_prompt(
    task: &TaskType,
    instructions: &str,
    personal_context: &str,
    chunks: &[RetrievedChunk],
    input: &TaskInput,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(&task.preamble());
    prompt.push_str("\n\n");
    prompt.push_str(instructions.trim());
    prompt.push_str("\n\n");

    let personal = personal_context.trim();
    if !personal.is_empty() {
        prompt.push_str("Personal context:\n");
        prompt.push_str(personal);
        prompt.push_str("\n\n");
    }

    prompt.push_str("Relevant excerpts from your documents:\n");
    if chunks.is_empty() {
        prompt.push_str("(none)\n");
    }
    for (i, hit) in chunks.iter().enumerate() {
        if i > 0 {
            prompt.push('\n');
        }
        let _ = writeln!(prompt, "[{}] {}", i + 1, hit.chunk.source_file);
        prompt.push_str(hit.chunk.text.trim());
        prompt.push('\n');
    }
    prompt.push('\n');

    let job = input.job_description.trim();
    match task {
        TaskType::ResumeOptimization { sections } => {
            let _ = write!(prompt, "Job description:\n{}\n", job);
            if let Some(sections) = sections {
                let _ = write!(prompt, "\nFocus on these resume sections: {}\n", sections);
            }
        }
        TaskType::InterviewPrep { interview_type } => {
            let _ = write!(prompt, "Job description:\n{}\n", job);
            let _ = write!(prompt, "\nInterview type: {}\n", interview_type);
        }
        TaskType::ApplicationQuestion { question } => {
            if !job.is_empty() {
                let _ = write!(prompt, "Job description:\n{}\n\n", job);
            }
            let _ = write!(prompt, "Question:\n{}\n", question.trim());
        }
    }

    prompt
}

/// Build the prompt and run one completion.
pub async fn generate(
    model: &dyn LanguageModel,
    task: &TaskType,
    input: &TaskInput,
    chunks: &[RetrievedChunk],
    personal_context: &str,
    instructions: &str,
) -> Result<String, LlmError> {
    let prompt = build_prompt(task, instructions, personal_context, chunks, input);
    debug!(
        task = task.name(),
        model = model.model_name(),
        excerpts = chunks.len(),
        prompt_chars = prompt.chars().count(),
        "requesting completion"
    );
    model.complete(&prompt).await
}
