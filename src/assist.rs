//! The `resume`, `interview` and `answer` commands.
//!
//! Each one retrieves excerpts for the task's query, loads the personal
//! context and instructions, and either prints the assembled prompt
//! (`--print-prompt`) or sends it to the configured language model.

use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::generate::{build_prompt, generate, retrieval_query, validate, TaskInput, TaskType};
use crate::index::open_index;
use crate::llm::create_model;
use crate::personal;
use crate::prompts::load_instructions;
use crate::search::NO_DOCUMENTS_WARNING;

pub async fn run_task(
    config: &Config,
    task: &TaskType,
    input: &TaskInput,
    print_prompt: bool,
) -> Result<()> {
    if let Err(e) = validate(task, input) {
        eprintln!("Warning: {}.", e);
        return Ok(());
    }

    let (index, store) = open_index(config).await?;
    if index.counts().await?.vectors == 0 {
        eprintln!("Warning: {}", NO_DOCUMENTS_WARNING);
        store.close().await;
        return Ok(());
    }

    let query = retrieval_query(task, input);
    let chunks = index.search(&query, config.retrieval.top_k).await?;
    store.close().await;
    info!(task = task.name(), excerpts = chunks.len(), "retrieved excerpts");

    let personal_context = personal::load(&config.paths.personal_context)?;
    let instructions = load_instructions(&config.paths.prompt_dir, task)?;

    if print_prompt {
        print!(
            "{}",
            build_prompt(task, &instructions, &personal_context, &chunks, input)
        );
        return Ok(());
    }

    let model = create_model(&config.llm)?;
    let response = generate(
        model.as_ref(),
        task,
        input,
        &chunks,
        &personal_context,
        &instructions,
    )
    .await?;
    println!("{}", response.trim_end());
    Ok(())
}
