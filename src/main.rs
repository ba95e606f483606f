//! # jobjob CLI
//!
//! The `jobjob` binary is the front end of the assistant: it initializes
//! the index, ingests documents, manages the personal context, and runs the
//! three assistance tasks.
//!
//! ## Usage
//!
//! ```bash
//! jobjob --config ./config/jobjob.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `jobjob init` | Create the SQLite database and working directories |
//! | `jobjob ingest <PATH>...` | Extract, chunk, embed and store documents |
//! | `jobjob search "<query>"` | Show the chunks most similar to a query |
//! | `jobjob resume --job-file <PATH>` | Resume optimization suggestions |
//! | `jobjob interview --job-file <PATH>` | Interview preparation |
//! | `jobjob answer --question "<text>"` | Draft an application-question answer |
//! | `jobjob context show\|set\|clear` | Manage the personal context |
//! | `jobjob status` | Index and context overview |
//! | `jobjob clear` | Remove every document from the index |
//!
//! Logging goes to stderr and is controlled by `JOBJOB_LOG`
//! (e.g. `JOBJOB_LOG=jobjob=debug`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use jobjob::config::{self, Config, DEFAULT_CONFIG_PATH};
use jobjob::generate::{TaskInput, TaskType};
use jobjob::{assist, context_cmd, ingest, migrate, search, stats};

/// jobjob: a local job-search assistant.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/jobjob.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "jobjob",
    about = "jobjob: tailor resumes, prepare interviews and answer application questions from your own documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/jobjob.toml`; built-in defaults are used when
    /// that file does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema and working directories.
    ///
    /// Idempotent: running it again leaves existing data untouched.
    Init,

    /// Ingest PDF, TXT and Markdown files.
    ///
    /// Directories are walked recursively. Files already stored with the
    /// same content are reported as unchanged.
    Ingest {
        /// Files or directories to ingest.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Glob (relative to each directory argument) to leave out. Repeatable.
        #[arg(long = "exclude")]
        excludes: Vec<String>,

        /// Show files and chunk counts without embedding or writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the document chunks most similar to a query.
    Search {
        query: String,

        /// Number of chunks to return (defaults to `retrieval.top_k`).
        #[arg(short = 'k', long = "top-k")]
        k: Option<usize>,
    },

    /// Suggest resume optimizations for a job description.
    Resume {
        #[command(flatten)]
        job: JobArgs,

        /// Resume sections to focus on (e.g. "Summary, Experience").
        #[arg(long)]
        sections: Option<String>,

        /// Print the assembled prompt instead of calling the model.
        #[arg(long)]
        print_prompt: bool,
    },

    /// Prepare for an interview for a job description.
    Interview {
        #[command(flatten)]
        job: JobArgs,

        /// Kind of interview (e.g. behavioral, technical). Defaults to general.
        #[arg(long)]
        interview_type: Option<String>,

        /// Print the assembled prompt instead of calling the model.
        #[arg(long)]
        print_prompt: bool,
    },

    /// Draft an answer to a job-application question.
    Answer {
        /// The application question.
        #[arg(long)]
        question: String,

        #[command(flatten)]
        job: OptionalJobArgs,

        /// Print the assembled prompt instead of calling the model.
        #[arg(long)]
        print_prompt: bool,
    },

    /// Show, replace or clear the personal context.
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// Show index and personal-context status.
    Status,

    /// Delete every document, chunk and vector from the index.
    Clear,
}

/// Job description given inline or read from a file.
#[derive(clap::Args)]
#[group(required = true, multiple = false)]
struct JobArgs {
    /// Job description text.
    #[arg(long)]
    job: Option<String>,

    /// File containing the job description.
    #[arg(long)]
    job_file: Option<PathBuf>,
}

#[derive(clap::Args)]
#[group(required = false, multiple = false)]
struct OptionalJobArgs {
    /// Job description text.
    #[arg(long)]
    job: Option<String>,

    /// File containing the job description.
    #[arg(long)]
    job_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ContextAction {
    /// Print the personal context.
    Show,
    /// Replace the personal context with TEXT, or with stdin when omitted.
    Set { text: Option<String> },
    /// Empty the personal context.
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let (config_path, explicit) = match &cli.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };
    let cfg = config::load_config(&config_path, explicit)?;
    check_credentials(&cfg, &cli.command)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            for dir in [&cfg.paths.upload_dir, &cfg.paths.prompt_dir] {
                create_dir(dir)?;
            }
            if let Some(parent) = cfg.paths.personal_context.parent() {
                create_dir(parent)?;
            }
            println!("Database initialized successfully.");
        }
        Commands::Ingest {
            paths,
            excludes,
            dry_run,
        } => {
            ingest::run_ingest(&cfg, &paths, &excludes, dry_run).await?;
        }
        Commands::Search { query, k } => {
            search::run_search(&cfg, &query, k).await?;
        }
        Commands::Resume {
            job,
            sections,
            print_prompt,
        } => {
            let input = job_input(job.job, job.job_file.as_deref())?;
            let task = TaskType::resume(sections.as_deref());
            assist::run_task(&cfg, &task, &input, print_prompt).await?;
        }
        Commands::Interview {
            job,
            interview_type,
            print_prompt,
        } => {
            let input = job_input(job.job, job.job_file.as_deref())?;
            let task = TaskType::interview(interview_type.as_deref());
            assist::run_task(&cfg, &task, &input, print_prompt).await?;
        }
        Commands::Answer {
            question,
            job,
            print_prompt,
        } => {
            let input = job_input(job.job, job.job_file.as_deref())?;
            let task = TaskType::question(&question);
            assist::run_task(&cfg, &task, &input, print_prompt).await?;
        }
        Commands::Context { action } => match action {
            ContextAction::Show => context_cmd::run_show(&cfg)?,
            ContextAction::Set { text } => context_cmd::run_set(&cfg, text)?,
            ContextAction::Clear => context_cmd::run_clear(&cfg)?,
        },
        Commands::Status => {
            stats::run_status(&cfg).await?;
        }
        Commands::Clear => {
            ingest::run_clear(&cfg).await?;
        }
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("JOBJOB_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Fail before any work when a command needs `OPENAI_API_KEY` and it is unset.
fn check_credentials(cfg: &Config, command: &Commands) -> Result<()> {
    let (embeds, completes) = match command {
        Commands::Ingest { dry_run, .. } => (!dry_run, false),
        Commands::Search { .. } => (true, false),
        Commands::Resume { print_prompt, .. }
        | Commands::Interview { print_prompt, .. }
        | Commands::Answer { print_prompt, .. } => (true, !print_prompt),
        _ => (false, false),
    };

    if (embeds && cfg.embedding.needs_api_key()) || (completes && cfg.llm.needs_api_key()) {
        config::api_key()?;
    }
    Ok(())
}

fn job_input(job: Option<String>, job_file: Option<&Path>) -> Result<TaskInput> {
    let job_description = match (job, job_file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job description: {}", path.display()))?,
        (None, None) => String::new(),
    };
    Ok(TaskInput { job_description })
}

fn create_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
}
