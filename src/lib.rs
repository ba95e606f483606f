//! # jobjob
//!
//! A local job-search assistant built on retrieval-augmented generation.
//!
//! Career documents (resumes, cover letters, notes as PDF, TXT or Markdown)
//! are split into overlapping chunks, embedded, and stored in a SQLite index.
//! Each assistance task retrieves the chunks most similar to the job
//! description, combines them with a free-text personal-context file and the
//! task's instructions, and asks a chat model for a personalized answer.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────┐
//! │  Documents   │──▶│   Pipeline   │──▶│  SQLite   │
//! │ PDF/TXT/MD   │   │ Chunk+Embed  │   │ Vectors   │
//! └──────────────┘   └──────────────┘   └─────┬─────┘
//!                                             │ top-k
//!          ┌───────────────────┐        ┌─────▼─────┐
//!          │ personal context  │───────▶│  Prompt   │──▶ chat model
//!          │ task instructions │        └───────────┘
//!          └───────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! jobjob init
//! jobjob ingest ~/career/resume.pdf ~/career/notes/
//! jobjob context set "Looking for remote roles, open to relocating to Lisbon."
//! jobjob resume --job-file ./postings/acme.txt
//! jobjob answer --question "Why do you want to join Acme?" --job-file ./postings/acme.txt
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Core data types |
//! | [`extract`] | PDF/TXT/MD text extraction |
//! | [`chunk`] | Character-based overlapping chunking |
//! | [`embedding`] | Embedder capability, OpenAI and hash providers |
//! | [`store`] | Chunk/vector storage capability, SQLite and in-memory backends |
//! | [`index`] | Embed-then-store composition and top-k retrieval |
//! | [`ingest`] | File discovery and the ingest/clear commands |
//! | [`llm`] | Language-model capability and OpenAI chat client |
//! | [`prompts`] | Built-in and overridable task instructions |
//! | [`personal`] | Personal-context file |
//! | [`generate`] | Prompt assembly and response generation |
//! | [`migrate`] | Schema migrations |

pub mod assist;
pub mod chunk;
pub mod config;
pub mod context_cmd;
pub mod embedding;
pub mod extract;
pub mod generate;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod migrate;
pub mod models;
pub mod personal;
pub mod prompts;
pub mod search;
pub mod stats;
pub mod store;

#[cfg(test)]
mod test_http;
