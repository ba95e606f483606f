//! Ingestion pipeline orchestration.
//!
//! Coordinates the flow for local career documents: file discovery →
//! extraction → chunking → embedding → storage → upload copy.
//!
//! Planning ([`plan_ingest`]) reads and chunks every file without touching
//! the index, so unsupported files, unreadable PDFs and unchanged documents
//! are sorted out before the first embedding call. The plan is then embedded
//! as one batch; an embedding failure aborts the run with nothing written.

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::chunk::chunk_text;
use crate::config::{ChunkingConfig, Config};
use crate::embedding::create_embedder;
use crate::extract::{extract_text, FileKind};
use crate::index::DocumentIndex;
use crate::models::{Chunk, Document};
use crate::store::{ChunkStore, SqliteStore};

const DEFAULT_EXCLUDES: &[&str] = &["**/.git/**", "**/target/**", "**/node_modules/**"];

/// A document ready to be embedded, with the file it came from.
pub struct PlannedDocument {
    pub path: PathBuf,
    pub document: Document,
    pub chunks: Vec<Chunk>,
}

/// What an ingest run would do.
#[derive(Default)]
pub struct IngestPlan {
    pub files_scanned: usize,
    pub documents: Vec<PlannedDocument>,
    /// File names whose stored content hash matches the file on disk.
    pub unchanged: Vec<String>,
    /// User-facing reasons for every file that was skipped.
    pub warnings: Vec<String>,
}

impl IngestPlan {
    pub fn chunk_count(&self) -> usize {
        self.documents.iter().map(|d| d.chunks.len()).sum()
    }

    fn skip(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

pub async fn run_ingest(
    config: &Config,
    paths: &[PathBuf],
    excludes: &[String],
    dry_run: bool,
) -> Result<()> {
    let store = Arc::new(SqliteStore::open(&config.db.path).await?);
    let plan = plan_ingest(store.as_ref(), &config.chunking, paths, excludes).await?;

    for warning in &plan.warnings {
        eprintln!("Warning: {}", warning);
    }

    if dry_run {
        println!("ingest (dry-run)");
        println!("  files scanned: {}", plan.files_scanned);
        for planned in &plan.documents {
            println!(
                "  {} ({}): {} chunks",
                planned.document.file_name,
                planned.document.kind,
                planned.chunks.len()
            );
        }
        for name in &plan.unchanged {
            println!("  {}: unchanged", name);
        }
        println!("  estimated chunks: {}", plan.chunk_count());
        store.close().await;
        return Ok(());
    }

    if !plan.documents.is_empty() {
        let embedder = create_embedder(&config.embedding)?;
        let index = DocumentIndex::new(embedder, store.clone());

        let batch: Vec<(Document, Vec<Chunk>)> = plan
            .documents
            .iter()
            .map(|p| (p.document.clone(), p.chunks.clone()))
            .collect();
        index.add_batch(&batch).await?;

        for planned in &plan.documents {
            copy_upload(&config.paths.upload_dir, &planned.path, &planned.document.file_name)?;
        }
    }

    println!("ingest");
    println!("  files scanned: {}", plan.files_scanned);
    for planned in &plan.documents {
        println!(
            "  {} ({}): {} chunks",
            planned.document.file_name,
            planned.document.kind,
            planned.chunks.len()
        );
    }
    println!("  ingested documents: {}", plan.documents.len());
    println!("  unchanged: {}", plan.unchanged.len());
    println!("  skipped: {}", plan.warnings.len());
    println!("  chunks written: {}", plan.chunk_count());
    println!("ok");

    store.close().await;
    Ok(())
}

/// Delete every stored document, chunk and vector, and the upload copies.
pub async fn run_clear(config: &Config) -> Result<()> {
    let store = SqliteStore::open(&config.db.path).await?;
    let before = store.counts().await?;
    store.clear().await?;
    store.close().await;

    let removed = clear_uploads(&config.paths.upload_dir)?;

    println!("clear");
    println!("  documents removed: {}", before.documents);
    println!("  chunks removed: {}", before.chunks);
    println!("  upload copies removed: {}", removed);
    println!("ok");
    Ok(())
}

/// Read, extract and chunk every supported file under `paths`.
///
/// Nothing is written to `store`; it is only consulted to detect documents
/// that are already stored with identical bytes.
pub async fn plan_ingest(
    store: &dyn ChunkStore,
    chunking: &ChunkingConfig,
    paths: &[PathBuf],
    excludes: &[String],
) -> Result<IngestPlan> {
    let mut plan = IngestPlan::default();
    let files = collect_files(paths, excludes, &mut plan)?;
    let mut seen_names = HashSet::new();

    for path in files {
        plan.files_scanned += 1;

        let kind = match FileKind::from_path(&path) {
            Ok(kind) => kind,
            Err(e) => {
                plan.skip(format!("skipping {}: {}", path.display(), e));
                continue;
            }
        };

        let file_name = match path.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => continue,
        };
        if !seen_names.insert(file_name.clone()) {
            plan.skip(format!(
                "skipping {}: another file named {} is already in this batch",
                path.display(),
                file_name
            ));
            continue;
        }

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                plan.skip(format!("skipping {}: {}", path.display(), e));
                continue;
            }
        };
        let content_hash = hash_bytes(&bytes);

        if let Some(existing) = store.find_document(&file_name).await? {
            if existing.content_hash == content_hash {
                debug!(file = %file_name, "unchanged");
                plan.unchanged.push(file_name);
                continue;
            }
        }

        let text = match extract_text(&bytes, kind) {
            Ok(text) => text,
            Err(e) => {
                plan.skip(format!("skipping {}: {}", path.display(), e));
                continue;
            }
        };

        let doc_id = Uuid::new_v4().to_string();
        let chunks = chunk_text(
            &doc_id,
            &file_name,
            &text,
            chunking.chunk_size,
            chunking.chunk_overlap,
        );
        if chunks.is_empty() {
            plan.skip(format!("skipping {}: no text extracted", path.display()));
            continue;
        }

        let document = Document {
            id: doc_id,
            file_name,
            kind,
            content_hash,
            char_count: text.chars().count() as i64,
            ingested_at: chrono::Utc::now().timestamp(),
        };
        plan.documents.push(PlannedDocument {
            path,
            document,
            chunks,
        });
    }

    Ok(plan)
}

/// Expand `paths` into a sorted, de-duplicated file list.
///
/// Directories are walked recursively. Hidden entries and anything matching
/// the default or caller-supplied exclude globs are left out. Missing paths
/// are reported as warnings on `plan`.
fn collect_files(
    paths: &[PathBuf],
    excludes: &[String],
    plan: &mut IngestPlan,
) -> Result<Vec<PathBuf>> {
    let mut patterns: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
    patterns.extend(excludes.iter().cloned());
    let exclude_set = build_globset(&patterns)?;

    let mut files = Vec::new();
    for root in paths {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        if !root.is_dir() {
            plan.skip(format!("path not found: {}", root.display()));
            continue;
        }

        let walker = WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            if exclude_set.is_match(relative) {
                continue;
            }
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}

fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn copy_upload(upload_dir: &Path, source: &Path, file_name: &str) -> Result<()> {
    std::fs::create_dir_all(upload_dir)
        .with_context(|| format!("Failed to create {}", upload_dir.display()))?;
    let target = upload_dir.join(file_name);
    if source.canonicalize().ok() == target.canonicalize().ok() {
        return Ok(());
    }
    std::fs::copy(source, &target)
        .with_context(|| format!("Failed to copy {} to {}", source.display(), target.display()))?;
    Ok(())
}

fn clear_uploads(upload_dir: &Path) -> Result<usize> {
    if !upload_dir.is_dir() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in std::fs::read_dir(upload_dir)? {
        let path = entry?.path();
        if path.is_file() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            removed += 1;
        }
    }
    Ok(removed)
}
