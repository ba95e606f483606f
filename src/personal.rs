//! The personal-context file: free text injected into every prompt.
//!
//! A missing file reads as empty.

use anyhow::{Context, Result};
use std::path::Path;

pub fn load(path: &Path) -> Result<String> {
    if !path.exists() {
        return Ok(String::new());
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read personal context: {}", path.display()))
}

/// Overwrite the file, creating parent directories as needed.
pub fn save(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write personal context: {}", path.display()))
}
