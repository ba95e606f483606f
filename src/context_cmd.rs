//! The `context` command: show, replace or clear the personal-context file.

use anyhow::{Context, Result};
use std::io::Read;

use crate::config::Config;
use crate::personal;

pub fn run_show(config: &Config) -> Result<()> {
    let content = personal::load(&config.paths.personal_context)?;
    if content.trim().is_empty() {
        eprintln!(
            "Personal context is empty ({}).",
            config.paths.personal_context.display()
        );
        return Ok(());
    }
    println!("{}", content.trim_end());
    Ok(())
}

/// Replace the personal context with `text`, or with stdin when `text` is `None`.
pub fn run_set(config: &Config, text: Option<String>) -> Result<()> {
    let content = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read personal context from stdin")?;
            buf
        }
    };

    personal::save(&config.paths.personal_context, &content)?;
    println!(
        "Personal context saved ({} chars) to {}",
        content.trim().chars().count(),
        config.paths.personal_context.display()
    );
    Ok(())
}

pub fn run_clear(config: &Config) -> Result<()> {
    personal::save(&config.paths.personal_context, "")?;
    println!("Personal context cleared.");
    Ok(())
}
