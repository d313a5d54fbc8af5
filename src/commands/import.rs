//! Import posts from an older export

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::content::migrate;
use crate::Daybook;

/// Import every post in `file`, replacing posts with the same id. Returns
/// the number of posts written.
pub fn import(daybook: &Daybook, file: &Path) -> Result<usize> {
    let json = fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?;
    let posts = migrate::import_document(&json, &daybook.zone)?;
    let count = daybook.store().import_posts(posts)?;

    tracing::info!("Imported {} posts from {:?}", count, file);
    Ok(count)
}

/// Run the import command
pub fn run(daybook: &Daybook, file: &Path) -> Result<()> {
    let count = import(daybook, file)?;
    println!("Imported {} posts", count);
    Ok(())
}
