//! Clean the public directory

use anyhow::Result;
use std::fs;

use crate::Daybook;

/// Remove generated output. The store is never touched.
pub fn run(daybook: &Daybook) -> Result<()> {
    if daybook.public_dir.exists() {
        fs::remove_dir_all(&daybook.public_dir)?;
        tracing::info!("Deleted: {:?}", daybook.public_dir);
    }

    Ok(())
}
