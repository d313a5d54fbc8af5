//! Publish scheduled posts that are due

use anyhow::Result;
use chrono::Utc;

use crate::Daybook;

/// Run the promote command
pub fn run(daybook: &Daybook) -> Result<()> {
    let promoted = daybook.store().promote_due(Utc::now())?;

    if promoted.is_empty() {
        println!("Nothing due");
    }
    for post in &promoted {
        println!("Published: {} ({})", post.id, post.title);
    }
    Ok(())
}
