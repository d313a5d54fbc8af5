//! Render a composer preview to an HTML file

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;

use super::PostInput;
use crate::composer::ComposerSession;
use crate::error::StoreError;
use crate::generator::Generator;
use crate::Daybook;

/// Default preview file inside the public directory
pub const PREVIEW_FILE: &str = "preview.html";

/// Build a session from the entry with `id` (if any) plus `input` and
/// render it without saving anything. Returns the written file.
pub fn preview(
    daybook: &Daybook,
    id: Option<&str>,
    input: &PostInput,
    output: Option<PathBuf>,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    let mut session = match id {
        Some(id) => session_for(daybook, id)?,
        None => ComposerSession::new(),
    };
    input.apply(&mut session)?;

    let preview = session.preview(&daybook.zone, now);
    let html = Generator::new(daybook)?.render_preview(&preview, now)?;

    let output = output.unwrap_or_else(|| daybook.public_dir.join(PREVIEW_FILE));
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, html)?;
    Ok(output)
}

/// Session holding a copy of a stored entry
fn session_for(daybook: &Daybook, id: &str) -> Result<ComposerSession> {
    let data = daybook.store().load();

    let found = if let Some(d) = data.drafts.into_iter().find(|d| d.id == id) {
        Some((d.title, d.content, d.images))
    } else if let Some(s) = data.scheduled.into_iter().find(|s| s.id == id) {
        Some((s.title, s.content, s.images))
    } else {
        data.posts
            .into_iter()
            .find(|p| p.id == id)
            .map(|p| (p.title, p.content, p.images))
    };

    let (title, content, images) = found.ok_or_else(|| StoreError::NotFound {
        kind: "post, draft or scheduled post",
        id: id.to_string(),
    })?;

    Ok(ComposerSession {
        title,
        content,
        images,
        ..Default::default()
    })
}

/// Run the preview command
pub fn run(daybook: &Daybook, id: Option<&str>, input: &PostInput, output: Option<PathBuf>) -> Result<()> {
    let path = preview(daybook, id, input, output, Utc::now())?;
    println!("Preview written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_does_not_touch_store() {
        let dir = tempfile::tempdir().unwrap();
        let daybook = Daybook::new(dir.path()).unwrap();
        let input = PostInput {
            content: Some("**Bold** start".to_string()),
            ..Default::default()
        };

        let path = preview(&daybook, None, &input, None, Utc::now()).unwrap();
        let html = fs::read_to_string(path).unwrap();
        assert!(html.contains("Untitled"));
        assert!(html.contains("<strong>Bold</strong> start"));
        assert!(!daybook.store_path.exists());

        assert!(preview(&daybook, Some("missing"), &input, None, Utc::now()).is_err());
    }
}
