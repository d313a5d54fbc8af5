//! List posts, drafts and scheduled posts

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::helpers::{format_date_time, truncate};
use crate::Daybook;

/// Which collection to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Posts,
    Drafts,
    Scheduled,
}

/// Lines describing one collection, header first
pub fn lines(daybook: &Daybook, kind: ListKind) -> Vec<String> {
    let store = daybook.store();
    let zone = &daybook.zone;
    let when = |at: &DateTime<Utc>| format_date_time(&zone.localize(at));

    match kind {
        ListKind::Posts => {
            let posts = store.list_published();
            let mut out = vec![format!("Posts ({}):", posts.len())];
            out.extend(
                posts
                    .iter()
                    .map(|p| format!("  {} - {} [{}]", when(&p.published_at), p.title, p.id)),
            );
            out
        }
        ListKind::Drafts => {
            let drafts = store.list_drafts();
            let mut out = vec![format!("Drafts ({}):", drafts.len())];
            out.extend(drafts.iter().map(|d| {
                format!(
                    "  {} - {} [{}] {}",
                    when(&d.updated_at),
                    d.title,
                    d.id,
                    truncate(&d.content.replace('\n', " "), 40, None)
                )
            }));
            out
        }
        ListKind::Scheduled => {
            let scheduled = store.list_scheduled();
            let mut out = vec![format!("Scheduled ({}):", scheduled.len())];
            out.extend(
                scheduled
                    .iter()
                    .map(|s| format!("  {} - {} [{}]", when(&s.scheduled_for), s.title, s.id)),
            );
            out
        }
    }
}

/// Run the list command. Due posts are promoted first so the listing
/// matches what readers see.
pub fn run(daybook: &Daybook, kind: ListKind) -> Result<()> {
    let promoted = daybook.store().promote_due(Utc::now())?;
    if !promoted.is_empty() {
        tracing::info!("Promoted {} scheduled posts", promoted.len());
    }

    for line in lines(daybook, kind) {
        println!("{}", line);
    }
    Ok(())
}
