//! Write a new post, draft or scheduled post

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::PostInput;
use crate::composer::{ComposerSession, Submitted};
use crate::helpers::{format_date_time, SiteZone};
use crate::Daybook;

/// Compose from `input` and publish it, schedule it when a date is given, or
/// keep it as a draft. Returns a summary line.
pub fn create(daybook: &Daybook, input: &PostInput, draft: bool, now: DateTime<Utc>) -> Result<String> {
    let store = daybook.store();
    let mut session = ComposerSession::new();
    input.apply(&mut session)?;

    if draft {
        let draft = session.save_draft(&store, now)?;
        return Ok(format!("Saved draft: {}", draft.id));
    }

    let submitted = session.submit(&store, &daybook.zone, now)?;
    Ok(describe(&submitted, &daybook.zone))
}

/// Run the new command
pub fn run(daybook: &Daybook, input: &PostInput, draft: bool) -> Result<()> {
    println!("{}", create(daybook, input, draft, Utc::now())?);
    Ok(())
}

/// One-line summary of a submit
pub fn describe(submitted: &Submitted, zone: &SiteZone) -> String {
    match submitted {
        Submitted::Published(post) => format!("Published: {} ({})", post.id, post.title),
        Submitted::Scheduled(post) => format!(
            "Scheduled: {} for {}",
            post.id,
            format_date_time(&zone.localize(&post.scheduled_for))
        ),
    }
}
