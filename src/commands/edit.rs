//! Edit a draft, scheduled post or published post

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

use super::new::describe;
use super::PostInput;
use crate::composer::ComposerSession;
use crate::error::StoreError;
use crate::Daybook;

/// Apply `input` to the entry with `id`.
///
/// A draft is saved again, or submitted when `publish` is set or a publish
/// time is given. A scheduled post is taken off the schedule, edited and
/// submitted again; it is put back unchanged if that fails. A published
/// post is updated in place and keeps its id and date.
pub fn edit(
    daybook: &Daybook,
    id: &str,
    input: &PostInput,
    publish: bool,
    now: DateTime<Utc>,
) -> Result<String> {
    let store = daybook.store();
    let zone = &daybook.zone;
    let data = store.load();
    let mut session = ComposerSession::new();

    if data.drafts.iter().any(|d| d.id == id) {
        session.load_draft(&store, id)?;
        input.apply(&mut session)?;

        if publish || input.has_schedule() {
            let submitted = session.submit(&store, zone, now)?;
            return Ok(describe(&submitted, zone));
        }
        let draft = session.save_draft(&store, now)?;
        return Ok(format!("Updated draft: {}", draft.id));
    }

    if data.scheduled.iter().any(|s| s.id == id) {
        let original = session.load_scheduled(&store, id, zone)?;
        let resubmit = input.apply(&mut session).and_then(|_| {
            if publish && !input.has_schedule() {
                session.schedule = None;
            }
            Ok(session.submit(&store, zone, now)?)
        });

        return match resubmit {
            Ok(submitted) => Ok(describe(&submitted, zone)),
            Err(e) => {
                store.add_scheduled(original)?;
                Err(e)
            }
        };
    }

    if let Some(mut post) = data.posts.into_iter().find(|p| p.id == id) {
        if input.has_schedule() {
            bail!("{} is already published and cannot be scheduled", id);
        }

        session.title = post.title.clone();
        session.content = post.content.clone();
        session.images = std::mem::take(&mut post.images);
        input.apply(&mut session)?;

        let (title, content) = (session.title.trim(), session.content.trim());
        if title.is_empty() || content.is_empty() {
            bail!("Please add a title and content");
        }
        post.title = title.to_string();
        post.content = content.to_string();
        post.images = session.images;
        store.update_post(post)?;
        return Ok(format!("Updated post: {}", id));
    }

    Err(StoreError::NotFound {
        kind: "post, draft or scheduled post",
        id: id.to_string(),
    }
    .into())
}

/// Run the edit command
pub fn run(daybook: &Daybook, id: &str, input: &PostInput, publish: bool) -> Result<()> {
    println!("{}", edit(daybook, id, input, publish, Utc::now())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Draft, ScheduledPost};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn setup() -> (tempfile::TempDir, Daybook) {
        let dir = tempfile::tempdir().unwrap();
        let daybook = Daybook::new(dir.path()).unwrap();
        (dir, daybook)
    }

    fn content(text: &str) -> PostInput {
        PostInput {
            content: Some(text.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_edit_draft_then_publish() {
        let (_dir, daybook) = setup();
        let store = daybook.store();
        store
            .save_draft(Draft {
                id: "d1".to_string(),
                title: "Draft".to_string(),
                content: "v1".to_string(),
                images: Vec::new(),
                created_at: now(),
                updated_at: now(),
            })
            .unwrap();

        edit(&daybook, "d1", &content("v2"), false, now()).unwrap();
        assert_eq!(store.get_draft("d1").unwrap().content, "v2");

        let msg = edit(&daybook, "d1", &PostInput::default(), true, now()).unwrap();
        assert!(msg.starts_with("Published"));
        assert!(store.get_draft("d1").is_none());
        assert_eq!(store.list_published()[0].content, "v2");
    }

    #[test]
    fn test_failed_reschedule_restores_entry() {
        let (_dir, daybook) = setup();
        let store = daybook.store();
        let scheduled = ScheduledPost {
            id: "s1".to_string(),
            title: "Soon".to_string(),
            content: "Body".to_string(),
            images: Vec::new(),
            scheduled_for: now() + Duration::days(1),
            created_at: now(),
        };
        store.add_scheduled(scheduled.clone()).unwrap();

        let past = PostInput {
            date: Some("2020-01-01".to_string()),
            ..Default::default()
        };
        assert!(edit(&daybook, "s1", &past, false, now()).is_err());
        assert_eq!(store.list_scheduled(), vec![scheduled]);
    }

    #[test]
    fn test_edit_published_keeps_id() {
        let (_dir, daybook) = setup();
        let store = daybook.store();
        let post = store.create_post("Title", "Old", Vec::new(), now()).unwrap();

        edit(&daybook, &post.id, &content("New"), false, now()).unwrap();
        let updated = store.get_post(&post.id).unwrap();
        assert_eq!(updated.content, "New");
        assert_eq!(updated.published_at, post.published_at);

        assert!(edit(&daybook, &post.id, &content("  "), false, now()).is_err());
        assert!(edit(&daybook, "missing", &content("x"), false, now()).is_err());
    }
}
