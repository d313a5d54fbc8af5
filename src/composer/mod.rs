//! Admin composer
//!
//! A [`ComposerSession`] holds the post being written: its title, markup,
//! attached images, the draft it was loaded from and an optional publish
//! time. The caller owns the session and passes the store in for each
//! workflow step.

use base64::Engine;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use std::fs;
use std::ops::Range;
use std::path::Path;

use crate::content::{markup, Draft, ImageRef, Position, Post, ScheduledPost};
use crate::error::{ComposeError, ScheduleError, StoreError};
use crate::helpers::{parse_date, parse_time, SiteZone};
use crate::store::PostStore;

/// Time used when a schedule gives only a date
pub const DEFAULT_SCHEDULE_TIME: &str = "09:00";

/// Local publish date and time as typed by the author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleInput {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
}

impl ScheduleInput {
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
        }
    }

    /// Tomorrow at the default time
    pub fn tomorrow(zone: &SiteZone, now: DateTime<Utc>) -> Self {
        let date = zone.local_date(&(now + Duration::days(1)));
        Self::new(date.format("%Y-%m-%d").to_string(), DEFAULT_SCHEDULE_TIME)
    }

    /// The instant this input names in the site zone
    pub fn resolve(&self, zone: &SiteZone) -> Result<DateTime<Utc>, ScheduleError> {
        let date = parse_date(&self.date)?;
        let time = if self.time.trim().is_empty() {
            parse_time(DEFAULT_SCHEDULE_TIME)?
        } else {
            parse_time(&self.time)?
        };
        zone.to_utc(date, time)
    }
}

/// Formatting shortcuts offered while writing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    Bold,
    Italic,
    Quote,
    DropCap,
    Image(Position),
}

/// Result of a toolbar action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarEdit {
    /// New cursor position (byte offset into the content)
    pub cursor: usize,
    /// Note for the author, if any
    pub hint: Option<&'static str>,
}

/// What a submit produced
#[derive(Debug, Clone)]
pub enum Submitted {
    Published(Post),
    Scheduled(ScheduledPost),
}

/// Rendered preview of the session
#[derive(Debug, Clone)]
pub struct Preview {
    pub title: String,
    pub date: DateTime<FixedOffset>,
    pub html: String,
}

/// The post currently being composed
#[derive(Debug, Clone, Default)]
pub struct ComposerSession {
    pub title: String,
    pub content: String,
    pub images: Vec<ImageRef>,
    /// Draft this session was loaded from or last saved to
    pub current_draft: Option<String>,
    /// Set when the post should be scheduled rather than published now
    pub schedule: Option<ScheduleInput>,
}

impl ComposerSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an image and return its index for `[img:INDEX:POSITION]`
    pub fn add_image(&mut self, image: ImageRef) -> usize {
        self.images.push(image);
        self.images.len() - 1
    }

    /// Detach an image. Later images shift down by one.
    pub fn remove_image(&mut self, index: usize) -> Option<ImageRef> {
        (index < self.images.len()).then(|| self.images.remove(index))
    }

    /// Suggested token for an attached image
    pub fn image_token(index: usize) -> String {
        format!("[img:{}:{}]", index, Position::Right)
    }

    /// Apply a toolbar action to `selection` of the content.
    ///
    /// The selection is clamped to the content and to char boundaries.
    /// With an empty selection, bold/italic/quote insert placeholder text
    /// and leave the cursor inside it.
    pub fn apply_toolbar(&mut self, action: ToolbarAction, selection: Range<usize>) -> ToolbarEdit {
        let (start, end) = clamp_selection(&self.content, selection);
        let selected = &self.content[start..end];
        let or_default = |fallback: &str| -> String {
            if selected.is_empty() {
                fallback.to_string()
            } else {
                selected.to_string()
            }
        };

        let (insertion, back, hint) = match action {
            ToolbarAction::Bold => (
                format!("**{}**", or_default("bold text")),
                if selected.is_empty() { 2 } else { 0 },
                None,
            ),
            ToolbarAction::Italic => (
                format!("*{}*", or_default("italic text")),
                if selected.is_empty() { 1 } else { 0 },
                None,
            ),
            ToolbarAction::Quote => (
                format!("\n\n> {}\n\n", or_default("Your quote here")),
                if selected.is_empty() { 2 } else { 0 },
                None,
            ),
            ToolbarAction::DropCap => {
                return ToolbarEdit {
                    cursor: end,
                    hint: Some("The first paragraph automatically gets a drop cap!"),
                };
            }
            ToolbarAction::Image(position) => (
                format!("[img:0:{}]", position),
                0,
                Some("Change the number to match your image."),
            ),
        };

        self.content.replace_range(start..end, &insertion);
        ToolbarEdit {
            cursor: start + insertion.len() - back,
            hint,
        }
    }

    /// Save the session as a draft, creating one on first save.
    pub fn save_draft(&mut self, store: &PostStore, now: DateTime<Utc>) -> Result<Draft, ComposeError> {
        let title = self.title.trim();
        let content = self.content.trim();
        if title.is_empty() && content.is_empty() {
            return Err(ComposeError::Validation("Nothing to save".to_string()));
        }
        let title = if title.is_empty() { "Untitled" } else { title };

        let draft = store.transaction(|data| {
            let existing = self
                .current_draft
                .as_deref()
                .and_then(|id| data.drafts.iter().find(|d| d.id == id))
                .cloned();

            let draft = match existing {
                Some(existing) => Draft {
                    title: title.to_string(),
                    content: content.to_string(),
                    images: self.images.clone(),
                    updated_at: now,
                    ..existing
                },
                None => Draft {
                    id: data.next_id(title, now),
                    title: title.to_string(),
                    content: content.to_string(),
                    images: self.images.clone(),
                    created_at: now,
                    updated_at: now,
                },
            };
            data.upsert_draft(draft.clone());
            Ok(draft)
        })?;

        tracing::info!("Saved draft {}", draft.id);
        self.current_draft = Some(draft.id.clone());
        Ok(draft)
    }

    /// Replace the session with a stored draft
    pub fn load_draft(&mut self, store: &PostStore, id: &str) -> Result<(), ComposeError> {
        let draft = store.get_draft(id).ok_or_else(|| StoreError::NotFound {
            kind: "draft",
            id: id.to_string(),
        })?;

        *self = Self {
            title: draft.title,
            content: draft.content,
            images: draft.images,
            current_draft: Some(draft.id),
            schedule: None,
        };
        Ok(())
    }

    /// Move a scheduled post back into the session for editing. It leaves
    /// the schedule until the session is submitted again.
    pub fn load_scheduled(
        &mut self,
        store: &PostStore,
        id: &str,
        zone: &SiteZone,
    ) -> Result<ScheduledPost, ComposeError> {
        let post = store.take_scheduled(id)?;
        let local = zone.localize(&post.scheduled_for);

        *self = Self {
            title: post.title.clone(),
            content: post.content.clone(),
            images: post.images.clone(),
            current_draft: None,
            schedule: Some(ScheduleInput::new(
                local.format("%Y-%m-%d").to_string(),
                local.format("%H:%M").to_string(),
            )),
        };
        Ok(post)
    }

    /// Publish now. On success the draft being edited is removed and the
    /// session is cleared; on failure nothing changes.
    pub fn publish(&mut self, store: &PostStore, now: DateTime<Utc>) -> Result<Post, ComposeError> {
        let (title, content) = self.required_fields()?;

        let post = store.transaction(|data| {
            let post = Post {
                id: data.next_id(&title, now),
                title,
                content,
                images: self.images.clone(),
                published_at: now,
            };
            data.upsert_post(post.clone());
            if let Some(draft) = &self.current_draft {
                data.remove_draft(draft);
            }
            Ok(post)
        })?;

        tracing::info!("Published {} ({})", post.id, post.title);
        self.clear();
        Ok(post)
    }

    /// Schedule for the session's publish time, which must lie in the
    /// future. Clears the session on success.
    pub fn schedule(
        &mut self,
        store: &PostStore,
        zone: &SiteZone,
        now: DateTime<Utc>,
    ) -> Result<ScheduledPost, ComposeError> {
        let (title, content) = self.required_fields()?;
        let input = self
            .schedule
            .as_ref()
            .filter(|s| !s.date.trim().is_empty())
            .ok_or_else(|| ComposeError::Validation("Please select a date".to_string()))?;

        let scheduled_for = input.resolve(zone)?;
        if scheduled_for <= now {
            return Err(ScheduleError::InPast(zone.localize(&scheduled_for).to_rfc3339()).into());
        }

        let scheduled = store.transaction(|data| {
            let scheduled = ScheduledPost {
                id: data.next_id(&title, scheduled_for),
                title,
                content,
                images: self.images.clone(),
                scheduled_for,
                created_at: now,
            };
            data.scheduled.push(scheduled.clone());
            if let Some(draft) = &self.current_draft {
                data.remove_draft(draft);
            }
            Ok(scheduled)
        })?;

        tracing::info!("Scheduled {} for {}", scheduled.id, scheduled.scheduled_for);
        self.clear();
        Ok(scheduled)
    }

    /// Publish or schedule depending on whether a schedule is set
    pub fn submit(
        &mut self,
        store: &PostStore,
        zone: &SiteZone,
        now: DateTime<Utc>,
    ) -> Result<Submitted, ComposeError> {
        if self.schedule.is_some() {
            self.schedule(store, zone, now).map(Submitted::Scheduled)
        } else {
            self.publish(store, now).map(Submitted::Published)
        }
    }

    /// Render the session as readers would see it, without saving
    pub fn preview(&self, zone: &SiteZone, now: DateTime<Utc>) -> Preview {
        let title = match self.title.trim() {
            "" => "Untitled",
            title => title,
        };
        let content = match self.content.trim() {
            "" => "No content yet...",
            content => content,
        };

        Preview {
            title: title.to_string(),
            date: zone.localize(&now),
            html: markup::format(content, &self.images),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn required_fields(&self) -> Result<(String, String), ComposeError> {
        let title = self.title.trim();
        let content = self.content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(ComposeError::Validation(
                "Please add a title and content".to_string(),
            ));
        }
        Ok((title.to_string(), content.to_string()))
    }
}

impl ImageRef {
    /// Read an image file into an inline `data:` URL reference
    pub fn from_file(path: &Path) -> Result<Self, ComposeError> {
        let mime = match mime_guess::from_path(path).first() {
            Some(mime) if mime.type_() == mime_guess::mime::IMAGE => mime,
            _ => {
                return Err(ComposeError::Image(
                    path.to_path_buf(),
                    "not an image file".to_string(),
                ))
            }
        };

        let bytes =
            fs::read(path).map_err(|e| ComposeError::Image(path.to_path_buf(), e.to_string()))?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self::new(format!("data:{};base64,{}", mime.essence_str(), encoded), name))
    }
}

fn clamp_selection(content: &str, selection: Range<usize>) -> (usize, usize) {
    let mut end = selection.end.min(content.len());
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    let mut start = selection.start.min(end);
    while !content.is_char_boundary(start) {
        start -= 1;
    }
    (start, end)
}
