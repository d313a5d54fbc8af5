//! Post, draft and scheduled-post models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An image attached to a post, addressed from markup by its index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// `data:` URL for uploaded images, plain URL for imported ones
    pub src: String,

    /// Original file name
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub caption: String,
}

impl ImageRef {
    pub fn new(src: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            name: name.into(),
            caption: String::new(),
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }
}

/// Placement of an image block within the text flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    Left,
    Right,
    #[default]
    Full,
}

impl Position {
    /// Parse a token position; anything unrecognized is full width
    pub fn parse(s: &str) -> Self {
        match s {
            "left" => Position::Left,
            "right" => Position::Right,
            _ => Position::Full,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Left => "left",
            Position::Right => "right",
            Position::Full => "full",
        }
    }

    /// CSS class of the image container
    pub fn class(&self) -> &'static str {
        match self {
            Position::Left => "floating-left",
            Position::Right => "floating-right",
            Position::Full => "full-width",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A published blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,

    pub title: String,

    /// Raw markup
    pub content: String,

    #[serde(default)]
    pub images: Vec<ImageRef>,

    pub published_at: DateTime<Utc>,
}

/// Work in progress, never shown to readers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post waiting for its publish time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPost {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    pub scheduled_for: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ScheduledPost {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_for <= now
    }

    /// The post this entry becomes once it is due
    pub fn into_post(self) -> Post {
        Post {
            id: self.id,
            title: self.title,
            content: self.content,
            images: self.images,
            published_at: self.scheduled_for,
        }
    }
}

/// Build a readable id (`2024-01-15-my-title`) that `taken` does not
/// already contain.
pub fn generate_id(date: NaiveDate, title: &str, taken: impl Fn(&str) -> bool) -> String {
    let slug = slug::slugify(title);
    let base = if slug.is_empty() {
        date.format("%Y-%m-%d").to_string()
    } else {
        format!("{}-{}", date.format("%Y-%m-%d"), slug)
    };

    if !taken(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or(base)
}
