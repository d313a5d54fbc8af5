//! Import of legacy post collections
//!
//! Two older layouts exist. The date-keyed map stores at most one post per
//! calendar day under its `YYYY-MM-DD` key. The static document
//! `{"posts": [...]}` carries ids but addresses images with self-contained
//! `[img:URL:POSITION:CAPTION]` tokens. Both are converted into id-keyed
//! [`Post`]s whose image tokens index into `Post::images`.

use chrono::{DateTime, NaiveTime, Utc};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::post::{ImageRef, Position, Post};
use crate::error::MigrateError;
use crate::helpers::{parse_date, SiteZone};

lazy_static! {
    static ref URL_IMAGE: Regex = Regex::new(r"\[img:([^\]]+?):(\w+):([^\]]*)\]").unwrap();
}

/// The static JSON document served to readers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticDocument {
    pub posts: Vec<StaticPost>,
}

/// One entry of [`StaticDocument`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticPost {
    pub id: String,
    pub title: String,
    /// `YYYY-MM-DD` or RFC 3339
    pub date: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageRef>,
}

impl From<&Post> for StaticPost {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            date: post.published_at.to_rfc3339(),
            content: post.content.clone(),
            images: post.images.clone(),
        }
    }
}

/// Value of the legacy date-keyed map
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DayPost {
    title: String,
    content: String,
    #[serde(default)]
    images: Vec<ImageRef>,
    published_at: Option<DateTime<Utc>>,
}

/// Parse either legacy layout into posts.
pub fn import_document(json: &str, zone: &SiteZone) -> Result<Vec<Post>, MigrateError> {
    let value: serde_json::Value = serde_json::from_str(json)?;

    let is_static = value
        .get("posts")
        .map(|posts| posts.is_array())
        .unwrap_or(false);

    if is_static {
        let document: StaticDocument = serde_json::from_value(value)?;
        tracing::debug!("Importing static document with {} posts", document.posts.len());
        return document
            .posts
            .into_iter()
            .map(|post| import_static_post(post, zone))
            .collect();
    }

    let is_day_map = value
        .as_object()
        .map(|map| map.keys().all(|key| parse_date(key).is_ok()))
        .unwrap_or(false);

    if is_day_map {
        let days: BTreeMap<String, DayPost> = serde_json::from_value(value)?;
        tracing::debug!("Importing date-keyed map with {} posts", days.len());
        return days
            .into_iter()
            .map(|(key, post)| import_day_post(key, post, zone))
            .collect();
    }

    Err(MigrateError::UnknownFormat)
}

/// Rewrite self-contained `[img:URL:POSITION:CAPTION]` tokens into
/// `[img:INDEX:POSITION]`, appending the referenced images to `images`.
/// A URL/caption pair already present reuses its index.
pub fn migrate_url_tokens(content: &str, images: &mut Vec<ImageRef>) -> String {
    URL_IMAGE
        .replace_all(content, |caps: &Captures| {
            let src = &caps[1];
            // `[img:0:left:...]` is an index token with trailing junk
            if src.chars().all(|c| c.is_ascii_digit()) {
                return caps[0].to_string();
            }
            let caption = caps[3].trim();
            let index = match images
                .iter()
                .position(|img| img.src == src && img.caption == caption)
            {
                Some(index) => index,
                None => {
                    images.push(ImageRef::new(src, file_name(src)).with_caption(caption));
                    images.len() - 1
                }
            };
            format!("[img:{}:{}]", index, Position::parse(&caps[2]))
        })
        .into_owned()
}

fn import_static_post(post: StaticPost, zone: &SiteZone) -> Result<Post, MigrateError> {
    let published_at = parse_published(&post.date, zone).ok_or_else(|| {
        MigrateError::InvalidDate {
            id: post.id.clone(),
            date: post.date.clone(),
        }
    })?;

    let mut images = post.images;
    let content = migrate_url_tokens(&post.content, &mut images);

    Ok(Post {
        id: post.id,
        title: post.title,
        content,
        images,
        published_at,
    })
}

fn import_day_post(key: String, post: DayPost, zone: &SiteZone) -> Result<Post, MigrateError> {
    let published_at = match post.published_at {
        Some(at) => at,
        None => parse_published(&key, zone).ok_or_else(|| MigrateError::InvalidDate {
            id: key.clone(),
            date: key.clone(),
        })?,
    };

    let mut images = post.images;
    let content = migrate_url_tokens(&post.content, &mut images);

    // The date key was the old URL, keep it as the id
    Ok(Post {
        id: key,
        title: post.title,
        content,
        images,
        published_at,
    })
}

/// RFC 3339 instant, or a bare date taken as local midnight
fn parse_published(date: &str, zone: &SiteZone) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(date) {
        return Some(at.with_timezone(&Utc));
    }
    let day = parse_date(date).ok()?;
    zone.to_utc(day, NaiveTime::MIN).ok()
}

fn file_name(src: &str) -> String {
    src.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(src)
        .to_string()
}
