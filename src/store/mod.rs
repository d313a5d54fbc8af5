//! Flat-file post store
//!
//! Published posts, drafts and scheduled posts live together in one JSON
//! document. Every mutation reads the whole document, changes it and writes
//! it back. The document carries a `revision` counter: a write is refused
//! when the file on disk moved past the revision the caller loaded, so two
//! editors working at once get a conflict instead of silently dropping each
//! other's changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use fd_lock::RwLock;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::content::{generate_id, Draft, ImageRef, Post, ScheduledPost};
use crate::error::StoreError;
use crate::scheduler;

/// Everything persisted in the store file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreData {
    /// Bumped on every successful write
    pub revision: u64,
    pub posts: Vec<Post>,
    pub drafts: Vec<Draft>,
    pub scheduled: Vec<ScheduledPost>,
}

impl StoreData {
    /// Whether any collection already uses `id`
    pub fn id_taken(&self, id: &str) -> bool {
        self.posts.iter().any(|p| p.id == id)
            || self.drafts.iter().any(|d| d.id == id)
            || self.scheduled.iter().any(|s| s.id == id)
    }

    /// A fresh id for content titled `title` created at `at`
    pub fn next_id(&self, title: &str, at: DateTime<Utc>) -> String {
        generate_id(at.date_naive(), title, |id| self.id_taken(id))
    }

    /// Insert or replace a post by id (last write wins)
    pub fn upsert_post(&mut self, post: Post) {
        match self.posts.iter_mut().find(|p| p.id == post.id) {
            Some(existing) => *existing = post,
            None => self.posts.push(post),
        }
    }

    pub fn remove_post(&mut self, id: &str) -> Option<Post> {
        let index = self.posts.iter().position(|p| p.id == id)?;
        Some(self.posts.remove(index))
    }

    /// Insert or replace a draft by id
    pub fn upsert_draft(&mut self, draft: Draft) {
        match self.drafts.iter_mut().find(|d| d.id == draft.id) {
            Some(existing) => *existing = draft,
            None => self.drafts.push(draft),
        }
    }

    pub fn remove_draft(&mut self, id: &str) -> Option<Draft> {
        let index = self.drafts.iter().position(|d| d.id == id)?;
        Some(self.drafts.remove(index))
    }

    pub fn remove_scheduled(&mut self, id: &str) -> Option<ScheduledPost> {
        let index = self.scheduled.iter().position(|s| s.id == id)?;
        Some(self.scheduled.remove(index))
    }
}

/// What the store file currently holds
enum DiskState {
    Missing,
    Revision(u64),
    Malformed,
}

/// Handle on the store file
#[derive(Debug, Clone)]
pub struct PostStore {
    path: PathBuf,
}

impl PostStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the store. A missing, unreadable or malformed file reads as an
    /// empty store.
    pub fn load(&self) -> StoreData {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return StoreData::default(),
            Err(e) => {
                tracing::warn!("Cannot read store {:?}: {}", self.path, e);
                return StoreData::default();
            }
        };

        match serde_json::from_str::<StoreData>(&content) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Store {:?} is malformed, treating as empty: {}", self.path, e);
                StoreData::default()
            }
        }
    }

    /// Write `data` back if nobody else wrote since it was loaded.
    ///
    /// The revision check and the replace run under an exclusive lock on a
    /// sidecar `.lock` file, so concurrent writers serialize and all but
    /// one of them see a conflict. On success `data.revision` is the new
    /// on-disk revision.
    pub fn save(&self, data: &mut StoreData) -> Result<(), StoreError> {
        let dir = self.dir();
        fs::create_dir_all(&dir).map_err(|e| StoreError::Io(dir.clone(), e))?;

        let lock_path = self.path.with_extension("json.lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| StoreError::Io(lock_path.clone(), e))?;
        let mut lock = RwLock::new(lock_file);
        let _guard = lock
            .write()
            .map_err(|e| StoreError::Io(lock_path.clone(), e))?;

        let found = match self.disk_state() {
            DiskState::Missing => 0,
            DiskState::Revision(revision) => revision,
            DiskState::Malformed => {
                self.back_up_malformed()?;
                0
            }
        };

        if found != data.revision {
            return Err(StoreError::Conflict {
                expected: data.revision,
                found,
            });
        }

        let mut next = data.clone();
        next.revision += 1;
        let json = serde_json::to_string_pretty(&next)?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| StoreError::Io(dir.clone(), e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| StoreError::Io(tmp.path().to_path_buf(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::Io(self.path.clone(), e.error))?;

        data.revision = next.revision;
        tracing::debug!("Saved store {:?} at revision {}", self.path, data.revision);
        Ok(())
    }

    /// Load, apply `f`, save. Nothing is written when `f` fails.
    pub fn transaction<T>(
        &self,
        f: impl FnOnce(&mut StoreData) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut data = self.load();
        let out = f(&mut data)?;
        self.save(&mut data)?;
        Ok(out)
    }

    // Published posts

    /// Publish a new post under a freshly generated id
    pub fn create_post(
        &self,
        title: &str,
        content: &str,
        images: Vec<ImageRef>,
        published_at: DateTime<Utc>,
    ) -> Result<Post, StoreError> {
        self.transaction(|data| {
            let post = Post {
                id: data.next_id(title, published_at),
                title: title.to_string(),
                content: content.to_string(),
                images,
                published_at,
            };
            data.upsert_post(post.clone());
            Ok(post)
        })
    }

    /// Replace an existing post
    pub fn update_post(&self, post: Post) -> Result<(), StoreError> {
        self.transaction(|data| match data.posts.iter_mut().find(|p| p.id == post.id) {
            Some(existing) => {
                *existing = post;
                Ok(())
            }
            None => Err(StoreError::NotFound {
                kind: "post",
                id: post.id,
            }),
        })
    }

    /// Insert or replace posts by id, returning how many were written
    pub fn import_posts(&self, posts: Vec<Post>) -> Result<usize, StoreError> {
        self.transaction(|data| {
            let count = posts.len();
            for post in posts {
                data.upsert_post(post);
            }
            Ok(count)
        })
    }

    pub fn delete_post(&self, id: &str) -> Result<Post, StoreError> {
        self.transaction(|data| data.remove_post(id).ok_or_else(|| not_found("post", id)))
    }

    pub fn get_post(&self, id: &str) -> Option<Post> {
        self.load().posts.into_iter().find(|p| p.id == id)
    }

    /// Published posts, newest first
    pub fn list_published(&self) -> Vec<Post> {
        let mut posts = self.load().posts;
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        posts
    }

    // Drafts

    pub fn save_draft(&self, draft: Draft) -> Result<(), StoreError> {
        self.transaction(|data| {
            data.upsert_draft(draft);
            Ok(())
        })
    }

    pub fn get_draft(&self, id: &str) -> Option<Draft> {
        self.load().drafts.into_iter().find(|d| d.id == id)
    }

    pub fn delete_draft(&self, id: &str) -> Result<Draft, StoreError> {
        self.transaction(|data| data.remove_draft(id).ok_or_else(|| not_found("draft", id)))
    }

    /// Drafts, most recently edited first
    pub fn list_drafts(&self) -> Vec<Draft> {
        let mut drafts = self.load().drafts;
        drafts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        drafts
    }

    // Scheduled posts

    pub fn add_scheduled(&self, post: ScheduledPost) -> Result<(), StoreError> {
        self.transaction(|data| {
            data.scheduled.push(post);
            Ok(())
        })
    }

    pub fn get_scheduled(&self, id: &str) -> Option<ScheduledPost> {
        self.load().scheduled.into_iter().find(|s| s.id == id)
    }

    /// Remove a scheduled post and hand it back
    pub fn take_scheduled(&self, id: &str) -> Result<ScheduledPost, StoreError> {
        self.transaction(|data| {
            data.remove_scheduled(id)
                .ok_or_else(|| not_found("scheduled post", id))
        })
    }

    /// Scheduled posts, soonest first
    pub fn list_scheduled(&self) -> Vec<ScheduledPost> {
        let mut scheduled = self.load().scheduled;
        scheduled.sort_by(|a, b| a.scheduled_for.cmp(&b.scheduled_for));
        scheduled
    }

    /// Publish every scheduled post that is due at `now`. The store is only
    /// written when something was promoted.
    pub fn promote_due(&self, now: DateTime<Utc>) -> Result<Vec<Post>, StoreError> {
        let mut data = self.load();
        let queue = std::mem::take(&mut data.scheduled);
        let (promoted, remaining) = scheduler::promote_due(queue, now);
        data.scheduled = remaining;

        if promoted.is_empty() {
            return Ok(promoted);
        }

        for post in &promoted {
            tracing::info!("Publishing scheduled post {} ({})", post.id, post.title);
            data.upsert_post(post.clone());
        }
        self.save(&mut data)?;
        Ok(promoted)
    }

    fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn disk_state(&self) -> DiskState {
        match fs::read_to_string(&self.path) {
            // Must agree with `load`: anything it cannot read counts as malformed
            Ok(content) => match serde_json::from_str::<StoreData>(&content) {
                Ok(data) => DiskState::Revision(data.revision),
                Err(_) => DiskState::Malformed,
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => DiskState::Missing,
            Err(_) => DiskState::Malformed,
        }
    }

    /// Keep a copy of an unreadable store before it gets overwritten
    fn back_up_malformed(&self) -> Result<(), StoreError> {
        let backup = self.path.with_extension("json.bak");
        if self.path.exists() {
            fs::copy(&self.path, &backup).map_err(|e| StoreError::Io(backup.clone(), e))?;
            tracing::warn!("Malformed store copied to {:?} before overwrite", backup);
        }
        Ok(())
    }
}

fn not_found(kind: &'static str, id: &str) -> StoreError {
    StoreError::NotFound {
        kind,
        id: id.to_string(),
    }
}
