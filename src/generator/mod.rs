//! Generator module - renders the reader pages with the built-in Tera templates
//!
//! The same render functions back both `daybook generate` (written to the
//! public directory) and the server (rendered per request).

use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};
use std::fs;
use std::path::Path;

use tera::Context;
use walkdir::WalkDir;

use crate::archive::{self, Neighbors};
use crate::composer::Preview;
use crate::content::markup;
use crate::content::migrate::{StaticDocument, StaticPost};
use crate::content::Post;
use crate::helpers::{full_url_for, post_path, post_url, POSTS_DIR};
use crate::templates::{ArchiveCard, ConfigData, MonthView, NavLink, PostView, TemplateRenderer};
use crate::Daybook;

/// Name of the exported post document
pub const POSTS_JSON: &str = "posts.json";

/// Static site generator using Tera templates
pub struct Generator {
    daybook: Daybook,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(daybook: &Daybook) -> Result<Self> {
        Ok(Self {
            daybook: daybook.clone(),
            renderer: TemplateRenderer::new()?,
        })
    }

    /// Generate the entire site from `posts` as seen at `now`
    pub fn generate(&self, posts: &[Post], now: DateTime<Utc>) -> Result<()> {
        let public_dir = &self.daybook.public_dir;
        fs::create_dir_all(public_dir)?;

        self.copy_assets()?;

        // Pages of deleted posts must not linger
        let posts_dir = public_dir.join(POSTS_DIR);
        if posts_dir.exists() {
            fs::remove_dir_all(&posts_dir)?;
        }
        fs::create_dir_all(&posts_dir)?;

        self.write_page("index.html", &self.render_home(posts, now)?)?;
        self.write_page("archive.html", &self.render_archive(posts, now)?)?;

        for post in posts {
            if let Some(html) = self.render_post(posts, &post.id, now)? {
                self.write_page(&post_path(&post.id), &html)?;
            }
        }
        tracing::info!("Generated {} post pages", posts.len());

        self.write_page(POSTS_JSON, &posts_json(posts)?)?;
        tracing::info!("Generated {}", POSTS_JSON);

        Ok(())
    }

    /// Homepage: today's post, else yesterday's, else a placeholder
    pub fn render_home(&self, posts: &[Post], now: DateTime<Utc>) -> Result<String> {
        let zone = &self.daybook.zone;
        let today = zone.local_date(&now);

        let mut context = self.base_context(now);
        if let Some(post) = archive::todays_post(posts, today, zone) {
            context.insert("post", &self.post_view(post));
        }
        self.renderer.render("home.html", &context)
    }

    /// Archive page grouped by month
    pub fn render_archive(&self, posts: &[Post], now: DateTime<Utc>) -> Result<String> {
        let config = &self.daybook.config;
        let zone = &self.daybook.zone;

        let months: Vec<MonthView> = archive::group_by_month(posts, zone)
            .into_iter()
            .map(|group| MonthView {
                label: group.label,
                posts: group
                    .posts
                    .into_iter()
                    .map(|post| ArchiveCard {
                        id: post.id.clone(),
                        title: post.title.clone(),
                        url: post_url(config, &post.id),
                        day: zone.local_date(&post.published_at).day(),
                        preview: markup::preview_text(&post.content, config.preview_length),
                    })
                    .collect(),
            })
            .collect();

        let mut context = self.base_context(now);
        context.insert("months", &months);
        self.renderer.render("archive.html", &context)
    }

    /// A single post page, or `None` when no post has `id`
    pub fn render_post(&self, posts: &[Post], id: &str, now: DateTime<Utc>) -> Result<Option<String>> {
        let Some(post) = posts.iter().find(|p| p.id == id) else {
            return Ok(None);
        };
        let Neighbors { prev, next } = archive::neighbors(posts, id);

        let mut context = self.base_context(now);
        context.insert("post", &self.post_view(post));
        if let Some(prev) = prev {
            context.insert("prev_post", &self.nav_link(prev));
        }
        if let Some(next) = next {
            context.insert("next_post", &self.nav_link(next));
        }

        self.renderer.render("post.html", &context).map(Some)
    }

    /// Page shown for an unknown post id
    pub fn render_not_found(&self, now: DateTime<Utc>) -> Result<String> {
        self.renderer.render("not_found.html", &self.base_context(now))
    }

    /// Composer preview in the reader layout
    pub fn render_preview(&self, preview: &Preview, now: DateTime<Utc>) -> Result<String> {
        let view = PostView {
            id: String::new(),
            title: preview.title.clone(),
            url: String::new(),
            permalink: String::new(),
            date: preview.date.to_rfc3339(),
            day: preview.date.day(),
            month: preview.date.format("%B").to_string(),
            year: preview.date.year(),
            content: preview.html.clone(),
        };

        let mut context = self.base_context(now);
        context.insert("post", &view);
        self.renderer.render("preview.html", &context)
    }

    fn base_context(&self, now: DateTime<Utc>) -> Context {
        let local = self.daybook.zone.localize(&now);

        let mut context = Context::new();
        context.insert("config", &ConfigData::from(&self.daybook.config));
        context.insert("current_year", &local.format("%Y").to_string());
        context
    }

    fn post_view(&self, post: &Post) -> PostView {
        let local = self.daybook.zone.localize(&post.published_at);
        PostView {
            id: post.id.clone(),
            title: post.title.clone(),
            url: post_url(&self.daybook.config, &post.id),
            permalink: full_url_for(&self.daybook.config, &post_path(&post.id)),
            date: local.to_rfc3339(),
            day: local.day(),
            month: local.format("%B").to_string(),
            year: local.year(),
            content: markup::format(&post.content, &post.images),
        }
    }

    fn nav_link(&self, post: &Post) -> NavLink {
        NavLink {
            title: post.title.clone(),
            url: post_url(&self.daybook.config, &post.id),
        }
    }

    fn write_page(&self, relative: &str, content: &str) -> Result<()> {
        let output_path = self.daybook.public_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output_path, content)?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }

    /// Copy static assets (stylesheets, images) to the public directory
    fn copy_assets(&self) -> Result<()> {
        let assets_dir = &self.daybook.assets_dir;
        if !assets_dir.exists() {
            return Ok(());
        }

        let mut copied = 0;
        for entry in WalkDir::new(assets_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || is_hidden(path) {
                continue;
            }

            let relative = path.strip_prefix(assets_dir)?;
            let dest = self.daybook.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
            copied += 1;
        }

        tracing::debug!("Copied {} assets from {:?}", copied, assets_dir);
        Ok(())
    }
}

/// Published posts as the exported static document, in the order given
pub fn posts_json(posts: &[Post]) -> Result<String> {
    let document = StaticDocument {
        posts: posts.iter().map(StaticPost::from).collect(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ImageRef;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Daybook) {
        let dir = tempfile::tempdir().unwrap();
        let daybook = Daybook::new(dir.path()).unwrap();
        (dir, daybook)
    }

    fn now() -> DateTime<Utc> {
        // 10:00 at -05:00
        Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap()
    }

    fn post(id: &str, title: &str, published_at: DateTime<Utc>) -> Post {
        Post {
            id: id.to_string(),
            title: title.to_string(),
            content: format!("Words about {}.\n\nMore **words**.", title),
            images: Vec::new(),
            published_at,
        }
    }

    #[test]
    fn test_generate_writes_site() {
        let (dir, daybook) = setup();
        fs::create_dir_all(daybook.assets_dir.join("css")).unwrap();
        fs::write(daybook.assets_dir.join("css/style.css"), "body{}").unwrap();

        let posts = vec![
            post("2024-03-10-today", "Today", now() - Duration::hours(1)),
            post("2024-02-01-old", "Old", now() - Duration::days(38)),
        ];
        let generator = Generator::new(&daybook).unwrap();
        generator.generate(&posts, now()).unwrap();

        let public = dir.path().join("public");
        let index = fs::read_to_string(public.join("index.html")).unwrap();
        assert!(index.contains("Words about Today."));
        assert!(index.contains("drop-cap"));

        let archive = fs::read_to_string(public.join("archive.html")).unwrap();
        assert!(archive.contains("March 2024"));
        assert!(archive.contains("February 2024"));
        assert!(archive.contains("/posts/2024-02-01-old.html"));

        let single = fs::read_to_string(public.join("posts/2024-02-01-old.html")).unwrap();
        assert!(single.contains(r#"href="/posts/2024-03-10-today.html""#));
        assert!(single.contains("&larr; Previous"));
        assert!(single.contains(r#"<link rel="canonical" href="http://example.com/posts/2024-02-01-old.html">"#));

        assert!(public.join("css/style.css").exists());

        let json = fs::read_to_string(public.join(POSTS_JSON)).unwrap();
        let doc: StaticDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(doc.posts.len(), 2);
    }

    #[test]
    fn test_generate_drops_stale_post_pages() {
        let (dir, daybook) = setup();
        let generator = Generator::new(&daybook).unwrap();
        let posts = vec![post("gone", "Gone", now())];
        generator.generate(&posts, now()).unwrap();
        assert!(dir.path().join("public/posts/gone.html").exists());

        generator.generate(&[], now()).unwrap();
        assert!(!dir.path().join("public/posts/gone.html").exists());
    }

    #[test]
    fn test_home_falls_back_to_placeholder() {
        let (_dir, daybook) = setup();
        let generator = Generator::new(&daybook).unwrap();
        let posts = vec![post("old", "Old", now() - Duration::days(5))];

        let html = generator.render_home(&posts, now()).unwrap();
        assert!(html.contains("post-placeholder"));
        assert!(!html.contains("Words about Old"));
    }

    #[test]
    fn test_home_uses_site_calendar_day() {
        let (_dir, daybook) = setup();
        let generator = Generator::new(&daybook).unwrap();
        // 03:00 UTC on Mar 10 is still Mar 9 at -05:00, i.e. yesterday
        let posts = vec![post("late", "Late Night", Utc.with_ymd_and_hms(2024, 3, 10, 3, 0, 0).unwrap())];

        let html = generator.render_home(&posts, now()).unwrap();
        assert!(html.contains("Late Night"));
        assert!(html.contains(r#"<span class="post-day" id="post-day">9</span>"#));
    }

    #[test]
    fn test_render_post_unknown_id() {
        let (_dir, daybook) = setup();
        let generator = Generator::new(&daybook).unwrap();
        assert!(generator.render_post(&[], "nope", now()).unwrap().is_none());
        assert!(generator
            .render_not_found(now())
            .unwrap()
            .contains("Post not found"));
    }

    #[test]
    fn test_imported_id_cannot_break_out_of_attributes() {
        let (_dir, daybook) = setup();
        let generator = Generator::new(&daybook).unwrap();
        let id = r#"x" onmouseover="alert(1)"#;
        let posts = vec![post(id, "Quoted", now() - Duration::hours(1))];

        let pages = [
            generator.render_home(&posts, now()).unwrap(),
            generator.render_archive(&posts, now()).unwrap(),
            generator.render_post(&posts, id, now()).unwrap().unwrap(),
        ];
        for html in &pages {
            assert!(html.contains(r#"data-id="x&quot; onmouseover=&quot;alert(1)""#));
            assert!(!html.contains(r#"onmouseover="alert(1)""#));
        }
    }

    #[test]
    fn test_missing_image_renders_placeholder() {
        let (_dir, daybook) = setup();
        let generator = Generator::new(&daybook).unwrap();
        let mut p = post("img", "Pictures", now());
        p.content = "[img:5:left]\n\nCaption text".to_string();
        p.images = vec![ImageRef::new("/a.png", "a.png"), ImageRef::new("/b.png", "b.png")];

        let html = generator.render_post(&[p], "img", now()).unwrap().unwrap();
        assert!(html.contains("[Image not found]"));
    }
}
