//! Built-in theme templates using Tera template engine
//!
//! All templates are embedded directly in the binary, so a site needs no
//! theme directory of its own.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::helpers::{format_date, truncate, url_for};

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all theme templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Post bodies are already HTML; text fields use `| escape` explicitly
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("theme/layout.html")),
            ("home.html", include_str!("theme/home.html")),
            ("archive.html", include_str!("theme/archive.html")),
            ("post.html", include_str!("theme/post.html")),
            ("not_found.html", include_str!("theme/not_found.html")),
            ("preview.html", include_str!("theme/preview.html")),
            (
                "partials/post_header.html",
                include_str!("theme/partials/post_header.html"),
            ),
        ])?;

        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: truncate by character count, omission included
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 30,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    Ok(tera::Value::String(truncate(&s, length, Some(&omission))))
}

/// Tera filter: reformat an RFC 3339 timestamp with a Moment.js-style format
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "YYYY-MM-DD".to_string(),
    };

    // Keeps the offset the timestamp was written with
    match chrono::DateTime::parse_from_rfc3339(&s) {
        Ok(date) => Ok(tera::Value::String(format_date(&date, &format))),
        Err(_) => Ok(tera::Value::String(s)),
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub url: String,
    pub root: String,
    pub date_format: String,
    pub nav_title_length: usize,
    pub home_url: String,
    pub archive_url: String,
}

impl From<&SiteConfig> for ConfigData {
    fn from(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            language: config.language.clone(),
            url: config.url.clone(),
            root: config.root.clone(),
            date_format: config.date_format.clone(),
            nav_title_length: config.nav_title_length,
            home_url: url_for(config, "/"),
            archive_url: url_for(config, "archive.html"),
        }
    }
}

/// A post as displayed on the homepage or its own page
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Absolute URL including the site domain
    pub permalink: String,
    /// Local publish time, RFC 3339
    pub date: String,
    pub day: u32,
    /// Like "January"
    pub month: String,
    pub year: i32,
    /// Rendered markup
    pub content: String,
}

/// A post as listed in the archive
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveCard {
    pub id: String,
    pub title: String,
    pub url: String,
    pub day: u32,
    pub preview: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthView {
    pub label: String,
    pub posts: Vec<ArchiveCard>,
}

/// Previous/next link on a post page
#[derive(Debug, Clone, Serialize)]
pub struct NavLink {
    pub title: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_data() -> ConfigData {
        ConfigData::from(&SiteConfig::default())
    }

    fn view(title: &str) -> PostView {
        PostView {
            id: "2024-03-05-hi".to_string(),
            title: title.to_string(),
            url: "/posts/2024-03-05-hi.html".to_string(),
            permalink: "http://example.com/posts/2024-03-05-hi.html".to_string(),
            date: "2024-03-05T09:00:00-05:00".to_string(),
            day: 5,
            month: "March".to_string(),
            year: 2024,
            content: r#"<p class="drop-cap">Hello</p>"#.to_string(),
        }
    }

    #[test]
    fn test_all_templates_parse() {
        assert!(TemplateRenderer::new().is_ok());
    }

    #[test]
    fn test_home_escapes_title_but_not_body() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("config", &config_data());
        context.insert("current_year", "2024");
        context.insert("post", &view("<script>"));

        let html = renderer.render("home.html", &context).unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(r#"<p class="drop-cap">Hello</p>"#));
        assert!(html.contains("Mar 5, 2024"));
    }

    #[test]
    fn test_home_placeholder_without_post() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("config", &config_data());
        context.insert("current_year", "2024");

        let html = renderer.render("home.html", &context).unwrap();
        assert!(html.contains("post-placeholder"));
    }

    #[test]
    fn test_post_nav_labels_are_truncated() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("config", &config_data());
        context.insert("current_year", "2024");
        context.insert("post", &view("Current"));
        context.insert(
            "prev_post",
            &NavLink {
                title: "A rather long title that keeps on going".to_string(),
                url: "/posts/a.html".to_string(),
            },
        );

        let html = renderer.render("post.html", &context).unwrap();
        assert!(html.contains("A rather long title that ke..."));
        assert!(html.contains(r#"<span class="post-nav-link disabled">Next &rarr;</span>"#));
    }
}
