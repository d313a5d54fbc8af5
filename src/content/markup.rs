//! Post markup rendering
//!
//! The markup is deliberately small: `**bold**`, `*italic*`, `> ` pull
//! quotes, `[img:INDEX:POSITION]` image tokens and blank-line separated
//! paragraphs. The first prose paragraph of a post carries the drop cap.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::post::{ImageRef, Position};
use crate::helpers::{escape_text, html_escape};

lazy_static! {
    static ref BOLD: Regex = Regex::new(r"\*\*(.+?)\*\*").unwrap();
    static ref ITALIC: Regex = Regex::new(r"\*(.+?)\*").unwrap();
    /// Runs after escaping, so the marker is `&gt; `
    static ref QUOTE: Regex = Regex::new(r"(?m)^&gt; (.+)$").unwrap();
    static ref QUOTE_MARKER: Regex = Regex::new(r"(?m)^> ").unwrap();
    static ref IMAGE: Regex = Regex::new(r"\[img:(\d+):(\w+)\]").unwrap();
    static ref PARAGRAPH_BREAK: Regex = Regex::new(r"\n[ \t]*\n").unwrap();
}

const PULL_QUOTE_OPEN: &str = r#"<p class="pull-quote">"#;
const IMAGE_OPEN: &str = r#"<div class="post-image-container "#;
const MISSING_IMAGE: &str = r#"<div class="image-missing">[Image not found]</div>"#;

/// Render post markup to an HTML fragment.
///
/// Never fails: an image token pointing past the end of `images` renders a
/// visible placeholder block.
pub fn format(markup: &str, images: &[ImageRef]) -> String {
    let text = markup.replace("\r\n", "\n");
    let html = escape_text(&text);

    let html = BOLD.replace_all(&html, "<strong>$1</strong>");
    let html = ITALIC.replace_all(&html, "<em>$1</em>");
    // Quote lines always stand alone, even when they touch a prose line
    let html = QUOTE.replace_all(&html, "\n\n<p class=\"pull-quote\">\"$1\"</p>\n\n");
    let html = IMAGE.replace_all(&html, |caps: &Captures| {
        let image = caps[1].parse::<usize>().ok().and_then(|i| images.get(i));
        match image {
            Some(image) => image_block(image, Position::parse(&caps[2])),
            None => MISSING_IMAGE.to_string(),
        }
    });

    let mut drop_cap_used = false;
    PARAGRAPH_BREAK
        .split(&html)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            if is_block(p) {
                p.to_string()
            } else if !drop_cap_used {
                drop_cap_used = true;
                format!(r#"<p class="drop-cap">{}</p>"#, p)
            } else {
                format!("<p>{}</p>", p)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plain-text excerpt for archive cards: markup stripped, cut to `max`
/// characters followed by `...` when longer.
pub fn preview_text(markup: &str, max: usize) -> String {
    let text = BOLD.replace_all(markup, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = QUOTE_MARKER.replace_all(&text, "");
    let text = IMAGE.replace_all(&text, "");
    let text = text.trim();

    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut.trim())
    } else {
        text.to_string()
    }
}

fn is_block(paragraph: &str) -> bool {
    paragraph.starts_with(PULL_QUOTE_OPEN)
        || paragraph.starts_with(IMAGE_OPEN)
        || paragraph.starts_with(MISSING_IMAGE)
}

fn image_block(image: &ImageRef, position: Position) -> String {
    let alt = if image.caption.is_empty() {
        "Image"
    } else {
        image.caption.as_str()
    };
    let caption = if image.caption.is_empty() {
        String::new()
    } else {
        format!(
            r#"<span class="image-caption">{}</span>"#,
            escape_text(&image.caption)
        )
    };

    format!(
        r#"{}{}"><img src="{}" alt="{}" class="post-image">{}</div>"#,
        IMAGE_OPEN,
        position.class(),
        html_escape(&image.src),
        html_escape(alt),
        caption
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images() -> Vec<ImageRef> {
        vec![
            ImageRef::new("data:image/png;base64,AAAA", "a.png").with_caption("Sunrise"),
            ImageRef::new("/img/b.jpg", "b.jpg"),
        ]
    }

    #[test]
    fn test_bold_and_italic() {
        let html = format("**a** and *b*", &[]);
        assert_eq!(
            html,
            r#"<p class="drop-cap"><strong>a</strong> and <em>b</em></p>"#
        );
        assert!(!html.contains('*'));
    }

    #[test]
    fn test_unmatched_asterisk_is_literal() {
        assert_eq!(format("2 * 3", &[]), r#"<p class="drop-cap">2 * 3</p>"#);
    }

    #[test]
    fn test_pull_quote_never_gets_drop_cap() {
        assert_eq!(format("> hello", &[]), r#"<p class="pull-quote">"hello"</p>"#);

        let html = format("> hello\n\nFirst words.\n\nMore words.", &[]);
        assert_eq!(
            html,
            "<p class=\"pull-quote\">\"hello\"</p>\n\
             <p class=\"drop-cap\">First words.</p>\n\
             <p>More words.</p>"
        );
    }

    #[test]
    fn test_quote_line_splits_surrounding_prose() {
        let html = format("Before the quote.\n> quoted\nAfter it.", &[]);
        assert_eq!(
            html,
            "<p class=\"drop-cap\">Before the quote.</p>\n\
             <p class=\"pull-quote\">\"quoted\"</p>\n\
             <p>After it.</p>"
        );

        let html = format("> one\n> two", &[]);
        assert_eq!(
            html,
            "<p class=\"pull-quote\">\"one\"</p>\n<p class=\"pull-quote\">\"two\"</p>"
        );
    }

    #[test]
    fn test_only_first_paragraph_gets_drop_cap() {
        let html = format("One\n\nTwo\n\n\n\nThree", &[]);
        assert_eq!(html.matches("drop-cap").count(), 1);
        assert!(html.starts_with(r#"<p class="drop-cap">One</p>"#));
        assert!(html.ends_with("<p>Three</p>"));
        assert_eq!(html.lines().count(), 3);
    }

    #[test]
    fn test_image_blocks() {
        let html = format("[img:0:left]\n\nText\n\n[img:1:sideways]\n\n[img:0:right]", &images());
        let blocks: Vec<&str> = html.lines().collect();
        assert_eq!(blocks.len(), 4);
        assert_eq!(
            blocks[0],
            r#"<div class="post-image-container floating-left"><img src="data:image/png;base64,AAAA" alt="Sunrise" class="post-image"><span class="image-caption">Sunrise</span></div>"#
        );
        assert_eq!(blocks[1], r#"<p class="drop-cap">Text</p>"#);
        assert!(blocks[2].contains("full-width"));
        assert!(blocks[2].contains(r#"alt="Image""#));
        assert!(blocks[3].contains("floating-right"));
        assert!(blocks[3].contains("Sunrise"));
    }

    #[test]
    fn test_missing_image_is_placeholder() {
        let html = format("[img:5:left]\n\nBody", &images()[..2]);
        assert_eq!(
            html,
            "<div class=\"image-missing\">[Image not found]</div>\n<p class=\"drop-cap\">Body</p>"
        );
    }

    #[test]
    fn test_inline_image_stays_in_paragraph() {
        let html = format("Before [img:1:right] after", &images());
        assert!(html.starts_with(r#"<p class="drop-cap">Before <div class="post-image-container floating-right">"#));
    }

    #[test]
    fn test_text_is_escaped() {
        let html = format("<script>alert(1)</script> & more", &[]);
        assert_eq!(
            html,
            r#"<p class="drop-cap">&lt;script&gt;alert(1)&lt;/script&gt; &amp; more</p>"#
        );
    }

    #[test]
    fn test_windows_line_endings_and_empty_input() {
        let html = format("One\r\n\r\nTwo", &[]);
        assert_eq!(html, "<p class=\"drop-cap\">One</p>\n<p>Two</p>");
        assert_eq!(format("", &[]), "");
        assert_eq!(format("\n\n  \n\n", &[]), "");
    }

    #[test]
    fn test_preview_text() {
        let markup = "**Bold** start\n> quoted *line*\n[img:0:left]";
        assert_eq!(preview_text(markup, 150), "Bold start\nquoted line");

        let long = "word ".repeat(50);
        let preview = preview_text(&long, 20);
        assert_eq!(preview, "word word word word...");
    }
}
