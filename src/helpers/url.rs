//! URL helper functions

use crate::config::SiteConfig;

/// Directory holding single-post pages
pub const POSTS_DIR: &str = "posts";

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/archive.html") // -> "/blog/archive.html"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/archive.html") // -> "https://example.com/blog/archive.html"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Path of a single post page relative to the site root
pub fn post_path(id: &str) -> String {
    format!("{}/{}.html", POSTS_DIR, encode_url(id))
}

/// Root-relative URL of a single post page
pub fn post_url(config: &SiteConfig, id: &str) -> String {
    url_for(config, &post_path(id))
}

/// Recover a post id from the file segment of a post URL (`<id>.html`)
pub fn post_id_from_file(file: &str) -> Option<String> {
    let encoded = file.strip_suffix(".html")?;
    percent_encoding::percent_decode_str(encoded)
        .decode_utf8()
        .ok()
        .map(|id| id.into_owned())
}

/// Encode a URL path segment
pub fn encode_url(path: &str) -> String {
    percent_encoding::utf8_percent_encode(path, SEGMENT).to_string()
}

/// Characters escaped in a path segment; ids from `slug` pass through untouched
const SEGMENT: &percent_encoding::AsciiSet = &percent_encoding::NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.');
