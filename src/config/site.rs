//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,
    /// Fixed offset (`-05:00`) or IANA zone name (`America/New_York`)
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,

    // Storage
    pub store_file: String,

    // Directory
    pub public_dir: String,
    pub assets_dir: String,

    // Display
    pub date_format: String,
    pub preview_length: usize,
    pub nav_title_length: usize,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Daybook".to_string(),
            subtitle: String::new(),
            description: String::new(),
            author: "John Doe".to_string(),
            language: "en".to_string(),
            timezone: "-05:00".to_string(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),

            store_file: "store.json".to_string(),

            public_dir: "public".to_string(),
            assets_dir: "assets".to_string(),

            date_format: "MMM D, YYYY".to_string(),
            preview_length: 150,
            nav_title_length: 30,

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        tracing::debug!("Loaded config from {:?}", path.as_ref());
        Ok(config)
    }
}
