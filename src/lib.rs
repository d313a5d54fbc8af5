//! daybook: a one-post-a-day personal blog
//!
//! Posts are written in a small markup (bold, italic, pull quotes, inline
//! images) and kept in a single JSON store together with drafts and
//! scheduled posts. The reader side is rendered with Tera templates, either
//! to static files or on demand by the built-in server.

pub mod archive;
pub mod commands;
pub mod composer;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod scheduler;
pub mod server;
pub mod store;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::helpers::SiteZone;
use crate::store::PostStore;

/// Name of the site configuration file
pub const CONFIG_FILE: &str = "_config.yml";

/// The main Daybook application
#[derive(Debug, Clone)]
pub struct Daybook {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Post store file
    pub store_path: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Static files copied verbatim into the output
    pub assets_dir: PathBuf,
    /// Site timezone, parsed from `config.timezone`
    pub zone: SiteZone,
}

impl Daybook {
    /// Create a new Daybook instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let zone: SiteZone = config.timezone.parse()?;
        let store_path = base_dir.join(&config.store_file);
        let public_dir = base_dir.join(&config.public_dir);
        let assets_dir = base_dir.join(&config.assets_dir);

        Ok(Self {
            config,
            base_dir,
            store_path,
            public_dir,
            assets_dir,
            zone,
        })
    }

    /// Handle on the post store
    pub fn store(&self) -> PostStore {
        PostStore::new(&self.store_path)
    }

    /// Generate the static site
    pub fn generate(&self) -> Result<()> {
        commands::generate::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
