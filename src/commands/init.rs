//! Initialize a new Daybook site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::store::{PostStore, StoreData};
use crate::{Daybook, CONFIG_FILE};

const DEFAULT_CONFIG: &str = r#"# Daybook Configuration

# Site
title: Daybook
subtitle: ''
description: ''
author: John Doe
language: en
# Fixed offset (-05:00, no daylight saving) or IANA name (America/New_York)
timezone: '-05:00'

# URL
url: http://example.com
root: /

# Storage
store_file: store.json

# Directory
public_dir: public
assets_dir: assets

# Display
date_format: MMM D, YYYY
preview_length: 150
nav_title_length: 30
"#;

/// Initialize a new site in the given directory. Existing files are kept.
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;
    fs::create_dir_all(target_dir.join("assets"))?;

    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        tracing::info!("Keeping existing {:?}", config_path);
    } else {
        fs::write(&config_path, DEFAULT_CONFIG)?;
    }

    let daybook = Daybook::new(target_dir)?;
    if !daybook.store_path.exists() {
        PostStore::new(&daybook.store_path).save(&mut StoreData::default())?;
        tracing::info!("Created empty store {:?}", daybook.store_path);
    }

    Ok(())
}
