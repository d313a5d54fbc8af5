//! CLI commands

pub mod clean;
pub mod delete;
pub mod edit;
pub mod generate;
pub mod import;
pub mod init;
pub mod list;
pub mod new;
pub mod preview;
pub mod promote;

use anyhow::{Context, Result};
use std::io::Read;
use std::path::PathBuf;
use std::{fs, io};

use crate::composer::{ComposerSession, ScheduleInput, DEFAULT_SCHEDULE_TIME};
use crate::content::ImageRef;

/// Post fields given on the command line. Unset fields leave the session
/// as it is.
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub title: Option<String>,
    /// Markup given inline
    pub content: Option<String>,
    /// Markup file, `-` for stdin
    pub file: Option<PathBuf>,
    /// Image files to attach, in order
    pub images: Vec<PathBuf>,
    /// Local publish date `YYYY-MM-DD`
    pub date: Option<String>,
    /// Local publish time `HH:MM`
    pub time: Option<String>,
}

impl PostInput {
    /// Whether a publish time was given
    pub fn has_schedule(&self) -> bool {
        self.date.is_some() || self.time.is_some()
    }

    /// Copy the given fields into `session`
    pub fn apply(&self, session: &mut ComposerSession) -> Result<()> {
        if let Some(title) = &self.title {
            session.title = title.clone();
        }
        if let Some(content) = self.read_content()? {
            session.content = content;
        }

        for path in &self.images {
            let image = ImageRef::from_file(path)?;
            let index = session.add_image(image);
            println!(
                "Attached {} as {}",
                path.display(),
                ComposerSession::image_token(index)
            );
        }

        if let Some(date) = &self.date {
            let time = self.time.as_deref().unwrap_or(DEFAULT_SCHEDULE_TIME);
            session.schedule = Some(ScheduleInput::new(date.as_str(), time));
        } else if let Some(time) = &self.time {
            match session.schedule.as_mut() {
                Some(schedule) => schedule.time = time.clone(),
                None => anyhow::bail!("--time needs a --date"),
            }
        }

        Ok(())
    }

    fn read_content(&self) -> Result<Option<String>> {
        if let Some(content) = &self.content {
            return Ok(Some(content.clone()));
        }
        match &self.file {
            Some(path) if path.as_os_str() == "-" => {
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok(Some(content))
            }
            Some(path) => fs::read_to_string(path)
                .map(Some)
                .with_context(|| format!("Failed to read {:?}", path)),
            None => Ok(None),
        }
    }
}
