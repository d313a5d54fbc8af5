//! Generate static files

use anyhow::Result;
use chrono::Utc;

use crate::generator::Generator;
use crate::Daybook;

/// Promote due posts, then render the whole site
pub fn run(daybook: &Daybook) -> Result<()> {
    let start = std::time::Instant::now();
    let now = Utc::now();
    let store = daybook.store();

    let promoted = store.promote_due(now)?;
    if !promoted.is_empty() {
        tracing::info!("Promoted {} scheduled posts", promoted.len());
    }

    let posts = store.list_published();
    tracing::info!("Loaded {} posts", posts.len());

    let generator = Generator::new(daybook)?;
    generator.generate(&posts, now)?;

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}
