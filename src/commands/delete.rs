//! Delete a post, draft or scheduled post

use anyhow::Result;

use crate::error::StoreError;
use crate::Daybook;

/// Remove the entry with `id` from whichever collection holds it and
/// return what kind of entry it was.
pub fn delete(daybook: &Daybook, id: &str) -> Result<&'static str> {
    let kind = daybook.store().transaction(|data| {
        if data.remove_post(id).is_some() {
            Ok("post")
        } else if data.remove_draft(id).is_some() {
            Ok("draft")
        } else if data.remove_scheduled(id).is_some() {
            Ok("scheduled post")
        } else {
            Err(StoreError::NotFound {
                kind: "post, draft or scheduled post",
                id: id.to_string(),
            })
        }
    })?;

    tracing::info!("Deleted {} {}", kind, id);
    Ok(kind)
}

/// Run the delete command
pub fn run(daybook: &Daybook, id: &str) -> Result<()> {
    let kind = delete(daybook, id)?;
    println!("Deleted {}: {}", kind, id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let daybook = Daybook::new(dir.path()).unwrap();
        let post = daybook
            .store()
            .create_post("Bye", "Body", Vec::new(), Utc::now())
            .unwrap();

        assert_eq!(delete(&daybook, &post.id).unwrap(), "post");
        assert!(daybook.store().list_published().is_empty());
        assert!(delete(&daybook, &post.id).is_err());
    }
}
