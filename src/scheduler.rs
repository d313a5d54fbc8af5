//! Promotion of scheduled posts
//!
//! There is no background timer. Every read path calls [`promote_due`]
//! before rendering, so a due post becomes visible on the first read after
//! its publish time.

use chrono::{DateTime, Utc};

use crate::content::{Post, ScheduledPost};

/// Split `scheduled` into posts that are due at `now` and those still
/// waiting. Relative order is preserved on both sides.
///
/// Pure and idempotent: feeding `remaining` back in with the same or a
/// later `now` never yields an entry twice.
pub fn promote_due(
    scheduled: Vec<ScheduledPost>,
    now: DateTime<Utc>,
) -> (Vec<Post>, Vec<ScheduledPost>) {
    let (due, remaining): (Vec<_>, Vec<_>) =
        scheduled.into_iter().partition(|post| post.is_due(now));

    let promoted = due.into_iter().map(ScheduledPost::into_post).collect();
    (promoted, remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn scheduled(id: &str, scheduled_for: DateTime<Utc>) -> ScheduledPost {
        ScheduledPost {
            id: id.to_string(),
            title: format!("Title {}", id),
            content: "Body".to_string(),
            images: Vec::new(),
            scheduled_for,
            created_at: scheduled_for - Duration::days(3),
        }
    }

    #[test]
    fn test_due_post_is_promoted() {
        let t = now();
        let (promoted, remaining) =
            promote_due(vec![scheduled("a", t - Duration::seconds(1))], t);
        assert_eq!(promoted.len(), 1);
        assert_eq!(promoted[0].id, "a");
        assert_eq!(promoted[0].published_at, t - Duration::seconds(1));
        assert!(remaining.is_empty());
    }

    #[test]
    fn test_exact_time_is_due() {
        let t = now();
        let (promoted, remaining) = promote_due(vec![scheduled("a", t)], t);
        assert_eq!(promoted.len(), 1);
        assert!(remaining.is_empty());
    }

    #[test]
    fn test_future_post_waits() {
        let t = now();
        let (promoted, remaining) =
            promote_due(vec![scheduled("a", t + Duration::seconds(1))], t);
        assert!(promoted.is_empty());
        assert_eq!(remaining.len(), 1);
    }

    #[test]
    fn test_idempotent_with_non_decreasing_now() {
        let t = now();
        let queue = vec![
            scheduled("past", t - Duration::hours(1)),
            scheduled("soon", t + Duration::minutes(30)),
            scheduled("later", t + Duration::days(2)),
        ];

        let (first, remaining) = promote_due(queue, t);
        assert_eq!(first.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), ["past"]);

        let (again, remaining) = promote_due(remaining, t);
        assert!(again.is_empty());
        assert_eq!(remaining.len(), 2);

        let (next, remaining) = promote_due(remaining, t + Duration::hours(1));
        assert_eq!(next.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), ["soon"]);
        assert_eq!(remaining[0].id, "later");
    }
}
