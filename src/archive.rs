//! Archive grouping and post navigation
//!
//! Nothing here is cached: the index is derived from the published posts
//! on every read.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use crate::content::Post;
use crate::helpers::{month_label, SiteZone};

/// Posts published in one calendar month
#[derive(Debug, Clone)]
pub struct MonthGroup<'a> {
    pub year: i32,
    pub month: u32,
    /// Like "January 2024"
    pub label: String,
    /// Newest first
    pub posts: Vec<&'a Post>,
}

/// Posts either side of the current one in publication order
#[derive(Debug, Clone, Copy, Default)]
pub struct Neighbors<'a> {
    /// Published just before
    pub prev: Option<&'a Post>,
    /// Published just after
    pub next: Option<&'a Post>,
}

/// Group posts by month of publication in the site zone, newest month first.
pub fn group_by_month<'a>(posts: &'a [Post], zone: &SiteZone) -> Vec<MonthGroup<'a>> {
    let mut months: BTreeMap<(i32, u32), Vec<&'a Post>> = BTreeMap::new();

    for post in posts {
        let date = zone.local_date(&post.published_at);
        months
            .entry((date.year(), date.month()))
            .or_default()
            .push(post);
    }

    months
        .into_iter()
        .rev()
        .map(|((year, month), mut posts)| {
            posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
            MonthGroup {
                year,
                month,
                label: month_label(year, month),
                posts,
            }
        })
        .collect()
}

/// Find the posts published immediately before and after `current_id`.
/// An unknown id has no neighbors.
pub fn neighbors<'a>(posts: &'a [Post], current_id: &str) -> Neighbors<'a> {
    let mut sorted: Vec<&'a Post> = posts.iter().collect();
    sorted.sort_by(|a, b| {
        a.published_at
            .cmp(&b.published_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    let Some(pos) = sorted.iter().position(|p| p.id == current_id) else {
        return Neighbors::default();
    };

    Neighbors {
        prev: pos.checked_sub(1).map(|i| sorted[i]),
        next: sorted.get(pos + 1).copied(),
    }
}

/// The homepage post: the newest one published on `today`, falling back
/// to yesterday.
pub fn todays_post<'a>(posts: &'a [Post], today: NaiveDate, zone: &SiteZone) -> Option<&'a Post> {
    let newest_on = |day: NaiveDate| {
        posts
            .iter()
            .filter(|p| zone.local_date(&p.published_at) == day)
            .max_by(|a, b| a.published_at.cmp(&b.published_at))
    };

    newest_on(today).or_else(|| today.pred_opt().and_then(newest_on))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn post(id: &str, published_at: DateTime<Utc>) -> Post {
        Post {
            id: id.to_string(),
            title: id.to_uppercase(),
            content: String::new(),
            images: Vec::new(),
            published_at,
        }
    }

    fn utc(m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, m, d, h, 0, 0).unwrap()
    }

    fn utc_zone() -> SiteZone {
        "+00:00".parse().unwrap()
    }

    #[test]
    fn test_group_by_month() {
        let posts = vec![
            post("jan-3", utc(1, 3, 12)),
            post("feb-10", utc(2, 10, 12)),
            post("jan-20", utc(1, 20, 12)),
            post("feb-2", utc(2, 2, 12)),
        ];
        let groups = group_by_month(&posts, &utc_zone());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "February 2024");
        assert_eq!(groups[1].label, "January 2024");
        let ids = |g: &MonthGroup| g.posts.iter().map(|p| p.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&groups[0]), ["feb-10", "feb-2"]);
        assert_eq!(ids(&groups[1]), ["jan-20", "jan-3"]);
    }

    #[test]
    fn test_group_uses_site_zone() {
        // 02:00 UTC on Feb 1 is still Jan 31 at -05:00
        let posts = vec![post("late", utc(2, 1, 2))];
        let groups = group_by_month(&posts, &SiteZone::default());
        assert_eq!((groups[0].year, groups[0].month), (2024, 1));
    }

    #[test]
    fn test_group_empty() {
        assert!(group_by_month(&[], &utc_zone()).is_empty());
    }

    #[test]
    fn test_neighbors() {
        let posts = vec![
            post("c", utc(3, 1, 0)),
            post("a", utc(1, 1, 0)),
            post("b", utc(2, 1, 0)),
        ];

        let first = neighbors(&posts, "a");
        assert!(first.prev.is_none());
        assert_eq!(first.next.unwrap().id, "b");

        let middle = neighbors(&posts, "b");
        assert_eq!(middle.prev.unwrap().id, "a");
        assert_eq!(middle.next.unwrap().id, "c");

        let last = neighbors(&posts, "c");
        assert_eq!(last.prev.unwrap().id, "b");
        assert!(last.next.is_none());

        let unknown = neighbors(&posts, "zzz");
        assert!(unknown.prev.is_none() && unknown.next.is_none());
    }

    #[test]
    fn test_neighbors_same_instant_is_stable() {
        let t = utc(1, 1, 0);
        let posts = vec![post("y", t), post("x", t)];
        assert_eq!(neighbors(&posts, "x").next.unwrap().id, "y");
        assert_eq!(neighbors(&posts, "y").prev.unwrap().id, "x");
    }

    #[test]
    fn test_todays_post_falls_back_to_yesterday() {
        let zone = utc_zone();
        let posts = vec![
            post("yesterday", utc(4, 9, 8)),
            post("today-early", utc(4, 10, 6)),
            post("today-late", utc(4, 10, 20)),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
        assert_eq!(todays_post(&posts, today, &zone).unwrap().id, "today-late");

        let tomorrow = NaiveDate::from_ymd_opt(2024, 4, 11).unwrap();
        assert_eq!(todays_post(&posts, tomorrow, &zone).unwrap().id, "today-late");

        let later = NaiveDate::from_ymd_opt(2024, 4, 12).unwrap();
        assert!(todays_post(&posts, later, &zone).is_none());
    }
}
