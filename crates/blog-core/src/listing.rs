//! Post listing queries and pagination.
//!
//! A listing is fully described by a [`ListingQuery`]. Storage adapters turn
//! [`ListingQuery::filter`] into their own query language; none of them
//! re-derive the eligibility rules.

use std::cmp::Reverse;
use std::num::IntErrorKind;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::PostRecord;
use crate::policy::Viewer;

/// Posts per page for every listing.
pub const PAGE_SIZE: u64 = 10;

/// Which subset of posts a listing draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingScope {
    Feed,
    /// Posts filed under a category. The category itself must already have
    /// been checked as published by the caller.
    Category(Uuid),
    /// Posts written by a user.
    Profile(Uuid),
}

/// Requested page, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Number(u64),
    Last,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::Number(1)
    }
}

impl PageRequest {
    /// Parse a `?page=` value. Anything unusable falls back to the first page;
    /// a number too large to represent is past every last page.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("last") => PageRequest::Last,
            Some(value) => match value.parse::<u64>() {
                Ok(n) if n > 0 => PageRequest::Number(n),
                Err(e) if *e.kind() == IntErrorKind::PosOverflow => PageRequest::Last,
                _ => PageRequest::default(),
            },
            None => PageRequest::default(),
        }
    }

    /// Clamp to an existing page number in `1..=total_pages`.
    pub fn resolve(&self, total_pages: u64) -> u64 {
        let last = total_pages.max(1);
        match self {
            PageRequest::Last => last,
            PageRequest::Number(n) => (*n).clamp(1, last),
        }
    }
}

/// Eligibility rules derived from a listing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingFilter {
    pub author_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    /// Restrict to effectively public posts.
    pub public_only: bool,
}

impl ListingFilter {
    pub fn matches(&self, record: &PostRecord, now: DateTime<Utc>) -> bool {
        if self.author_id.is_some_and(|id| record.post.author_id != id) {
            return false;
        }
        if self
            .category_id
            .is_some_and(|id| record.post.category_id != Some(id))
        {
            return false;
        }
        !self.public_only || record.is_public(now)
    }
}

/// A complete, named description of one listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingQuery {
    pub scope: ListingScope,
    pub viewer: Viewer,
    pub page: PageRequest,
    pub page_size: u64,
}

impl ListingQuery {
    pub fn new(scope: ListingScope, viewer: Viewer, page: PageRequest) -> Self {
        Self {
            scope,
            viewer,
            page,
            page_size: PAGE_SIZE,
        }
    }

    pub fn feed(viewer: Viewer, page: PageRequest) -> Self {
        Self::new(ListingScope::Feed, viewer, page)
    }

    pub fn category(category_id: Uuid, viewer: Viewer, page: PageRequest) -> Self {
        Self::new(ListingScope::Category(category_id), viewer, page)
    }

    pub fn profile(owner_id: Uuid, viewer: Viewer, page: PageRequest) -> Self {
        Self::new(ListingScope::Profile(owner_id), viewer, page)
    }

    /// Feed and category listings are always the public view. A profile is
    /// unfiltered only when its owner is looking at it.
    pub fn filter(&self) -> ListingFilter {
        match self.scope {
            ListingScope::Feed => ListingFilter {
                author_id: None,
                category_id: None,
                public_only: true,
            },
            ListingScope::Category(category_id) => ListingFilter {
                author_id: None,
                category_id: Some(category_id),
                public_only: true,
            },
            ListingScope::Profile(owner_id) => ListingFilter {
                author_id: Some(owner_id),
                category_id: None,
                public_only: !self.viewer.is(owner_id),
            },
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually served.
    pub number: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, number: u64, page_size: u64, total_items: u64) -> Self {
        Self {
            items,
            number,
            page_size,
            total_items,
            total_pages: total_pages(total_items, page_size),
        }
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Number of pages for `total_items`; an empty listing still has one page.
pub fn total_pages(total_items: u64, page_size: u64) -> u64 {
    total_items.div_ceil(page_size.max(1)).max(1)
}

/// Listing order: newest `pub_date` first, newest creation breaking ties.
pub fn sort_for_listing(records: &mut [PostRecord]) {
    records.sort_by_key(|r| Reverse((r.post.pub_date, r.post.created_at)));
}

/// Evaluate `query` over an in-memory set of candidate posts.
pub fn run_listing<I>(candidates: I, query: &ListingQuery, now: DateTime<Utc>) -> Page<PostRecord>
where
    I: IntoIterator<Item = PostRecord>,
{
    let filter = query.filter();
    let mut matching: Vec<PostRecord> = candidates
        .into_iter()
        .filter(|r| filter.matches(r, now))
        .collect();
    sort_for_listing(&mut matching);

    let total_items = matching.len() as u64;
    let number = query
        .page
        .resolve(total_pages(total_items, query.page_size));
    let skip = ((number - 1) * query.page_size) as usize;
    let items = matching
        .into_iter()
        .skip(skip)
        .take(query.page_size as usize)
        .collect();

    Page::new(items, number, query.page_size, total_items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, Post, PostDraft, UserSummary};
    use chrono::Duration;

    fn record_at(author: Uuid, pub_date: DateTime<Utc>) -> PostRecord {
        let post = Post::new(
            author,
            PostDraft {
                title: "t".to_string(),
                text: "b".to_string(),
                pub_date,
                image: None,
                location_id: None,
                category_id: None,
                is_published: true,
            },
        );
        PostRecord {
            author: UserSummary {
                id: author,
                username: "u".to_string(),
            },
            post,
            category: None,
            location: None,
            comment_count: 0,
        }
    }

    #[test]
    fn test_page_request_parse() {
        assert_eq!(PageRequest::parse(None), PageRequest::Number(1));
        assert_eq!(PageRequest::parse(Some("3")), PageRequest::Number(3));
        assert_eq!(PageRequest::parse(Some("0")), PageRequest::Number(1));
        assert_eq!(PageRequest::parse(Some("abc")), PageRequest::Number(1));
        assert_eq!(PageRequest::parse(Some("-2")), PageRequest::Number(1));
        assert_eq!(PageRequest::parse(Some("last")), PageRequest::Last);
    }

    #[test]
    fn test_oversized_page_number_lands_on_last_page() {
        let page = PageRequest::parse(Some("18446744073709551616"));

        assert_eq!(page, PageRequest::Last);
        assert_eq!(page.resolve(3), 3);
        assert_eq!(PageRequest::parse(Some("-18446744073709551616")), PageRequest::Number(1));
    }

    #[test]
    fn test_page_request_resolve_clamps() {
        assert_eq!(PageRequest::Number(4).resolve(3), 3);
        assert_eq!(PageRequest::Number(2).resolve(3), 2);
        assert_eq!(PageRequest::Last.resolve(3), 3);
        assert_eq!(PageRequest::Number(7).resolve(0), 1);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(25, 10), 3);
    }

    #[test]
    fn test_profile_filter_depends_on_viewer() {
        let owner = Uuid::new_v4();
        let own = ListingQuery::profile(owner, Viewer::User(owner), PageRequest::default());
        let other = ListingQuery::profile(owner, Viewer::Anonymous, PageRequest::default());

        assert!(!own.filter().public_only);
        assert!(other.filter().public_only);
        assert_eq!(own.filter().author_id, Some(owner));
    }

    #[test]
    fn test_feed_filter_ignores_authorship() {
        let author = Uuid::new_v4();
        let query = ListingQuery::feed(Viewer::User(author), PageRequest::default());
        let now = Utc::now();
        let hidden = record_at(author, now + Duration::hours(1));

        assert!(query.filter().public_only);
        assert!(!query.filter().matches(&hidden, now));
    }

    #[test]
    fn test_category_filter_requires_matching_category() {
        let now = Utc::now();
        let category = Category::new("c".into(), "d".into(), "c".into());
        let mut inside = record_at(Uuid::new_v4(), now - Duration::hours(1));
        inside.post.category_id = Some(category.id);
        inside.category = Some(category.clone());
        let outside = record_at(Uuid::new_v4(), now - Duration::hours(1));

        let filter = ListingQuery::category(category.id, Viewer::Anonymous, PageRequest::default())
            .filter();
        assert!(filter.matches(&inside, now));
        assert!(!filter.matches(&outside, now));
    }

    #[test]
    fn test_run_listing_paginates_twenty_five_posts() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let records: Vec<_> = (1..=25)
            .map(|i| record_at(author, now - Duration::minutes(i)))
            .collect();

        let sizes: Vec<usize> = [1, 2, 3]
            .into_iter()
            .map(|n| {
                let q = ListingQuery::feed(Viewer::Anonymous, PageRequest::Number(n));
                run_listing(records.clone(), &q, now).items.len()
            })
            .collect();
        assert_eq!(sizes, vec![10, 10, 5]);

        let q = ListingQuery::feed(Viewer::Anonymous, PageRequest::Number(4));
        let page = run_listing(records, &q, now);
        assert_eq!(page.number, 3);
        assert_eq!(page.items.len(), 5);
        assert!(!page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn test_run_listing_orders_newest_first() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let old = record_at(author, now - Duration::days(2));
        let new = record_at(author, now - Duration::hours(1));
        let q = ListingQuery::feed(Viewer::Anonymous, PageRequest::default());

        let page = run_listing(vec![old.clone(), new.clone()], &q, now);
        let ids: Vec<_> = page.items.iter().map(|r| r.post.id).collect();
        assert_eq!(ids, vec![new.post.id, old.post.id]);
    }

    #[test]
    fn test_run_listing_empty_has_single_page() {
        let q = ListingQuery::feed(Viewer::Anonymous, PageRequest::Number(5));
        let page = run_listing(Vec::new(), &q, Utc::now());
        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }
}
