//! Incremental post listing
//!
//! `PostFeed` holds the summaries shown so far and the cursor to the next
//! page. Each `load_more` fetches exactly one page and appends it. Items are
//! never reordered, removed or deduplicated.

use serde::Serialize;

use super::post::{PostSummary, PostsPagination};
use super::raw::{summarize_page, DateStyle};
use crate::error::FeedError;
use crate::prismic::ContentService;

/// What the listing should offer the reader next
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FeedStatus {
    /// Another page can be loaded
    Ready,
    /// The content service reported no further pages
    Exhausted,
    /// The last attempt failed; items and cursor are unchanged and the
    /// same page can be requested again
    Failed { error: String },
}

/// Accumulated listing state for one page view
#[derive(Debug, Clone)]
pub struct PostFeed {
    items: Vec<PostSummary>,
    next_page: Option<String>,
    last_error: Option<String>,
    pages_loaded: usize,
    dates: DateStyle,
}

impl PostFeed {
    /// Start from the server-rendered first page
    pub fn initialize(first_page: PostsPagination, dates: DateStyle) -> Self {
        Self {
            items: first_page.results,
            next_page: first_page.next_page,
            last_error: None,
            pages_loaded: 1,
            dates,
        }
    }

    pub fn items(&self) -> &[PostSummary] {
        &self.items
    }

    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    /// Number of pages fetched so far, the first page included
    pub fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }

    /// Whether the "load more" control should be offered
    pub fn can_load_more(&self) -> bool {
        self.next_page.is_some()
    }

    pub fn status(&self) -> FeedStatus {
        match (&self.last_error, &self.next_page) {
            (Some(error), Some(_)) => FeedStatus::Failed {
                error: error.clone(),
            },
            (_, Some(_)) => FeedStatus::Ready,
            (_, None) => FeedStatus::Exhausted,
        }
    }

    /// Fetch the next page and append every post in it
    ///
    /// Returns how many summaries were appended. Taking `&mut self` keeps a
    /// second request from starting while one is outstanding. On failure the
    /// feed keeps its items and cursor so the caller can retry.
    pub async fn load_more<S>(&mut self, service: &S) -> Result<usize, FeedError>
    where
        S: ContentService + ?Sized,
    {
        let cursor = self.next_page.clone().ok_or(FeedError::Exhausted)?;
        tracing::debug!("Loading page {} from {}", self.pages_loaded + 1, cursor);

        let page = match service.fetch_page(&cursor).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Failed to load more posts: {}", e);
                self.last_error = Some(e.to_string());
                return Err(e.into());
            }
        };

        let PostsPagination { results, next_page } = summarize_page(&page, &self.dates);
        let appended = results.len();
        self.items.extend(results);
        self.next_page = next_page;
        self.last_error = None;
        self.pages_loaded += 1;

        Ok(appended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::raw::tests::raw_post;
    use crate::content::raw::RawPage;
    use crate::prismic::testing::FakeService;
    use serde_json::json;

    const PAGE_2: &str = "https://blog.cdn.prismic.io/api/v2/documents/search?page=2";
    const PAGE_3: &str = "https://blog.cdn.prismic.io/api/v2/documents/search?page=3";

    fn page(posts: Vec<serde_json::Value>, next: Option<&str>) -> RawPage {
        serde_json::from_value(json!({"results": posts, "next_page": next})).unwrap()
    }

    fn first_feed(next: Option<&str>) -> PostFeed {
        let first = page(
            vec![raw_post("one", Some("2021-03-25T19:25:28+0000"), "One")],
            next,
        );
        PostFeed::initialize(summarize_page(&first, &DateStyle::default()), DateStyle::default())
    }

    fn uids(feed: &PostFeed) -> Vec<&str> {
        feed.items().iter().map(|p| p.uid()).collect()
    }

    #[tokio::test]
    async fn test_load_more_appends_in_order() {
        let service = FakeService::default()
            .with_page(
                PAGE_2,
                page(vec![raw_post("two", None, "Two")], Some(PAGE_3)),
            )
            .with_page(
                PAGE_3,
                page(
                    vec![raw_post("three", None, "Three"), raw_post("four", None, "Four")],
                    None,
                ),
            );
        let mut feed = first_feed(Some(PAGE_2));
        assert_eq!(feed.status(), FeedStatus::Ready);

        assert_eq!(feed.load_more(&service).await.unwrap(), 1);
        assert_eq!(uids(&feed), vec!["one", "two"]);
        assert_eq!(feed.next_page(), Some(PAGE_3));

        // the whole page is appended, not only its first post
        assert_eq!(feed.load_more(&service).await.unwrap(), 2);
        assert_eq!(uids(&feed), vec!["one", "two", "three", "four"]);
        assert_eq!(feed.next_page(), None);
        assert!(!feed.can_load_more());
        assert_eq!(feed.status(), FeedStatus::Exhausted);
        assert_eq!(feed.pages_loaded(), 3);
        assert_eq!(service.requests(), vec![PAGE_2.to_string(), PAGE_3.to_string()]);
    }

    #[tokio::test]
    async fn test_exhausted_feed_does_not_fetch() {
        let service = FakeService::default();
        let mut feed = first_feed(None);

        assert!(matches!(
            feed.load_more(&service).await,
            Err(FeedError::Exhausted)
        ));
        assert!(service.requests().is_empty());
        assert_eq!(uids(&feed), vec!["one"]);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_state_and_can_retry() {
        let service = FakeService::default();
        let mut feed = first_feed(Some(PAGE_2));

        assert!(matches!(
            feed.load_more(&service).await,
            Err(FeedError::Content(_))
        ));
        assert_eq!(uids(&feed), vec!["one"]);
        assert_eq!(feed.next_page(), Some(PAGE_2));
        assert!(matches!(feed.status(), FeedStatus::Failed { .. }));
        assert!(feed.can_load_more());

        let service = service.with_page(PAGE_2, page(vec![raw_post("two", None, "Two")], None));
        assert_eq!(feed.load_more(&service).await.unwrap(), 1);
        assert_eq!(uids(&feed), vec!["one", "two"]);
        assert_eq!(feed.status(), FeedStatus::Exhausted);
    }

    #[tokio::test]
    async fn test_duplicates_are_kept() {
        let service = FakeService::default().with_page(
            PAGE_2,
            page(vec![raw_post("one", None, "One again")], None),
        );
        let mut feed = first_feed(Some(PAGE_2));

        feed.load_more(&service).await.unwrap();
        assert_eq!(uids(&feed), vec!["one", "one"]);
    }

    #[tokio::test]
    async fn test_malformed_records_in_later_pages_are_skipped() {
        let service = FakeService::default().with_page(
            PAGE_2,
            page(
                vec![json!({"uid": "broken", "data": {}}), raw_post("two", None, "Two")],
                None,
            ),
        );
        let mut feed = first_feed(Some(PAGE_2));

        assert_eq!(feed.load_more(&service).await.unwrap(), 1);
        assert_eq!(uids(&feed), vec!["one", "two"]);
    }
}
