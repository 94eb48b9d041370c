//! Content loader - loads listing and post data from the content service

use super::post::{PostDetail, PostsPagination};
use super::raw::{summarize_page, DateStyle};
use crate::config::SiteConfig;
use crate::error::ContentError;
use crate::prismic::{ContentService, Query, NEWEST_FIRST};

/// Fields the listing needs from each post
const LISTING_FIELDS: &[&str] = &["title", "subtitle", "author"];

/// Loads page data for the listing and the post pages
pub struct ContentLoader<'a, S: ContentService + ?Sized> {
    service: &'a S,
    document_type: String,
    page_size: usize,
    dates: DateStyle,
}

impl<'a, S: ContentService + ?Sized> ContentLoader<'a, S> {
    /// Create a new content loader
    pub fn new(service: &'a S, config: &SiteConfig) -> Self {
        Self {
            service,
            document_type: config.cms.document_type.clone(),
            page_size: config.cms.page_size,
            dates: DateStyle::from_config(config),
        }
    }

    pub fn dates(&self) -> &DateStyle {
        &self.dates
    }

    /// First listing page, newest first
    pub async fn load_listing(&self) -> Result<PostsPagination, ContentError> {
        let query = Query::by_type(&self.document_type)
            .page_size(self.page_size)
            .ordering(NEWEST_FIRST)
            .fetch(LISTING_FIELDS);

        let page = self.service.query(&query).await?;
        let listing = summarize_page(&page, &self.dates);
        tracing::info!(
            "Loaded {} of {} posts",
            listing.results.len(),
            page.total_results_size
        );
        Ok(listing)
    }

    /// The listing page a `next_page` cursor points at
    pub async fn load_page(&self, cursor: &str) -> Result<PostsPagination, ContentError> {
        let page = self.service.fetch_page(cursor).await?;
        Ok(summarize_page(&page, &self.dates))
    }

    /// A single post by its slug
    pub async fn load_post(&self, slug: &str) -> Result<PostDetail, ContentError> {
        let raw = self.service.get_by_uid(&self.document_type, slug).await?;
        raw.to_detail(&self.dates)
    }

    /// Slugs of the newest `count` posts, rendered ahead of time
    pub async fn load_prerender_slugs(&self, count: usize) -> Result<Vec<String>, ContentError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let query = Query::by_type(&self.document_type)
            .page_size(count)
            .ordering(NEWEST_FIRST);
        let page = self.service.query(&query).await?;

        Ok(page
            .results
            .into_iter()
            .filter_map(|post| post.uid)
            .filter(|uid| !uid.is_empty())
            .take(count)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::raw::tests::raw_post;
    use crate::content::raw::RawPage;
    use crate::prismic::testing::FakeService;
    use serde_json::json;

    fn service() -> FakeService {
        let listing: RawPage = serde_json::from_value(json!({
            "total_results_size": 3,
            "results": [
                raw_post("newest", Some("2021-03-27T10:00:00+0000"), "Newest"),
                raw_post("middle", Some("2021-03-26T10:00:00+0000"), "Middle"),
                {"id": "no-uid", "data": {}}
            ],
            "next_page": "https://blog.cdn.prismic.io/api/v2/documents/search?page=2"
        }))
        .unwrap();

        FakeService::default()
            .with_listing(listing)
            .with_document(
                serde_json::from_value(raw_post(
                    "middle",
                    Some("2021-03-26T10:00:00+0000"),
                    "Middle",
                ))
                .unwrap(),
            )
    }

    #[tokio::test]
    async fn test_load_listing_uses_page_size() {
        let service = service();
        let config = SiteConfig::default();
        let loader = ContentLoader::new(&service, &config);

        let listing = loader.load_listing().await.unwrap();
        assert_eq!(listing.results.len(), 1);
        assert_eq!(listing.results[0].uid(), "newest");
        assert_eq!(listing.results[0].first_publication_date(), Some("27 Mar 2021"));
        assert!(listing.next_page.is_some());
        assert_eq!(service.requests(), vec![r#"[[at(document.type,"posts")]]"#]);
    }

    #[tokio::test]
    async fn test_load_page_follows_cursor() {
        let cursor = "https://blog.cdn.prismic.io/api/v2/documents/search?page=2";
        let page: RawPage = serde_json::from_value(json!({
            "results": [raw_post("older", None, "Older")],
            "next_page": null
        }))
        .unwrap();
        let service = service().with_page(cursor, page);
        let config = SiteConfig::default();
        let loader = ContentLoader::new(&service, &config);

        let listing = loader.load_page(cursor).await.unwrap();
        assert_eq!(listing.results[0].uid(), "older");
        assert_eq!(listing.results[0].first_publication_date(), None);
        assert!(listing.next_page.is_none());
    }

    #[tokio::test]
    async fn test_load_post() {
        let service = service();
        let config = SiteConfig::default();
        let loader = ContentLoader::new(&service, &config);

        let post = loader.load_post("middle").await.unwrap();
        assert_eq!(post.data.title, "Middle");
        assert_eq!(post.first_publication_date.as_deref(), Some("26 Mar 2021"));

        let err = loader.load_post("unknown").await.unwrap_err();
        assert!(matches!(err, ContentError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_prerender_slugs_skip_documents_without_uid() {
        let service = service();
        let config = SiteConfig::default();
        let loader = ContentLoader::new(&service, &config);

        assert_eq!(
            loader.load_prerender_slugs(5).await.unwrap(),
            vec!["newest", "middle"]
        );
        assert!(loader.load_prerender_slugs(0).await.unwrap().is_empty());
    }
}
