//! Content service access
//!
//! `ContentService` is the seam between the site and the headless CMS.
//! `PrismicClient` talks to the Prismic REST API; tests use an in-memory
//! implementation.

mod client;
mod query;

pub use client::{ClientConfig, PrismicClient};
pub use query::{Query, NEWEST_FIRST};

use async_trait::async_trait;

use crate::content::raw::{RawPage, RawPost};
use crate::error::ContentError;

/// Read access to the documents of a CMS repository
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Run a search and return its first requested page
    async fn query(&self, query: &Query) -> Result<RawPage, ContentError>;

    /// Follow a `next_page` cursor
    async fn fetch_page(&self, cursor: &str) -> Result<RawPage, ContentError>;

    /// Fetch the single document of a type with the given UID
    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<RawPost, ContentError> {
        let page = self
            .query(&Query::by_uid(document_type, uid).page_size(1))
            .await?;
        page.results
            .into_iter()
            .next()
            .ok_or_else(|| ContentError::NotFound {
                uid: uid.to_string(),
            })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory content service
    ///
    /// `query` answers with the configured listing (or a UID lookup over
    /// `documents`); cursors resolve through `pages`, unknown ones fail
    /// with HTTP 500.
    #[derive(Default)]
    pub(crate) struct FakeService {
        listing: RawPage,
        documents: Vec<RawPost>,
        pages: HashMap<String, RawPage>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeService {
        pub(crate) fn with_listing(mut self, page: RawPage) -> Self {
            self.listing = page;
            self
        }

        pub(crate) fn with_document(mut self, post: RawPost) -> Self {
            self.documents.push(post);
            self
        }

        pub(crate) fn with_page(mut self, cursor: &str, page: RawPage) -> Self {
            self.pages.insert(cursor.to_string(), page);
            self
        }

        /// Cursors and queries seen so far, in order
        pub(crate) fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        fn record(&self, request: String) {
            self.requests.lock().unwrap().push(request);
        }
    }

    #[async_trait]
    impl ContentService for FakeService {
        async fn query(&self, query: &Query) -> Result<RawPage, ContentError> {
            self.record(query.q());

            if let Some(uid) = query.uid() {
                let results = self
                    .documents
                    .iter()
                    .filter(|d| d.uid.as_deref() == Some(uid))
                    .cloned()
                    .collect();
                return Ok(RawPage {
                    results,
                    ..RawPage::default()
                });
            }

            let mut page = self.listing.clone();
            page.results.truncate(query.size());
            Ok(page)
        }

        async fn fetch_page(&self, cursor: &str) -> Result<RawPage, ContentError> {
            self.record(cursor.to_string());
            self.pages
                .get(cursor)
                .cloned()
                .ok_or_else(|| ContentError::Status {
                    status: 500,
                    url: cursor.to_string(),
                })
        }
    }
}
