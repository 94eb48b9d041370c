//! Post view models

use serde::{Deserialize, Serialize};

use super::richtext::RichTextBlock;

/// A post as shown in the listing
///
/// Only built by the transform step in `content::raw`; the fields are
/// read-only from outside the crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    uid: String,
    first_publication_date: Option<String>,
    data: PostSummaryData,
}

/// Fields extracted from the post's first slice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummaryData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl PostSummary {
    pub(crate) fn new(
        uid: String,
        first_publication_date: Option<String>,
        data: PostSummaryData,
    ) -> Self {
        Self {
            uid,
            first_publication_date,
            data,
        }
    }

    /// Stable identifier assigned by the content service
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Formatted publication date, if the post has been published
    pub fn first_publication_date(&self) -> Option<&str> {
        self.first_publication_date.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.data.title
    }

    pub fn subtitle(&self) -> &str {
        &self.data.subtitle
    }

    pub fn author(&self) -> &str {
        &self.data.author
    }
}

/// One page of summaries plus the cursor to the next one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostsPagination {
    pub results: Vec<PostSummary>,
    pub next_page: Option<String>,
}

/// A post as shown on its own page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<String>,
    pub data: PostDetailData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetailData {
    pub title: String,
    pub banner: Banner,
    pub author: String,
    pub content: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub url: String,
}

/// A heading followed by its rich-text body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub body: Vec<RichTextBlock>,
}

impl PostDetail {
    /// Estimated reading time in minutes
    pub fn reading_time(&self) -> u32 {
        super::reading_time::estimate_minutes(&self.data.content)
    }
}
