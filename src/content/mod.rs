//! Content module - raw CMS records, view models and the listing feed

pub mod feed;
pub mod loader;
mod post;
pub mod raw;
pub mod reading_time;
pub mod richtext;

pub use feed::{FeedStatus, PostFeed};
pub use loader::ContentLoader;
pub use post::{
    Banner, PostDetail, PostDetailData, PostSummary, PostSummaryData, PostsPagination, Section,
};
pub use raw::DateStyle;
pub use richtext::{LinkResolver, RichTextBlock};
