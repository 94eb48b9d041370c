//! List site content

use anyhow::{Context, Result};

use crate::content::{ContentLoader, FeedStatus, PostFeed, PostSummary};
use crate::prismic::ContentService;
use crate::Site;

/// Print every post, walking the listing to its last page
pub async fn run(site: &Site) -> Result<()> {
    let client = site.client()?;
    let posts = collect_posts(site, &client).await?;

    println!("Posts ({}):", posts.len());
    for post in &posts {
        println!(
            "  {} - {} [{}] ({})",
            post.first_publication_date().unwrap_or("unpublished"),
            post.title(),
            post.author(),
            post.uid()
        );
    }

    Ok(())
}

async fn collect_posts<S>(site: &Site, service: &S) -> Result<Vec<PostSummary>>
where
    S: ContentService + ?Sized,
{
    let loader = ContentLoader::new(service, &site.config);
    let listing = loader.load_listing().await.context("Failed to load posts")?;
    let mut feed = PostFeed::initialize(listing, loader.dates().clone());

    let max_pages = site.config.cms.max_pages.max(1);
    while feed.can_load_more() && feed.pages_loaded() < max_pages {
        feed.load_more(service)
            .await
            .with_context(|| format!("Failed to load page {}", feed.pages_loaded() + 1))?;
    }

    if feed.status() == FeedStatus::Ready {
        tracing::warn!(
            "Stopped after {} pages (cms.max_pages); more posts exist",
            feed.pages_loaded()
        );
    }

    Ok(feed.items().to_vec())
}
