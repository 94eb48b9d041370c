//! Generator module - writes the static site using the built-in templates

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::content::{ContentLoader, PostFeed, PostsPagination};
use crate::error::ContentError;
use crate::helpers::{is_safe_slug, listing_path};
use crate::prismic::ContentService;
use crate::templates::{TemplateRenderer, STYLESHEET};
use crate::Site;

/// What a generation run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub listing_pages: usize,
    pub posts_listed: usize,
    pub post_pages: usize,
    pub skipped_posts: usize,
}

/// Static site generator
pub struct Generator {
    site: Site,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site) -> Result<Self> {
        Ok(Self {
            site: site.clone(),
            renderer: TemplateRenderer::new()?,
        })
    }

    /// Generate the entire site
    pub async fn generate<S>(&self, service: &S) -> Result<GenerateStats>
    where
        S: ContentService + ?Sized,
    {
        let config = &self.site.config;
        fs::create_dir_all(&self.site.public_dir)?;
        self.write_file(Path::new("css/style.css"), STYLESHEET)?;

        let loader = ContentLoader::new(service, config);
        let listing = loader
            .load_listing()
            .await
            .context("Failed to load the post listing")?;

        let mut stats = GenerateStats::default();
        self.generate_listing_pages(&loader, service, listing, &mut stats)
            .await?;

        let slugs = loader
            .load_prerender_slugs(config.cms.prerender_count)
            .await
            .context("Failed to enumerate posts to pre-render")?;

        for slug in &slugs {
            match self.generate_post_page(&loader, slug).await {
                Ok(_) => stats.post_pages += 1,
                Err(e) if is_per_record(&e) => {
                    tracing::warn!("Skipping post {:?}: {:#}", slug, e);
                    stats.skipped_posts += 1;
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            "Generated {} listing pages ({} posts) and {} post pages",
            stats.listing_pages,
            stats.posts_listed,
            stats.post_pages
        );
        Ok(stats)
    }

    /// Write one listing page per accumulated state
    ///
    /// Page 1 is the first fetched page; page n holds everything loaded after
    /// n - 1 "load more" steps and links to page n + 1 while the feed has a
    /// cursor. Walking stops at `cms.max_pages`.
    async fn generate_listing_pages<S>(
        &self,
        loader: &ContentLoader<'_, S>,
        service: &S,
        listing: PostsPagination,
        stats: &mut GenerateStats,
    ) -> Result<()>
    where
        S: ContentService + ?Sized,
    {
        let config = &self.site.config;
        let max_pages = config.cms.max_pages.max(1);
        let mut feed = PostFeed::initialize(listing, loader.dates().clone());

        loop {
            let page = feed.pages_loaded();
            let has_next = feed.can_load_more() && page < max_pages;

            let html = self.renderer.render_listing(
                config,
                feed.items(),
                page,
                has_next.then_some(page + 1),
            )?;
            let path = PathBuf::from(listing_path(config, page)).join("index.html");
            self.write_file(&path, &html)?;
            stats.listing_pages += 1;
            stats.posts_listed = feed.items().len();

            if !has_next {
                if feed.can_load_more() {
                    tracing::info!("Stopped listing at {} pages (cms.max_pages)", page);
                }
                break;
            }

            feed.load_more(service)
                .await
                .with_context(|| format!("Failed to load listing page {}", page + 1))?;
        }

        Ok(())
    }

    /// Fetch, render and write one post page, returning the written file
    pub async fn generate_post_page<S>(
        &self,
        loader: &ContentLoader<'_, S>,
        slug: &str,
    ) -> Result<PathBuf>
    where
        S: ContentService + ?Sized,
    {
        let html = self.render_post(loader, slug).await?;
        let path = self.site.public_dir.join(self.post_file(slug)?);
        replace_file(&path, &html).await?;
        tracing::debug!("Generated post: {:?}", path);
        Ok(path)
    }

    /// Fetch and render one post page without writing it
    pub async fn render_post<S>(&self, loader: &ContentLoader<'_, S>, slug: &str) -> Result<String>
    where
        S: ContentService + ?Sized,
    {
        let post = loader.load_post(slug).await?;
        self.renderer.render_post(&self.site.config, &post)
    }

    /// Output file of a post, relative to the public dir
    pub fn post_file(&self, slug: &str) -> Result<PathBuf> {
        if !is_safe_slug(slug) {
            anyhow::bail!("Refusing to write post with unsafe slug {:?}", slug);
        }
        Ok(PathBuf::from(self.site.config.post_dir.trim_matches('/'))
            .join(slug)
            .join("index.html"))
    }

    fn write_file(&self, relative: &Path, content: &str) -> Result<()> {
        let output_path = self.site.public_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create dir {:?}", parent))?;
        }
        fs::write(&output_path, content)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }
}

/// Write a file through a uniquely named sibling and rename it into place,
/// so concurrent readers see either the old or the new content
async fn replace_file(path: &Path, content: &str) -> Result<()> {
    static NEXT_TMP: AtomicUsize = AtomicUsize::new(0);

    let parent = path
        .parent()
        .with_context(|| format!("No parent directory for {:?}", path))?;
    tokio::fs::create_dir_all(parent)
        .await
        .with_context(|| format!("Failed to create dir {:?}", parent))?;

    let tmp = parent.join(format!(
        ".index.{}.{}.tmp",
        std::process::id(),
        NEXT_TMP.fetch_add(1, Ordering::Relaxed)
    ));
    tokio::fs::write(&tmp, content)
        .await
        .with_context(|| format!("Failed to write {:?}", tmp))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e).with_context(|| format!("Failed to write {:?}", path));
    }
    Ok(())
}

/// Whether an error only concerns one post, so generation can go on
fn is_per_record(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<ContentError>()
        .is_some_and(|e| e.is_per_record() || matches!(e, ContentError::NotFound { .. }))
}
