//! Built-in site templates using the Tera template engine
//!
//! Templates and the stylesheet are embedded in the binary. CMS text is
//! escaped while building the view data, so autoescaping is off and paths
//! are emitted as is.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::richtext::as_html;
use crate::content::{LinkResolver, PostDetail, PostSummary};
use crate::helpers::{full_url_for, html_escape, listing_path, post_path, url_for};

/// Stylesheet written to `css/style.css`
pub const STYLESHEET: &str = include_str!("site/style.css");

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("post.html", include_str!("site/post.html")),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Render an accumulated listing page
    ///
    /// `next_page` is the number of the page holding the next state; it is
    /// `None` when no further posts exist and the load-more control is left
    /// out.
    pub fn render_listing(
        &self,
        config: &SiteConfig,
        posts: &[PostSummary],
        page: usize,
        next_page: Option<usize>,
    ) -> Result<String> {
        let listing = ListingData {
            posts: posts.iter().map(|p| SummaryView::new(p, config)).collect(),
            page,
            next_link: next_page.map(|n| url_for(config, &listing_path(config, n))),
            load_more_label: html_escape(&config.load_more_label),
        };

        let mut context = base_context(config);
        context.insert(
            "canonical",
            &html_escape(&full_url_for(config, &listing_path(config, page))),
        );
        context.insert("listing", &listing);
        self.render("index.html", &context)
    }

    /// Render a post detail page
    pub fn render_post(&self, config: &SiteConfig, post: &PostDetail) -> Result<String> {
        let links = LinkResolver::from_config(config);
        let view = PostView::new(post, &links);

        let mut context = base_context(config);
        context.insert(
            "canonical",
            &html_escape(&full_url_for(config, &post_path(config, &post.uid))),
        );
        context.insert("post", &view);
        self.render("post.html", &context)
    }
}

fn base_context(config: &SiteConfig) -> Context {
    let mut context = Context::new();
    context.insert("config", &ConfigData::new(config));
    context.insert("version", env!("CARGO_PKG_VERSION"));
    context
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub description: String,
    pub language: String,
    pub root: String,
    pub css_url: String,
}

impl ConfigData {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            title: html_escape(&config.title),
            description: html_escape(&config.description),
            language: html_escape(&config.language),
            root: url_for(config, ""),
            css_url: url_for(config, "css/style.css"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryView {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: Option<String>,
    pub path: String,
}

impl SummaryView {
    pub fn new(post: &PostSummary, config: &SiteConfig) -> Self {
        Self {
            uid: html_escape(post.uid()),
            title: html_escape(post.title()),
            subtitle: html_escape(post.subtitle()),
            author: html_escape(post.author()),
            date: post.first_publication_date().map(html_escape),
            path: html_escape(&url_for(config, &post_path(config, post.uid()))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingData {
    pub posts: Vec<SummaryView>,
    pub page: usize,
    pub next_link: Option<String>,
    pub load_more_label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub title: String,
    pub date: Option<String>,
    pub author: String,
    pub banner_url: String,
    pub reading_time: u32,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub heading: String,
    /// Rendered rich text
    pub html: String,
}

impl PostView {
    pub fn new(post: &PostDetail, links: &LinkResolver) -> Self {
        Self {
            title: html_escape(&post.data.title),
            date: post.first_publication_date.as_deref().map(html_escape),
            author: html_escape(&post.data.author),
            banner_url: html_escape(&post.data.banner.url),
            reading_time: post.reading_time(),
            sections: post
                .data
                .content
                .iter()
                .map(|s| SectionView {
                    heading: html_escape(&s.heading),
                    html: as_html(&s.body, links),
                })
                .collect(),
        }
    }
}
