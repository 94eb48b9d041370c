//! spacetraveling: a static blog generator backed by a headless CMS
//!
//! Posts are read from a Prismic repository, shaped into listing and detail
//! view models, and rendered with embedded Tera templates. The listing grows
//! one fetched page at a time through [`content::PostFeed`].

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod prismic;
pub mod server;
pub mod templates;

use anyhow::{Context, Result};
use std::path::Path;

/// The main site application
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Public (output) directory
    pub public_dir: std::path::PathBuf,
}

impl Site {
    /// Create a new site from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            let mut config = config::SiteConfig::default();
            config.apply_env();
            config
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a site from an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        Self {
            config,
            base_dir,
            public_dir,
        }
    }

    /// Build a content-service client from the configuration
    pub fn client(&self) -> Result<prismic::PrismicClient> {
        if self.config.cms.endpoint.is_empty() {
            anyhow::bail!("cms.endpoint is not set in _config.yml");
        }
        let config = prismic::ClientConfig::from_cms(&self.config.cms);
        prismic::PrismicClient::new(config).context("Failed to create the content client")
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
