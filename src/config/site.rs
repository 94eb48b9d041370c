//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Environment variable that overrides `cms.access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,
    pub pagination_dir: String,
    pub post_dir: String,

    // Date format (date-fns tokens)
    pub date_format: String,

    // Labels
    pub load_more_label: String,

    // Content service
    #[serde(default)]
    pub cms: CmsConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            language: "pt-BR".to_string(),
            timezone: "UTC".to_string(),

            url: "http://localhost:4000".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),
            pagination_dir: "page".to_string(),
            post_dir: "post".to_string(),

            date_format: "dd LLL yyyy".to_string(),

            load_more_label: "Carregar mais posts".to_string(),

            cms: CmsConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let mut config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        config.apply_env();
        Ok(config)
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.is_empty() {
                tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
                self.cms.access_token = Some(token);
            }
        }
    }

    /// Resolve the configured time zone, falling back to UTC
    pub fn tz(&self) -> chrono_tz::Tz {
        if self.timezone.is_empty() {
            return chrono_tz::UTC;
        }
        self.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown timezone {:?}, using UTC", self.timezone);
            chrono_tz::UTC
        })
    }
}

/// Headless CMS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    /// API endpoint, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Custom type of the blog posts
    pub document_type: String,
    /// Posts per listing page
    pub page_size: usize,
    /// Detail pages rendered ahead of time
    pub prerender_count: usize,
    /// Upper bound on listing pages walked during generation
    pub max_pages: usize,
    /// Preview or release ref used instead of the master ref
    pub ref_override: Option<String>,
    pub timeout_secs: u64,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: 1,
            prerender_count: 5,
            max_pages: 20,
            ref_override: None,
            timeout_secs: 30,
        }
    }
}
