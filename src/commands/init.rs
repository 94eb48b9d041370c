//! Initialize a new site

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const CONFIG_TEMPLATE: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
description: ''
language: pt-BR
timezone: UTC

# URL
url: http://localhost:4000
root: /

# Directory
public_dir: public
pagination_dir: page
post_dir: post

# Date format (date-fns tokens)
date_format: dd LLL yyyy

load_more_label: Carregar mais posts

# Content service
cms:
  endpoint: https://your-repository.cdn.prismic.io/api/v2
  # Or set PRISMIC_ACCESS_TOKEN
  access_token:
  document_type: posts
  page_size: 1
  prerender_count: 5
  max_pages: 20
  timeout_secs: 30
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("{:?} already exists", config_path);
    }

    fs::write(&config_path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {:?}", config_path))?;

    Ok(())
}
