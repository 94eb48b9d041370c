//! Generate static files

use anyhow::Result;

use crate::generator::Generator;
use crate::Site;

/// Generate the static site from the configured repository
pub async fn run(site: &Site) -> Result<()> {
    let start = std::time::Instant::now();

    let client = site.client()?;
    let generator = Generator::new(site)?;
    let stats = generator.generate(&client).await?;

    if stats.skipped_posts > 0 {
        tracing::warn!("Skipped {} malformed posts", stats.skipped_posts);
    }

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}
