//! Generate static files

use anyhow::Result;
use std::sync::Arc;

use crate::cache::CacheDb;
use crate::generator::{GenerationReport, Generator};
use crate::prismic::ContentClient;
use crate::Press;

/// Generate the static site from the configured repository
pub async fn run(press: &Press) -> Result<()> {
    run_with_client(press, press.client()?, false).await?;
    Ok(())
}

/// Generate with an explicit client; `force` ignores the generation cache
pub async fn run_with_client(
    press: &Press,
    client: Arc<dyn ContentClient>,
    force: bool,
) -> Result<GenerationReport> {
    let start = std::time::Instant::now();

    let mut cache = if force {
        tracing::info!("Full generation (force=true)");
        CacheDb::new()
    } else {
        CacheDb::load(&press.cache_dir)
    };

    let generator = Generator::new(press, client)?;
    let report = generator.generate(&mut cache).await?;
    cache.save(&press.cache_dir)?;

    tracing::info!(
        "Listed {} posts, wrote {} pages, {} unchanged",
        report.listed,
        report.written,
        report.unchanged
    );
    for slug in &report.skipped {
        tracing::warn!("No page generated for {}", slug);
    }
    for slug in &report.removed {
        tracing::info!("Removed page of deleted post {}", slug);
    }

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(report)
}
