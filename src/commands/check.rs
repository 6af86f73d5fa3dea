//! Check that every enumerated post resolves

use anyhow::Result;
use std::sync::Arc;

use crate::detail;
use crate::prismic::ContentClient;
use crate::Press;

/// Fail when a listed UID has no retrievable document
pub async fn run(press: &Press) -> Result<()> {
    run_with_client(press, press.client()?).await
}

pub async fn run_with_client(press: &Press, client: Arc<dyn ContentClient>) -> Result<()> {
    let document_type = &press.config.prismic.document_type;
    let missing = detail::unresolvable_paths(client.as_ref(), document_type).await?;

    if !missing.is_empty() {
        for slug in &missing {
            tracing::error!("Post {} is listed but cannot be retrieved", slug);
        }
        anyhow::bail!("{} post(s) cannot be resolved", missing.len());
    }

    tracing::info!("All {} documents resolve", document_type);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::{PostSummary, SummaryData};
    use crate::prismic::MemoryClient;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_orphan_fails_check() {
        let dir = TempDir::new().unwrap();
        let press = Press::with_config(dir.path(), SiteConfig::default());

        let healthy = Arc::new(MemoryClient::new());
        run_with_client(&press, healthy).await.unwrap();

        let orphan = PostSummary {
            uid: Some("ghost".to_string()),
            first_publication_date: None,
            data: SummaryData::default(),
        };
        let broken = Arc::new(MemoryClient::new().with_orphan(orphan));
        let err = run_with_client(&press, broken).await.unwrap_err();
        assert!(err.to_string().contains("1 post(s)"));
    }
}
