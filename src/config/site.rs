//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding `prismic.endpoint`
pub const ENDPOINT_ENV: &str = "PRISMIC_ENDPOINT";
/// Environment variable overriding `prismic.access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    pub timezone: String,

    // Date format, written with date-fns tokens (dd MMM yyyy)
    pub date_format: String,

    // Directory
    pub public_dir: String,
    pub cache_dir: String,

    // Static generation
    /// Seconds before a generated post page is considered stale
    pub revalidate: u64,
    /// Render posts that were not enumerated at generation time on first request
    pub fallback: bool,

    // Content repository
    #[serde(default)]
    pub prismic: PrismicConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            language: "pt-BR".to_string(),
            timezone: "UTC".to_string(),

            date_format: "dd MMM yyyy".to_string(),

            public_dir: "public".to_string(),
            cache_dir: ".prismic-press".to_string(),

            revalidate: 60 * 60 * 24,
            fallback: true,

            prismic: PrismicConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `PRISMIC_ENDPOINT` / `PRISMIC_ACCESS_TOKEN` overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(ACCESS_TOKEN_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, access_token: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            tracing::debug!("Using Prismic endpoint from {}", ENDPOINT_ENV);
            self.prismic.endpoint = endpoint;
        }
        if let Some(token) = access_token.filter(|t| !t.trim().is_empty()) {
            self.prismic.access_token = Some(token);
        }
    }
}

/// Prismic repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismicConfig {
    /// API v2 endpoint, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Custom type holding the posts
    pub document_type: String,
    /// Posts per listing page
    pub page_size: usize,
    /// Seconds before a request to the repository is abandoned
    pub timeout_secs: u64,
}

impl Default for PrismicConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: 2,
            timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.revalidate, 86_400);
        assert!(config.fallback);
        assert_eq!(config.prismic.document_type, "posts");
        assert_eq!(config.prismic.page_size, 2);
        assert_eq!(config.prismic.timeout_secs, 30);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
language: en
prismic:
  endpoint: https://blog.cdn.prismic.io/api/v2
  page_size: 5
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.language, "en");
        assert_eq!(config.prismic.endpoint, "https://blog.cdn.prismic.io/api/v2");
        assert_eq!(config.prismic.page_size, 5);
        assert_eq!(config.prismic.document_type, "posts");
        assert_eq!(config.public_dir, "public");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = SiteConfig::default();
        config.prismic.endpoint = "https://a.cdn.prismic.io/api/v2".to_string();

        config.apply_overrides(Some("  ".to_string()), Some("secret".to_string()));
        assert_eq!(config.prismic.endpoint, "https://a.cdn.prismic.io/api/v2");
        assert_eq!(config.prismic.access_token.as_deref(), Some("secret"));

        config.apply_overrides(Some("https://b.cdn.prismic.io/api/v2".to_string()), None);
        assert_eq!(config.prismic.endpoint, "https://b.cdn.prismic.io/api/v2");
    }
}
