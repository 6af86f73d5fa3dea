//! prismic-press: a static blog generator backed by a Prismic repository
//!
//! Posts are read from Prismic, rendered with built-in Tera templates into a
//! listing page and one page per post, and served by a small preview server
//! that also renders posts published after the last generation.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod detail;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod listing;
pub mod prismic;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use prismic::{ContentClient, PrismicClient};

/// The main application
#[derive(Debug, Clone)]
pub struct Press {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Generation cache directory
    pub cache_dir: PathBuf,
}

impl Press {
    /// Create a new instance from a directory, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Create an instance from an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        let cache_dir = base_dir.join(&config.cache_dir);

        Self {
            config,
            base_dir,
            public_dir,
            cache_dir,
        }
    }

    /// Client for the configured Prismic repository
    pub fn client(&self) -> Result<Arc<dyn ContentClient>> {
        if self.config.prismic.endpoint.trim().is_empty() {
            anyhow::bail!(
                "No Prismic endpoint configured. Set prismic.endpoint in _config.yml or {}",
                config::ENDPOINT_ENV
            );
        }
        Ok(Arc::new(PrismicClient::new(&self.config.prismic)?))
    }

    /// Interface strings for the site language, including `languages/` overrides
    pub fn i18n(&self) -> Result<i18n::I18n> {
        let mut i18n = i18n::I18n::new(&self.config.language);
        i18n.load_languages(self.base_dir.join("languages"))?;
        Ok(i18n)
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory and cache
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
