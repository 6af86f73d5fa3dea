//! Generator module - renders the listing and post pages into the public directory

use anyhow::{Context as _, Result};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tera::Context;

use crate::cache::{self, CacheDb};
use crate::content::PostSummary;
use crate::detail::{self, DetailState, PostView};
use crate::helpers::{is_safe_slug, POST_ROUTE};
use crate::i18n::I18n;
use crate::listing::{self, ListingState};
use crate::prismic::ContentClient;
use crate::templates::{SiteData, SummaryData, TemplateRenderer, LOAD_MORE_SCRIPT};
use crate::Press;

/// What happened to a single post page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    /// The page was rendered and written
    Written,
    /// The rendered page matched the cached hash; only its timestamp was refreshed
    Unchanged,
    /// The post no longer exists; any previous page was removed
    NotFound,
    /// The slug cannot be used as a path
    Rejected,
}

/// A post page rendered but not yet written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedPost {
    Page { html: String, hash: String },
    NotFound,
    Rejected,
}

/// Summary of a full generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Posts on the first listing page
    pub listed: usize,
    pub written: usize,
    pub unchanged: usize,
    /// Enumerated slugs that produced no page
    pub skipped: Vec<String>,
    /// Previously generated posts that are no longer in the repository
    pub removed: Vec<String>,
}

/// Static site generator
pub struct Generator {
    press: Press,
    renderer: TemplateRenderer,
    i18n: I18n,
    client: Arc<dyn ContentClient>,
}

impl Generator {
    /// Create a new generator
    pub fn new(press: &Press, client: Arc<dyn ContentClient>) -> Result<Self> {
        let renderer = TemplateRenderer::new(&press.config)?;
        let i18n = press.i18n()?;

        Ok(Self {
            press: press.clone(),
            renderer,
            i18n,
            client,
        })
    }

    pub fn press(&self) -> &Press {
        &self.press
    }

    pub fn client(&self) -> &dyn ContentClient {
        self.client.as_ref()
    }

    /// Generate the entire site
    pub async fn generate(&self, cache: &mut CacheDb) -> Result<GenerationReport> {
        // Ensure public directory exists
        fs::create_dir_all(&self.press.public_dir)?;

        self.write_assets()?;

        let listing = self.generate_index().await?;
        cache.index_generated_at = Some(now());
        let mut report = GenerationReport {
            listed: listing.results.len(),
            ..Default::default()
        };

        let document_type = &self.press.config.prismic.document_type;
        let uids = detail::enumerate_paths(self.client(), document_type).await?;
        for uid in &uids {
            let outcome = self
                .generate_post(uid, cache)
                .await
                .with_context(|| format!("Failed to generate post {}", uid))?;
            match outcome {
                PostOutcome::Written => report.written += 1,
                PostOutcome::Unchanged => report.unchanged += 1,
                PostOutcome::NotFound | PostOutcome::Rejected => report.skipped.push(uid.clone()),
            }
        }

        let enumerated: HashSet<&str> = uids.iter().map(String::as_str).collect();
        let mut vanished: Vec<String> = cache
            .posts
            .keys()
            .filter(|uid| !enumerated.contains(uid.as_str()))
            .cloned()
            .collect();
        vanished.sort();
        for uid in vanished {
            self.remove_post(&uid, cache)?;
            report.removed.push(uid);
        }

        self.write_page("fallback.html", &self.render_fallback(None)?)?;
        self.write_page("404.html", &self.render_not_found()?)?;

        Ok(report)
    }

    /// Query the first listing page and write `index.html`
    ///
    /// The caller records the generation time.
    pub async fn generate_index(&self) -> Result<ListingState> {
        let prismic = &self.press.config.prismic;
        let state =
            listing::initial_load(self.client(), &prismic.document_type, prismic.page_size)
                .await?;

        let html = self.render_listing(&state)?;
        self.write_page("index.html", &html)?;

        Ok(state)
    }

    /// Resolve one post and write its page
    pub async fn generate_post(&self, uid: &str, cache: &mut CacheDb) -> Result<PostOutcome> {
        let rendered = self.prepare_post(uid).await?;
        self.commit_post(uid, rendered, cache)
    }

    /// Resolve and render a post without touching the output or the cache
    pub async fn prepare_post(&self, uid: &str) -> Result<RenderedPost> {
        if !is_safe_slug(uid) {
            tracing::warn!("Skipping post with unusable uid {:?}", uid);
            return Ok(RenderedPost::Rejected);
        }

        let document_type = &self.press.config.prismic.document_type;
        match detail::resolve(self.client(), document_type, uid).await? {
            DetailState::Resolved(view) => {
                let html = self.render_post(&view)?;
                let hash = cache::hash_content(&html);
                Ok(RenderedPost::Page { html, hash })
            }
            DetailState::NotFound | DetailState::Fallback => Ok(RenderedPost::NotFound),
        }
    }

    /// Write a rendered post, or drop the page of a post that no longer exists
    pub fn commit_post(
        &self,
        uid: &str,
        rendered: RenderedPost,
        cache: &mut CacheDb,
    ) -> Result<PostOutcome> {
        let (html, hash) = match rendered {
            RenderedPost::Page { html, hash } => (html, hash),
            RenderedPost::NotFound => {
                self.remove_post(uid, cache)?;
                return Ok(PostOutcome::NotFound);
            }
            RenderedPost::Rejected => return Ok(PostOutcome::Rejected),
        };

        let relative = post_relative_path(uid);
        let outcome = if self.post_output_path(uid).exists() && cache.is_unchanged(uid, &hash) {
            PostOutcome::Unchanged
        } else {
            self.write_page(&relative, &html)?;
            PostOutcome::Written
        };
        cache.record(uid, &hash, &relative, now());

        Ok(outcome)
    }

    /// Delete a post page and forget it
    fn remove_post(&self, uid: &str, cache: &mut CacheDb) -> Result<()> {
        cache.remove(uid);
        if !is_safe_slug(uid) {
            return Ok(());
        }
        let output_path = self.post_output_path(uid);
        if output_path.exists() {
            fs::remove_file(&output_path)?;
            tracing::info!("Removed page of unpublished post {}", uid);
        }
        Ok(())
    }

    /// Output file of a post page
    pub fn post_output_path(&self, uid: &str) -> PathBuf {
        self.press.public_dir.join(post_relative_path(uid))
    }

    /// Render the listing page
    pub fn render_listing(&self, state: &ListingState) -> Result<String> {
        let posts: Vec<SummaryData> = state.results.iter().map(SummaryData::from_summary).collect();

        let mut context = self.base_context();
        context.insert("posts", &posts);
        context.insert("next_page", &state.cursor());
        self.renderer.render("index.html", &context)
    }

    /// Render listing entries alone, as appended by "load more"
    pub fn render_summaries(&self, summaries: &[PostSummary]) -> Result<String> {
        let posts: Vec<SummaryData> = summaries.iter().map(SummaryData::from_summary).collect();

        let mut context = self.base_context();
        context.insert("posts", &posts);
        self.renderer.render("partials/post_list.html", &context)
    }

    /// Render a post page
    pub fn render_post(&self, view: &PostView) -> Result<String> {
        let mut context = self.base_context();
        context.insert("post", view);
        context.insert(
            "reading_time",
            &self.i18n.get_count("reading_time", view.reading_time),
        );
        self.renderer.render("post.html", &context)
    }

    /// Render the loading page shown while a post is resolved
    pub fn render_fallback(&self, refresh_secs: Option<u32>) -> Result<String> {
        let mut context = self.base_context();
        context.insert("refresh", &refresh_secs);
        self.renderer.render("fallback.html", &context)
    }

    /// Render the not-found page
    pub fn render_not_found(&self) -> Result<String> {
        self.renderer.render("404.html", &self.base_context())
    }

    /// Create a base context with common variables
    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &SiteData::from_config(&self.press.config));
        context.insert("t", &self.i18n.get_all_translations());
        context.insert("generator_version", env!("CARGO_PKG_VERSION"));
        context
    }

    fn write_assets(&self) -> Result<()> {
        self.write_page("assets/load-more.js", LOAD_MORE_SCRIPT)
    }

    /// Write a file below the public directory
    fn write_page(&self, relative: &str, content: &str) -> Result<()> {
        let output_path = self.press.public_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output_path, content)?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }
}

fn post_relative_path(uid: &str) -> String {
    format!("{}/{}/index.html", POST_ROUTE, uid)
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
