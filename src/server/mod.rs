//! Preview server
//!
//! Serves the generated site and keeps it current: posts that were not
//! pre-rendered get a loading page while they are resolved in the background,
//! and pages older than the revalidation interval are served once more while a
//! fresh copy is generated.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::CacheDb;
use crate::detail::DetailState;
use crate::error::ClientError;
use crate::generator::{Generator, PostOutcome};
use crate::helpers::is_safe_slug;

/// Seconds before the loading page reloads itself
const FALLBACK_REFRESH_SECS: u32 = 1;

/// Lookup key used for the listing page
const INDEX_KEY: &str = "/";

/// Most pages tracked at once, pending or known missing
const MAX_LOOKUPS: usize = 1024;

/// A page that is being generated, or a slug known not to exist
#[derive(Debug, Clone)]
struct Lookup {
    state: DetailState,
    since: Instant,
}

/// Server state
///
/// The cache lock is only held to read or record entries, never while the
/// repository is queried.
pub struct ServerState {
    generator: Generator,
    cache: Mutex<CacheDb>,
    lookups: Mutex<HashMap<String, Lookup>>,
    max_lookups: usize,
}

impl ServerState {
    pub fn new(generator: Generator, cache: CacheDb) -> Self {
        Self {
            generator,
            cache: Mutex::new(cache),
            lookups: Mutex::new(HashMap::new()),
            max_lookups: MAX_LOOKUPS,
        }
    }

    /// Limit how many pages are tracked at once
    pub fn with_lookup_limit(mut self, max_lookups: usize) -> Self {
        self.max_lookups = max_lookups.max(1);
        self
    }

    fn revalidate_secs(&self) -> u64 {
        self.generator.press().config.revalidate
    }

    /// Mark a page as being generated
    ///
    /// False when that is already under way, or when every tracked page is
    /// still pending.
    async fn begin_lookup(&self, key: &str) -> bool {
        let ttl = Duration::from_secs(self.revalidate_secs());
        let mut lookups = self.lookups.lock().await;
        if let Some(Lookup {
            state: DetailState::Fallback,
            ..
        }) = lookups.get(key)
        {
            return false;
        }

        lookups.retain(|_, lookup| {
            !matches!(lookup.state, DetailState::NotFound) || lookup.since.elapsed() < ttl
        });
        if !lookups.contains_key(key) && lookups.len() >= self.max_lookups {
            let oldest_missing = lookups
                .iter()
                .filter(|(_, lookup)| matches!(lookup.state, DetailState::NotFound))
                .min_by_key(|(_, lookup)| lookup.since)
                .map(|(slug, _)| slug.clone());
            match oldest_missing {
                Some(slug) => {
                    lookups.remove(&slug);
                }
                None => {
                    tracing::warn!("Too many pages pending, not starting {}", key);
                    return false;
                }
            }
        }

        lookups.insert(
            key.to_string(),
            Lookup {
                state: DetailState::Fallback,
                since: Instant::now(),
            },
        );
        true
    }
}

/// Build the application router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/post/:slug", get(post_handler))
        .route("/post/:slug/", get(post_handler))
        .route("/api/posts/more", get(load_more_handler))
        .fallback(static_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(generator: Generator, ip: &str, port: u16) -> Result<()> {
    let cache = CacheDb::load(&generator.press().cache_dir);
    let state = Arc::new(ServerState::new(generator, cache));
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Serve the listing page, regenerating it once it is stale
async fn index_handler(State(state): State<Arc<ServerState>>) -> Response {
    let index_path = state.generator.press().public_dir.join("index.html");

    let stale = match state.cache.lock().await.index_generated_at {
        Some(at) => now().saturating_sub(at) >= state.revalidate_secs() as i64,
        None => true,
    };
    if stale && state.begin_lookup(INDEX_KEY).await {
        spawn_index_regeneration(state.clone());
    }

    match tokio::fs::read_to_string(&index_path).await {
        Ok(html) => Html(html).into_response(),
        Err(_) => fallback(&state),
    }
}

fn spawn_index_regeneration(state: Arc<ServerState>) {
    tokio::spawn(async move {
        match state.generator.generate_index().await {
            Ok(listing) => {
                tracing::debug!("Regenerated listing with {} posts", listing.results.len());
                let mut cache = state.cache.lock().await;
                cache.index_generated_at = Some(now());
                if let Err(e) = cache.save(&state.generator.press().cache_dir) {
                    tracing::warn!("Failed to save cache: {}", e);
                }
            }
            Err(e) => tracing::error!("Failed to regenerate listing: {:#}", e),
        }
        state.lookups.lock().await.remove(INDEX_KEY);
    });
}

/// Serve a post page, rendering it on demand when needed
async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    if !is_safe_slug(&slug) {
        return not_found(&state);
    }

    let output_path = state.generator.post_output_path(&slug);
    if let Ok(html) = tokio::fs::read_to_string(&output_path).await {
        let stale = state
            .cache
            .lock()
            .await
            .is_stale(&slug, now(), state.revalidate_secs());
        if stale && state.begin_lookup(&slug).await {
            tracing::debug!("Revalidating {}", slug);
            spawn_post_regeneration(state.clone(), slug);
        }
        return Html(html).into_response();
    }

    let known = state.lookups.lock().await.get(&slug).cloned();
    match known {
        Some(Lookup {
            state: DetailState::Fallback,
            ..
        }) => return fallback(&state),
        Some(Lookup {
            state: DetailState::NotFound,
            since,
        }) if since.elapsed() < Duration::from_secs(state.revalidate_secs()) => {
            return not_found(&state)
        }
        _ => {}
    }

    if !state.generator.press().config.fallback {
        return not_found(&state);
    }

    if state.begin_lookup(&slug).await {
        tracing::info!("Rendering {} on first request", slug);
        spawn_post_regeneration(state.clone(), slug);
    }
    fallback(&state)
}

fn spawn_post_regeneration(state: Arc<ServerState>, slug: String) {
    tokio::spawn(async move {
        let result = match state.generator.prepare_post(&slug).await {
            Ok(rendered) => {
                let mut cache = state.cache.lock().await;
                let result = state.generator.commit_post(&slug, rendered, &mut cache);
                if result.is_ok() {
                    if let Err(e) = cache.save(&state.generator.press().cache_dir) {
                        tracing::warn!("Failed to save cache: {}", e);
                    }
                }
                result
            }
            Err(e) => Err(e),
        };

        let mut lookups = state.lookups.lock().await;
        match result {
            Ok(PostOutcome::Written) | Ok(PostOutcome::Unchanged) => {
                tracing::debug!("Post {} is up to date", slug);
                lookups.remove(&slug);
            }
            Ok(PostOutcome::NotFound) | Ok(PostOutcome::Rejected) => {
                lookups.insert(
                    slug,
                    Lookup {
                        state: DetailState::NotFound,
                        since: Instant::now(),
                    },
                );
            }
            Err(e) => {
                tracing::error!("Failed to render post {}: {:#}", slug, e);
                lookups.remove(&slug);
            }
        }
    });
}

#[derive(Debug, Deserialize)]
struct LoadMoreQuery {
    #[serde(default)]
    cursor: String,
}

/// Listing entries returned to the "load more" button
#[derive(Debug, Serialize, Deserialize)]
pub struct LoadMoreResponse {
    pub html: String,
    pub next_page: Option<String>,
}

/// Fetch the page behind a cursor and render its entries
async fn load_more_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<LoadMoreQuery>,
) -> Response {
    let cursor = query.cursor.trim();
    if cursor.is_empty() {
        return (StatusCode::BAD_REQUEST, "missing cursor").into_response();
    }

    let page = match state.generator.client().fetch_page(cursor).await {
        Ok(page) => page,
        Err(e @ (ClientError::ForeignCursor(_) | ClientError::InvalidUrl { .. })) => {
            tracing::warn!("Rejected load-more cursor: {}", e);
            return (StatusCode::BAD_REQUEST, "invalid cursor").into_response();
        }
        Err(e) => {
            tracing::error!("Load more failed: {}", e);
            return (StatusCode::BAD_GATEWAY, "content repository unavailable").into_response();
        }
    };

    match state.generator.render_summaries(&page.results) {
        Ok(html) => Json(LoadMoreResponse {
            html,
            next_page: page.cursor().map(str::to_string),
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Failed to render posts: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Serve files from the public directory
async fn static_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let mut service = ServeDir::new(&state.generator.press().public_dir)
        .append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => not_found(&state),
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

fn fallback(state: &ServerState) -> Response {
    match state.generator.render_fallback(Some(FALLBACK_REFRESH_SECS)) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render fallback page: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn not_found(state: &ServerState) -> Response {
    match state.generator.render_not_found() {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}
