//! Post detail resolution
//!
//! A post page moves from `Fallback` (data still loading) to either
//! `Resolved` or `NotFound`; both are terminal for a given slug.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::content::{self, richtext, PostDetail, TrustedHtml};
use crate::error::ClientResult;
use crate::prismic::ContentClient;

/// Render state of a post page
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    /// Data is still being fetched
    Fallback,
    /// The post exists and is ready to render
    Resolved(Box<PostView>),
    /// No document has this slug
    NotFound,
}

impl DetailState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DetailState::Fallback)
    }
}

/// Everything a post page displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostView {
    pub uid: String,
    pub title: String,
    pub banner_url: Option<String>,
    pub author: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    /// Estimated minutes
    pub reading_time: usize,
    pub word_count: usize,
    pub blocks: Vec<RenderedBlock>,
}

/// A content block with its body converted to HTML
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedBlock {
    pub heading: String,
    pub html: TrustedHtml,
}

impl PostView {
    /// Build the view of a fetched post
    pub fn from_detail(uid: &str, detail: &PostDetail) -> Self {
        let blocks = &detail.data.content;
        Self {
            uid: detail.uid.clone().unwrap_or_else(|| uid.to_string()),
            title: detail.data.title.clone(),
            banner_url: detail
                .data
                .banner
                .url
                .clone()
                .filter(|u| !u.trim().is_empty()),
            author: detail.data.author.clone(),
            first_publication_date: detail.first_publication_date,
            reading_time: content::reading_time(blocks),
            word_count: content::word_count(blocks),
            blocks: blocks
                .iter()
                .map(|block| RenderedBlock {
                    heading: block.heading.clone().unwrap_or_default(),
                    html: richtext::as_html(&block.body),
                })
                .collect(),
        }
    }
}

/// Look a post up by slug
///
/// A missing document is `NotFound`; only transport failures are errors.
pub async fn resolve(
    client: &dyn ContentClient,
    document_type: &str,
    slug: &str,
) -> ClientResult<DetailState> {
    match client.get_by_uid(document_type, slug).await? {
        Some(detail) => Ok(DetailState::Resolved(Box::new(PostView::from_detail(
            slug, &detail,
        )))),
        None => {
            tracing::debug!("No {} document with uid {}", document_type, slug);
            Ok(DetailState::NotFound)
        }
    }
}

/// Slugs of every post, for pre-rendering
pub async fn enumerate_paths(
    client: &dyn ContentClient,
    document_type: &str,
) -> ClientResult<Vec<String>> {
    let uids = client.all_uids(document_type).await?;
    tracing::debug!("Enumerated {} {} documents", uids.len(), document_type);
    Ok(uids)
}

/// Enumerated slugs that do not resolve
pub async fn unresolvable_paths(
    client: &dyn ContentClient,
    document_type: &str,
) -> ClientResult<Vec<String>> {
    let mut missing = Vec::new();
    for slug in enumerate_paths(client, document_type).await? {
        if resolve(client, document_type, &slug).await? == DetailState::NotFound {
            missing.push(slug);
        }
    }
    Ok(missing)
}
