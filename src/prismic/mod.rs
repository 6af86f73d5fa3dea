//! Content repository access
//!
//! [`ContentClient`] is the seam between the generator/server and the CMS.
//! [`PrismicClient`] talks to the Prismic REST API. With the `test-util`
//! feature, `MemoryClient` serves a fixed set of posts from memory.

mod client;
#[cfg(any(test, feature = "test-util"))]
mod memory;
pub mod predicate;

use async_trait::async_trait;

use crate::content::{PostDetail, PostPage};
use crate::error::ClientResult;

pub use client::PrismicClient;
#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryClient;

/// Fields requested for listing entries
pub const LISTING_FIELDS: [&str; 3] = ["title", "subtitle", "author"];

/// A type-filtered listing query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub document_type: String,
    /// Fields to fetch, already qualified as `<type>.<field>`
    pub fields: Vec<String>,
    pub page_size: usize,
    /// 1-based page number
    pub page: usize,
}

impl PageQuery {
    /// First page of the post listing: title, subtitle and author only
    pub fn listing(document_type: &str, page_size: usize) -> Self {
        Self {
            document_type: document_type.to_string(),
            fields: LISTING_FIELDS
                .iter()
                .map(|f| format!("{}.{}", document_type, f))
                .collect(),
            page_size,
            page: 1,
        }
    }
}

/// Operations the site needs from the content repository
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Run a listing query
    async fn query_page(&self, query: &PageQuery) -> ClientResult<PostPage>;

    /// Follow a `next_page` cursor
    async fn fetch_page(&self, cursor: &str) -> ClientResult<PostPage>;

    /// Look a document up by its UID; `None` when no such document exists
    async fn get_by_uid(&self, document_type: &str, uid: &str)
        -> ClientResult<Option<PostDetail>>;

    /// UIDs of every document of the type, in repository order
    async fn all_uids(&self, document_type: &str) -> ClientResult<Vec<String>>;
}
