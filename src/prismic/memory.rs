//! In-memory content repository

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{ContentClient, PageQuery};
use crate::content::{PostDetail, PostPage, PostSummary};
use crate::error::{ClientError, ClientResult};

const CURSOR_SCHEME: &str = "memory://";

/// A listing entry plus the document a UID lookup returns for it
#[derive(Debug, Clone)]
struct Entry {
    summary: PostSummary,
    detail: Option<PostDetail>,
}

/// Serves posts from memory with Prismic-like pagination
///
/// Cursors have the form `memory://<type>?page=<n>&pageSize=<size>`.
#[derive(Debug, Default)]
pub struct MemoryClient {
    entries: Vec<Entry>,
    failing: AtomicBool,
    requests: AtomicUsize,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a published post; its summary is derived from the detail
    pub fn with_post(mut self, detail: PostDetail, subtitle: &str) -> Self {
        let summary = PostSummary {
            uid: detail.uid.clone(),
            first_publication_date: detail.first_publication_date,
            data: crate::content::SummaryData {
                title: detail.data.title.clone(),
                subtitle: subtitle.to_string(),
                author: detail.data.author.clone(),
            },
        };
        self.entries.push(Entry {
            summary,
            detail: Some(detail),
        });
        self
    }

    /// Add a listing entry that UID lookups do not find
    pub fn with_orphan(mut self, summary: PostSummary) -> Self {
        self.entries.push(Entry {
            summary,
            detail: None,
        });
        self
    }

    /// Make every following request fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of requests served so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn begin_request(&self) -> ClientResult<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClientError::Unavailable("memory repository offline".to_string()));
        }
        Ok(())
    }

    fn page(&self, document_type: &str, page: usize, page_size: usize) -> PostPage {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let start = (page - 1).saturating_mul(page_size).min(self.entries.len());
        let end = (start + page_size).min(self.entries.len());

        let next_page = (end < self.entries.len()).then(|| {
            format!(
                "{}{}?page={}&pageSize={}",
                CURSOR_SCHEME,
                document_type,
                page + 1,
                page_size
            )
        });

        PostPage {
            results: self.entries[start..end]
                .iter()
                .map(|e| e.summary.clone())
                .collect(),
            next_page,
        }
    }
}

#[async_trait]
impl ContentClient for MemoryClient {
    async fn query_page(&self, query: &PageQuery) -> ClientResult<PostPage> {
        self.begin_request()?;
        Ok(self.page(&query.document_type, query.page, query.page_size))
    }

    async fn fetch_page(&self, cursor: &str) -> ClientResult<PostPage> {
        self.begin_request()?;
        let url = url::Url::parse(cursor).map_err(|source| ClientError::InvalidUrl {
            url: cursor.to_string(),
            source,
        })?;
        if !cursor.starts_with(CURSOR_SCHEME) {
            return Err(ClientError::ForeignCursor(cursor.to_string()));
        }

        let document_type = url.host_str().unwrap_or_default().to_string();
        let param = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.parse::<usize>().ok())
        };
        let page = param("page").unwrap_or(1);
        let page_size = param("pageSize").unwrap_or(20);

        Ok(self.page(&document_type, page, page_size))
    }

    async fn get_by_uid(
        &self,
        _document_type: &str,
        uid: &str,
    ) -> ClientResult<Option<PostDetail>> {
        self.begin_request()?;
        Ok(self
            .entries
            .iter()
            .filter_map(|e| e.detail.as_ref())
            .find(|d| d.uid.as_deref() == Some(uid))
            .cloned())
    }

    async fn all_uids(&self, _document_type: &str) -> ClientResult<Vec<String>> {
        self.begin_request()?;
        Ok(self
            .entries
            .iter()
            .filter_map(|e| e.summary.uid.clone())
            .collect())
    }
}
