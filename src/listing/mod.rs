//! Post listing with on-demand pagination
//!
//! A listing starts from the first page of a type-filtered query and grows by
//! following `next_page` cursors. Pages are appended in the order they arrive;
//! entries are never re-sorted or de-duplicated.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::content::{PostPage, PostSummary};
use crate::error::ClientResult;
use crate::prismic::{ContentClient, PageQuery};

/// Posts loaded so far plus the cursor of the next page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingState {
    pub results: Vec<PostSummary>,
    pub next_page: Option<String>,
}

impl ListingState {
    /// State after the initial page
    pub fn new(page: PostPage) -> Self {
        Self {
            results: page.results,
            next_page: page.next_page,
        }
    }

    /// Cursor of the next page; empty cursors count as absent
    pub fn cursor(&self) -> Option<&str> {
        self.next_page
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Whether a "load more" control should be offered
    pub fn has_more(&self) -> bool {
        self.cursor().is_some()
    }

    /// Append a page: old results first, then the page's; adopt its cursor
    pub fn merge(&mut self, page: PostPage) {
        self.results.extend(page.results);
        self.next_page = page.next_page;
    }
}

/// Query the first listing page
pub async fn initial_load(
    client: &dyn ContentClient,
    document_type: &str,
    page_size: usize,
) -> ClientResult<ListingState> {
    let page = client
        .query_page(&PageQuery::listing(document_type, page_size))
        .await?;
    tracing::debug!(
        "Initial listing: {} posts, more: {}",
        page.results.len(),
        page.cursor().is_some()
    );
    Ok(ListingState::new(page))
}

/// Outcome of a load-more request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMore {
    /// A page was appended with this many posts
    Loaded(usize),
    /// There is no next page
    Exhausted,
    /// Another load is still in flight; nothing was requested
    Busy,
}

/// A listing that is extended one page at a time
///
/// At most one load runs at a time. A failed load leaves the state as it was.
#[derive(Debug, Default)]
pub struct ListingSession {
    state: Mutex<ListingState>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag however the load ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ListingSession {
    pub fn new(state: ListingState) -> Self {
        Self {
            state: Mutex::new(state),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> ListingState {
        self.state.lock().await.clone()
    }

    /// Whether a load is currently running
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Fetch the page behind the current cursor and append it
    pub async fn handle_load_more(&self, client: &dyn ContentClient) -> ClientResult<LoadMore> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Load more ignored, a request is already in flight");
            return Ok(LoadMore::Busy);
        }
        let _guard = InFlight(&self.in_flight);

        let cursor = match self.state.lock().await.cursor() {
            Some(cursor) => cursor.to_string(),
            None => return Ok(LoadMore::Exhausted),
        };

        let page = client.fetch_page(&cursor).await.map_err(|e| {
            tracing::warn!("Load more from {} failed: {}", cursor, e);
            e
        })?;

        let loaded = page.results.len();
        self.state.lock().await.merge(page);
        Ok(LoadMore::Loaded(loaded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{PostDetail, SummaryData};
    use crate::prismic::MemoryClient;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn summary(uid: &str) -> PostSummary {
        PostSummary {
            uid: Some(uid.to_string()),
            first_publication_date: None,
            data: SummaryData {
                title: uid.to_string(),
                ..Default::default()
            },
        }
    }

    fn page(uids: &[&str], next: Option<&str>) -> PostPage {
        PostPage {
            results: uids.iter().map(|u| summary(u)).collect(),
            next_page: next.map(str::to_string),
        }
    }

    fn uids(state: &ListingState) -> Vec<String> {
        state
            .results
            .iter()
            .filter_map(|p| p.uid.clone())
            .collect()
    }

    fn memory_client(count: usize) -> MemoryClient {
        (0..count).fold(MemoryClient::new(), |client, i| {
            client.with_post(
                PostDetail {
                    uid: Some(format!("post-{}", i)),
                    first_publication_date: None,
                    data: Default::default(),
                },
                "",
            )
        })
    }

    #[test]
    fn test_merge_appends_and_adopts_cursor() {
        let mut state = ListingState::new(page(&["a", "b"], Some("cursor-2")));
        state.merge(page(&["c"], Some("cursor-3")));
        assert_eq!(uids(&state), vec!["a", "b", "c"]);
        assert_eq!(state.cursor(), Some("cursor-3"));

        state.merge(page(&["d"], None));
        assert_eq!(uids(&state), vec!["a", "b", "c", "d"]);
        assert!(!state.has_more());
    }

    #[test]
    fn test_merge_keeps_duplicates() {
        let mut state = ListingState::new(page(&["a", "b"], Some("c2")));
        state.merge(page(&["b", "c"], None));
        assert_eq!(uids(&state), vec!["a", "b", "b", "c"]);
    }

    #[test]
    fn test_empty_cursor_has_no_more() {
        let state = ListingState::new(page(&["a"], Some("  ")));
        assert!(!state.has_more());
        assert!(!ListingState::default().has_more());
    }

    #[tokio::test]
    async fn test_load_until_exhausted() {
        let client = memory_client(5);
        let state = initial_load(&client, "posts", 2).await.unwrap();
        assert_eq!(state.results.len(), 2);

        let session = ListingSession::new(state);
        assert_eq!(
            session.handle_load_more(&client).await.unwrap(),
            LoadMore::Loaded(2)
        );
        assert_eq!(
            session.handle_load_more(&client).await.unwrap(),
            LoadMore::Loaded(1)
        );
        assert_eq!(
            session.handle_load_more(&client).await.unwrap(),
            LoadMore::Exhausted
        );

        let state = session.snapshot().await;
        assert_eq!(
            uids(&state),
            vec!["post-0", "post-1", "post-2", "post-3", "post-4"]
        );
        // exhausted loads issue no request
        assert_eq!(client.request_count(), 3);
    }

    #[tokio::test]
    async fn test_failed_load_leaves_state_unchanged() {
        let client = memory_client(3);
        let session = ListingSession::new(initial_load(&client, "posts", 2).await.unwrap());
        let before = session.snapshot().await;

        client.set_failing(true);
        assert!(session.handle_load_more(&client).await.is_err());
        assert_eq!(session.snapshot().await, before);
        assert!(!session.is_loading());

        client.set_failing(false);
        assert_eq!(
            session.handle_load_more(&client).await.unwrap(),
            LoadMore::Loaded(1)
        );
    }

    /// Holds every fetch until released
    struct GatedClient {
        gate: Arc<Notify>,
        inner: MemoryClient,
    }

    #[async_trait]
    impl ContentClient for GatedClient {
        async fn query_page(&self, query: &PageQuery) -> ClientResult<PostPage> {
            self.inner.query_page(query).await
        }

        async fn fetch_page(&self, cursor: &str) -> ClientResult<PostPage> {
            self.gate.notified().await;
            self.inner.fetch_page(cursor).await
        }

        async fn get_by_uid(
            &self,
            document_type: &str,
            uid: &str,
        ) -> ClientResult<Option<PostDetail>> {
            self.inner.get_by_uid(document_type, uid).await
        }

        async fn all_uids(&self, document_type: &str) -> ClientResult<Vec<String>> {
            self.inner.all_uids(document_type).await
        }
    }

    #[tokio::test]
    async fn test_overlapping_loads_are_refused() {
        let gate = Arc::new(Notify::new());
        let client = Arc::new(GatedClient {
            gate: gate.clone(),
            inner: memory_client(6),
        });
        let session = Arc::new(ListingSession::new(
            initial_load(client.as_ref(), "posts", 2).await.unwrap(),
        ));

        let first = {
            let session = session.clone();
            let client = client.clone();
            tokio::spawn(async move { session.handle_load_more(client.as_ref()).await })
        };

        while !session.is_loading() {
            tokio::task::yield_now().await;
        }
        assert_eq!(
            session.handle_load_more(client.as_ref()).await.unwrap(),
            LoadMore::Busy
        );

        gate.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), LoadMore::Loaded(2));
        assert_eq!(session.snapshot().await.results.len(), 4);
        assert!(!session.is_loading());
    }
}
