//! Prismic REST API (v2) client

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use url::Url;

use super::{predicate, ContentClient, PageQuery};
use crate::config::PrismicConfig;
use crate::content::{PostDetail, PostPage};
use crate::error::{ClientError, ClientResult};

/// Page size used when enumerating UIDs (the API maximum)
const ENUMERATION_PAGE_SIZE: usize = 100;

/// How long a resolved master ref is reused before asking the API root again
const MASTER_REF_TTL: Duration = Duration::from_secs(10);

/// API root document; only the refs matter here
#[derive(Debug, Deserialize)]
struct ApiRoot {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
    #[serde(default)]
    next_page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UidOnly {
    #[serde(default)]
    uid: Option<String>,
}

/// Client for a Prismic repository
#[derive(Debug, Clone)]
pub struct PrismicClient {
    http: reqwest::Client,
    endpoint: Url,
    access_token: Option<String>,
    master: Arc<Mutex<Option<(String, Instant)>>>,
}

impl PrismicClient {
    /// Create a client for the configured endpoint
    pub fn new(config: &PrismicConfig) -> ClientResult<Self> {
        let endpoint = Url::parse(config.endpoint.trim()).map_err(|source| {
            ClientError::InvalidUrl {
                url: config.endpoint.clone(),
                source,
            }
        })?;
        if endpoint.cannot_be_a_base() || !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl {
                url: config.endpoint.clone(),
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            });
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("prismic-press/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|source| ClientError::Http {
                url: endpoint.to_string(),
                source,
            })?;

        Ok(Self {
            http,
            endpoint,
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            master: Arc::new(Mutex::new(None)),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        tracing::debug!("GET {}", url);
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ClientError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| ClientError::Http {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|source| ClientError::Decode {
            url: url.to_string(),
            source,
        })
    }

    fn with_token(&self, mut url: Url) -> Url {
        if let Some(token) = &self.access_token {
            if !url.query_pairs().any(|(k, _)| k == "access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }
        url
    }

    /// Current master ref; content is always read from the published master
    async fn master_ref(&self) -> ClientResult<String> {
        if let Some(reference) = self.cached_master_ref() {
            return Ok(reference);
        }

        let api: ApiRoot = self.get_json(self.with_token(self.endpoint.clone())).await?;
        let reference = api
            .refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or_else(|| ClientError::NoMasterRef(self.endpoint.to_string()))?;

        if let Ok(mut master) = self.master.lock() {
            *master = Some((reference.clone(), Instant::now()));
        }
        Ok(reference)
    }

    fn cached_master_ref(&self) -> Option<String> {
        let master = self.master.lock().ok()?;
        master
            .as_ref()
            .filter(|(_, at)| at.elapsed() < MASTER_REF_TTL)
            .map(|(reference, _)| reference.clone())
    }

    async fn search<T: DeserializeOwned>(
        &self,
        params: &[(&str, String)],
    ) -> ClientResult<SearchResponse<T>> {
        let reference = self.master_ref().await?;

        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["documents", "search"]);
        }
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("ref", &reference);
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }

        self.get_json(self.with_token(url)).await
    }

    /// Parse a cursor and make sure it stays on this repository's host
    fn cursor_url(&self, cursor: &str) -> ClientResult<Url> {
        let url = Url::parse(cursor.trim()).map_err(|source| ClientError::InvalidUrl {
            url: cursor.to_string(),
            source,
        })?;
        let same_origin = url.scheme() == self.endpoint.scheme()
            && url.host_str() == self.endpoint.host_str()
            && url.port_or_known_default() == self.endpoint.port_or_known_default();
        if !same_origin {
            return Err(ClientError::ForeignCursor(cursor.to_string()));
        }
        Ok(self.with_token(url))
    }
}

#[async_trait]
impl ContentClient for PrismicClient {
    async fn query_page(&self, query: &PageQuery) -> ClientResult<PostPage> {
        let mut params = vec![
            ("q", predicate::document_type(&query.document_type)),
            ("pageSize", query.page_size.to_string()),
            ("page", query.page.max(1).to_string()),
        ];
        if !query.fields.is_empty() {
            params.push(("fetch", query.fields.join(",")));
        }

        let response: SearchResponse<_> = self.search(&params).await?;
        tracing::debug!(
            "Listing page {} of {}: {} results",
            query.page,
            query.document_type,
            response.results.len()
        );
        Ok(PostPage {
            results: response.results,
            next_page: response.next_page,
        })
    }

    async fn fetch_page(&self, cursor: &str) -> ClientResult<PostPage> {
        let url = self.cursor_url(cursor)?;
        self.get_json(url).await
    }

    async fn get_by_uid(
        &self,
        document_type: &str,
        uid: &str,
    ) -> ClientResult<Option<PostDetail>> {
        let params = [
            ("q", predicate::uid(document_type, uid)),
            ("pageSize", "1".to_string()),
        ];
        let response: SearchResponse<PostDetail> = self.search(&params).await?;
        Ok(response.results.into_iter().next())
    }

    async fn all_uids(&self, document_type: &str) -> ClientResult<Vec<String>> {
        let params = [
            ("q", predicate::document_type(document_type)),
            ("pageSize", ENUMERATION_PAGE_SIZE.to_string()),
        ];
        let mut response: SearchResponse<UidOnly> = self.search(&params).await?;
        let mut uids = Vec::new();

        loop {
            uids.extend(response.results.into_iter().filter_map(|d| d.uid));
            match response.next_page.as_deref().filter(|c| !c.is_empty()) {
                Some(cursor) => {
                    let url = self.cursor_url(cursor)?;
                    response = self.get_json(url).await?;
                }
                None => break,
            }
        }

        Ok(uids)
    }
}
