use httpmock::prelude::*;
use serde_json::json;

use prismic_press::config::PrismicConfig;
use prismic_press::error::ClientError;
use prismic_press::prismic::{ContentClient, PageQuery, PrismicClient};

const SEARCH: &str = "/api/v2/documents/search";

async fn setup() -> (MockServer, PrismicClient) {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2");
            then.status(200).json_body(json!({
                "refs": [
                    {"id": "preview", "ref": "draft-ref", "isMasterRef": false},
                    {"id": "master", "ref": "master-ref", "isMasterRef": true}
                ]
            }));
        })
        .await;

    let client = PrismicClient::new(&PrismicConfig {
        endpoint: server.url("/api/v2"),
        ..Default::default()
    })
    .unwrap();
    (server, client)
}

#[tokio::test]
async fn test_listing_query() {
    let (server, client) = setup().await;
    let next = server.url("/api/v2/documents/next");
    let search = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(SEARCH)
                .query_param("ref", "master-ref")
                .query_param("q", "[[at(document.type,\"posts\")]]")
                .query_param("pageSize", "2")
                .query_param("fetch", "posts.title,posts.subtitle,posts.author");
            then.status(200).json_body(json!({
                "page": 1,
                "results": [{
                    "uid": "como-utilizar-hooks",
                    "first_publication_date": "2021-03-15T19:25:28+0000",
                    "data": {
                        "title": "Como utilizar Hooks",
                        "subtitle": "Pensando em sincronização em vez de ciclos de vida",
                        "author": "Joseph Oliveira"
                    }
                }],
                "next_page": next
            }));
        })
        .await;

    let page = client
        .query_page(&PageQuery::listing("posts", 2))
        .await
        .unwrap();
    search.assert_async().await;

    assert_eq!(page.results.len(), 1);
    let post = &page.results[0];
    assert_eq!(post.uid.as_deref(), Some("como-utilizar-hooks"));
    assert_eq!(post.data.author, "Joseph Oliveira");
    assert_eq!(
        post.first_publication_date.unwrap().to_rfc3339(),
        "2021-03-15T19:25:28+00:00"
    );
    assert_eq!(page.cursor(), Some(next.as_str()));
}

#[tokio::test]
async fn test_fetch_page_follows_cursor() {
    let (server, client) = setup().await;
    let next = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/documents/next");
            then.status(200).json_body(json!({
                "results": [{"uid": "third", "first_publication_date": null, "data": {"title": "Third"}}],
                "next_page": null
            }));
        })
        .await;

    let page = client
        .fetch_page(&server.url("/api/v2/documents/next"))
        .await
        .unwrap();
    next.assert_async().await;
    assert_eq!(page.results[0].data.title, "Third");
    assert!(page.cursor().is_none());

    let err = client
        .fetch_page("https://attacker.example.com/api/v2/documents/search")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::ForeignCursor(_)));
}

#[tokio::test]
async fn test_get_by_uid() {
    let (server, client) = setup().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(SEARCH)
                .query_param("q", "[[at(my.posts.uid,\"hooks\")]]");
            then.status(200).json_body(json!({
                "results": [{
                    "uid": "hooks",
                    "first_publication_date": "2021-03-25T19:25:28+0000",
                    "data": {
                        "title": "Como utilizar Hooks",
                        "banner": {"url": "https://images.prismic.io/banner.png", "alt": null},
                        "author": "Joseph Oliveira",
                        "content": [{
                            "heading": "Proin et varius",
                            "body": [{"type": "paragraph", "text": "Nullam dolor sapien", "spans": []}]
                        }]
                    }
                }],
                "next_page": null
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(SEARCH)
                .query_param("q", "[[at(my.posts.uid,\"missing\")]]");
            then.status(200)
                .json_body(json!({"results": [], "next_page": null}));
        })
        .await;

    let post = client.get_by_uid("posts", "hooks").await.unwrap().unwrap();
    assert_eq!(
        post.data.banner.url.as_deref(),
        Some("https://images.prismic.io/banner.png")
    );
    assert_eq!(post.data.content[0].body[0].text, "Nullam dolor sapien");

    assert!(client.get_by_uid("posts", "missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_all_uids_follows_every_page() {
    let (server, client) = setup().await;
    let next = server.url("/api/v2/documents/next");
    server
        .mock_async(|when, then| {
            when.method(GET).path(SEARCH).query_param("pageSize", "100");
            then.status(200).json_body(json!({
                "results": [{"uid": "a"}, {"uid": null}, {"uid": "b"}],
                "next_page": next
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/documents/next");
            then.status(200)
                .json_body(json!({"results": [{"uid": "c"}], "next_page": ""}));
        })
        .await;

    let uids = client.all_uids("posts").await.unwrap();
    assert_eq!(uids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_errors_are_reported() {
    let (server, client) = setup().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(SEARCH);
            then.status(503).body("maintenance");
        })
        .await;

    let err = client
        .query_page(&PageQuery::listing("posts", 2))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_missing_master_ref() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2");
            then.status(200).json_body(json!({"refs": []}));
        })
        .await;
    let client = PrismicClient::new(&PrismicConfig {
        endpoint: server.url("/api/v2"),
        access_token: Some("secret".to_string()),
        ..Default::default()
    })
    .unwrap();

    let err = client.all_uids("posts").await.unwrap_err();
    assert!(matches!(err, ClientError::NoMasterRef(_)));
}

#[tokio::test]
async fn test_master_ref_is_reused() {
    let server = MockServer::start_async().await;
    let root = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2");
            then.status(200)
                .json_body(json!({"refs": [{"ref": "master-ref", "isMasterRef": true}]}));
        })
        .await;
    let search = server
        .mock_async(|when, then| {
            when.method(GET).path(SEARCH).query_param("ref", "master-ref");
            then.status(200)
                .json_body(json!({"results": [], "next_page": null}));
        })
        .await;
    let client = PrismicClient::new(&PrismicConfig {
        endpoint: server.url("/api/v2"),
        ..Default::default()
    })
    .unwrap();

    for uid in ["a", "b", "c"] {
        assert!(client.get_by_uid("posts", uid).await.unwrap().is_none());
    }
    search.assert_calls_async(3).await;
    root.assert_calls_async(1).await;
}
