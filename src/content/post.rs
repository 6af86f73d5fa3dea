//! Post models as delivered by the content repository

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::richtext::RichTextFragment;

/// A post as returned by a listing query (only title, subtitle and author fetched)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Slug, present once the document is published with a UID
    #[serde(default)]
    pub uid: Option<String>,

    /// First publication date
    #[serde(default, with = "publication_date")]
    pub first_publication_date: Option<DateTime<Utc>>,

    pub data: SummaryData,
}

/// Fields fetched for a listing entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// One page of a paginated listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostPage {
    #[serde(default)]
    pub results: Vec<PostSummary>,

    /// Cursor (URL) of the next page
    #[serde(default)]
    pub next_page: Option<String>,
}

impl PostPage {
    /// The next-page cursor, ignoring empty strings
    pub fn cursor(&self) -> Option<&str> {
        self.next_page
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// A fully fetched post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    #[serde(default)]
    pub uid: Option<String>,

    #[serde(default, with = "publication_date")]
    pub first_publication_date: Option<DateTime<Utc>>,

    pub data: DetailData,
}

/// Fields of a post document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailData {
    pub title: String,
    pub banner: Banner,
    pub author: String,
    pub content: Vec<ContentBlock>,
}

/// Banner image field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Banner {
    pub url: Option<String>,
    pub alt: Option<String>,
}

/// A section of a post: a heading followed by rich-text body fragments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentBlock {
    pub heading: Option<String>,
    pub body: Vec<RichTextFragment>,
}

/// Prismic timestamps look like `2021-03-15T19:25:28+0000`, which is not
/// strict RFC 3339, so both forms are accepted.
mod publication_date {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_str(&date.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => parse(raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw))),
        }
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }
}

pub use publication_date::parse as parse_publication_date;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_listing_page() {
        let json = r#"{
            "page": 1,
            "next_page": "https://blog.cdn.prismic.io/api/v2/documents/search?page=2",
            "results": [{
                "id": "YE9",
                "uid": "como-utilizar-hooks",
                "type": "posts",
                "first_publication_date": "2021-03-15T19:25:28+0000",
                "data": {"title": "Como utilizar Hooks", "subtitle": "Pensando em sincronização", "author": "Joseph Oliveira"}
            }]
        }"#;
        let page: PostPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.results.len(), 1);
        let post = &page.results[0];
        assert_eq!(post.uid.as_deref(), Some("como-utilizar-hooks"));
        assert_eq!(
            post.first_publication_date,
            Some(Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap())
        );
        assert_eq!(post.data.author, "Joseph Oliveira");
        assert_eq!(
            page.cursor(),
            Some("https://blog.cdn.prismic.io/api/v2/documents/search?page=2")
        );
    }

    #[test]
    fn test_empty_cursor_is_absent() {
        let page: PostPage = serde_json::from_str(r#"{"results": [], "next_page": ""}"#).unwrap();
        assert_eq!(page.cursor(), None);
        let page: PostPage = serde_json::from_str(r#"{"results": [], "next_page": null}"#).unwrap();
        assert_eq!(page.cursor(), None);
    }

    #[test]
    fn test_null_publication_date() {
        let json = r#"{"uid": null, "first_publication_date": null, "data": {"title": "Draft"}}"#;
        let post: PostSummary = serde_json::from_str(json).unwrap();
        assert!(post.uid.is_none());
        assert!(post.first_publication_date.is_none());
        assert_eq!(post.data.subtitle, "");
    }

    #[test]
    fn test_detail_missing_fields_default() {
        let json = r#"{
            "uid": "post",
            "first_publication_date": "2021-03-25T19:25:28+00:00",
            "data": {"title": "T", "author": "A", "content": [{"heading": "H"}, {"body": [{"type": "paragraph", "text": "x", "spans": []}]}]}
        }"#;
        let post: PostDetail = serde_json::from_str(json).unwrap();
        assert!(post.data.banner.url.is_none());
        assert_eq!(post.data.content.len(), 2);
        assert!(post.data.content[0].body.is_empty());
        assert!(post.data.content[1].heading.is_none());
    }

    #[test]
    fn test_date_serializes_as_rfc3339() {
        let post = PostSummary {
            uid: Some("a".to_string()),
            first_publication_date: Some(Utc.with_ymd_and_hms(2021, 3, 15, 0, 0, 0).unwrap()),
            data: SummaryData::default(),
        };
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["first_publication_date"], "2021-03-15T00:00:00+00:00");
    }
}
