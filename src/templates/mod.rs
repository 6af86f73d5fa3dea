//! Built-in templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping stays on; the only
//! values rendered with `| safe` are generated post paths and
//! [`TrustedHtml`](crate::content::TrustedHtml) from the rich-text converter.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{parse_publication_date, PostSummary};
use crate::helpers::{date_xml, format_publication_date, post_path};

/// Client-side script driving the "load more" button
pub const LOAD_MORE_SCRIPT: &str = include_str!("assets/load-more.js");

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer; date filters use the site's format, timezone and language
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("press/layout.html")),
            ("index.html", include_str!("press/index.html")),
            ("post.html", include_str!("press/post.html")),
            ("fallback.html", include_str!("press/fallback.html")),
            ("404.html", include_str!("press/404.html")),
            // Partials
            (
                "partials/post_list.html",
                include_str!("press/partials/post_list.html"),
            ),
        ])?;

        let format = config.date_format.clone();
        let timezone = config.timezone.clone();
        let language = config.language.clone();
        tera.register_filter(
            "publication_date",
            move |value: &tera::Value,
                  _args: &HashMap<String, tera::Value>|
                  -> tera::Result<tera::Value> {
                let formatted = date_value(value)?
                    .map(|d| format_publication_date(&d, &format, &timezone, &language))
                    .unwrap_or_default();
                Ok(tera::Value::String(formatted))
            },
        );
        tera.register_filter("datetime_attr", datetime_attr_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Read a serialized publication date; null means unpublished
fn date_value(value: &tera::Value) -> tera::Result<Option<DateTime<Utc>>> {
    match value {
        tera::Value::Null => Ok(None),
        tera::Value::String(s) if s.is_empty() => Ok(None),
        tera::Value::String(s) => parse_publication_date(s)
            .map(Some)
            .ok_or_else(|| tera::Error::msg(format!("invalid publication date: {}", s))),
        other => Err(tera::Error::msg(format!(
            "publication date must be a string, got {}",
            other
        ))),
    }
}

/// Tera filter: ISO 8601 date for `<time datetime>`
fn datetime_attr_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let formatted = date_value(value)?.map(|d| date_xml(&d)).unwrap_or_default();
    Ok(tera::Value::String(formatted))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub language: String,
}

impl SiteData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            language: config.language.clone(),
        }
    }
}

/// A listing entry as templates see it
#[derive(Debug, Clone, Serialize)]
pub struct SummaryData {
    /// Link to the post page; absent for documents without a UID
    pub path: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    /// Raw timestamp, formatted by the `publication_date` filter
    pub first_publication_date: Option<DateTime<Utc>>,
}

impl SummaryData {
    pub fn from_summary(summary: &PostSummary) -> Self {
        Self {
            path: summary.uid.as_deref().map(post_path),
            title: summary.data.title.clone(),
            subtitle: summary.data.subtitle.clone(),
            author: summary.data.author.clone(),
            first_publication_date: summary.first_publication_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn renderer() -> TemplateRenderer {
        let config = SiteConfig {
            language: "en".to_string(),
            ..Default::default()
        };
        TemplateRenderer::new(&config).unwrap()
    }

    #[test]
    fn test_publication_date_filter() {
        let renderer = renderer();
        let mut context = Context::new();
        context.insert(
            "date",
            &Some(Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap()),
        );
        context.insert("missing", &Option::<DateTime<Utc>>::None);

        let mut tera = renderer.tera.clone();
        let out = tera
            .render_str(
                "{{ date | publication_date }}|{{ missing | publication_date }}|{{ date | datetime_attr }}",
                &context,
            )
            .unwrap();
        assert_eq!(out, "15 Mar 2021||2021-03-15T19:25:28+00:00");
    }

    #[test]
    fn test_summary_data() {
        let summary: PostSummary = serde_json::from_str(
            r#"{"uid": "hooks", "first_publication_date": null, "data": {"title": "T"}}"#,
        )
        .unwrap();
        let data = SummaryData::from_summary(&summary);
        assert_eq!(data.path.as_deref(), Some("/post/hooks"));
        assert!(data.first_publication_date.is_none());
    }
}
