//! Prismic structured text and its conversion to HTML
//!
//! Structured text arrives as a flat list of block fragments (paragraphs,
//! headings, list items, images, embeds), each with inline spans addressed by
//! UTF-16 offsets into the fragment text. The converter escapes every piece of
//! text and attribute it emits, so its output is the only markup templates
//! insert without escaping.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::helpers::html_escape;

/// A block of structured text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichTextFragment {
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub spans: Vec<Span>,

    /// Image source (image fragments)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Image alternative text (image fragments)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    /// Embed metadata (embed fragments)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oembed: Option<Embed>,
}

impl RichTextFragment {
    /// A paragraph without inline formatting
    pub fn paragraph(text: &str) -> Self {
        Self {
            kind: "paragraph".to_string(),
            text: text.to_string(),
            ..Default::default()
        }
    }
}

/// Inline formatting over `start..end` (UTF-16 code units)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanData {
    pub url: Option<String>,
    pub target: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Embed {
    pub embed_url: Option<String>,
    pub title: Option<String>,
    pub provider_name: Option<String>,
}

/// Markup produced by [`as_html`]
///
/// Can only be constructed by the converter; templates render it with
/// `| safe`, everything else stays autoescaped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TrustedHtml(String);

impl TrustedHtml {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrustedHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Convert structured text to HTML
pub fn as_html(fragments: &[RichTextFragment]) -> TrustedHtml {
    let mut out = String::new();
    let mut open_list: Option<&'static str> = None;

    for fragment in fragments {
        let list = match fragment.kind.as_str() {
            "list-item" => Some("ul"),
            "o-list-item" => Some("ol"),
            _ => None,
        };
        if open_list != list {
            if let Some(tag) = open_list {
                out.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list {
                out.push_str(&format!("<{}>", tag));
            }
            open_list = list;
        }

        match fragment.kind.as_str() {
            "paragraph" => wrap(&mut out, "p", fragment),
            "preformatted" => wrap(&mut out, "pre", fragment),
            "list-item" | "o-list-item" => wrap(&mut out, "li", fragment),
            "image" => push_image(&mut out, fragment),
            "embed" => push_embed(&mut out, fragment),
            kind => match heading_level(kind) {
                Some(level) => wrap(&mut out, &format!("h{}", level), fragment),
                None => tracing::debug!("Skipping unsupported rich text fragment: {}", kind),
            },
        }
    }

    if let Some(tag) = open_list {
        out.push_str(&format!("</{}>", tag));
    }

    TrustedHtml(out)
}

fn heading_level(kind: &str) -> Option<u8> {
    let level: u8 = kind.strip_prefix("heading")?.parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}

fn wrap(out: &mut String, tag: &str, fragment: &RichTextFragment) {
    out.push_str(&format!("<{}>", tag));
    out.push_str(&render_spans(&fragment.text, &fragment.spans));
    out.push_str(&format!("</{}>", tag));
}

fn push_image(out: &mut String, fragment: &RichTextFragment) {
    let Some(src) = fragment.url.as_deref().and_then(safe_url) else {
        return;
    };
    out.push_str(&format!(
        r#"<p class="block-img"><img src="{}" alt="{}"></p>"#,
        html_escape(src),
        html_escape(fragment.alt.as_deref().unwrap_or(""))
    ));
}

/// Embeds are rendered as links; third-party embed markup is never inlined.
fn push_embed(out: &mut String, fragment: &RichTextFragment) {
    let Some(embed) = &fragment.oembed else {
        return;
    };
    let Some(url) = embed.embed_url.as_deref().and_then(safe_url) else {
        return;
    };
    let label = embed
        .title
        .as_deref()
        .or(embed.provider_name.as_deref())
        .unwrap_or(url);
    out.push_str(&format!(
        r#"<div class="embed"><a href="{}" rel="noopener">{}</a></div>"#,
        html_escape(url),
        html_escape(label)
    ));
}

/// Only web, mail and site-relative links survive conversion
fn safe_url(url: &str) -> Option<&str> {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    let allowed = lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("mailto:")
        || (url.starts_with('/') && !url.starts_with("//"));
    allowed.then_some(url)
}

fn span_tags(span: &Span) -> Option<(String, &'static str)> {
    match span.kind.as_str() {
        "strong" => Some(("<strong>".to_string(), "</strong>")),
        "em" => Some(("<em>".to_string(), "</em>")),
        "hyperlink" => {
            let data = span.data.as_ref()?;
            let href = data.url.as_deref().and_then(safe_url)?;
            let target = match data.target.as_deref() {
                Some("_blank") => r#" target="_blank" rel="noopener""#,
                _ => "",
            };
            Some((
                format!(r#"<a href="{}"{}>"#, html_escape(href), target),
                "</a>",
            ))
        }
        "label" => {
            let label = span.data.as_ref()?.label.as_deref()?;
            Some((
                format!(r#"<span class="{}">"#, html_escape(label)),
                "</span>",
            ))
        }
        _ => None,
    }
}

/// Split the text at every span boundary and wrap each segment in the tags
/// of the spans covering it.
fn render_spans(text: &str, spans: &[Span]) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();
    let len = units.len();

    let spans: Vec<(usize, usize, (String, &'static str))> = spans
        .iter()
        .filter_map(|s| {
            let end = s.end.min(len);
            if s.start >= end {
                return None;
            }
            span_tags(s).map(|tags| (s.start, end, tags))
        })
        .collect();

    let mut bounds: Vec<usize> = vec![0, len];
    for (start, end, _) in &spans {
        bounds.push(*start);
        bounds.push(*end);
    }
    bounds.sort_unstable();
    bounds.dedup();

    let mut out = String::new();
    for window in bounds.windows(2) {
        let (from, to) = (window[0], window[1]);
        let covering: Vec<&(String, &'static str)> = spans
            .iter()
            .filter(|(start, end, _)| *start <= from && to <= *end)
            .map(|(_, _, tags)| tags)
            .collect();

        for (open, _) in &covering {
            out.push_str(open);
        }
        let segment = String::from_utf16_lossy(&units[from..to]);
        out.push_str(&html_escape(&segment).replace('\n', "<br>"));
        for (_, close) in covering.iter().rev() {
            out.push_str(close);
        }
    }

    out
}
