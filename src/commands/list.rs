//! List posts in the repository

use anyhow::Result;
use std::sync::Arc;

use crate::detail::{self, DetailState};
use crate::helpers::{format_publication_date, truncate};
use crate::listing::{self, ListingSession, LoadMore};
use crate::prismic::ContentClient;
use crate::Press;

/// Subtitles longer than this are shortened
const SUBTITLE_WIDTH: usize = 48;

/// Walk the listing page by page and print every post
pub async fn run(press: &Press, reading_time: bool) -> Result<()> {
    run_with_client(press, press.client()?, reading_time).await
}

pub async fn run_with_client(
    press: &Press,
    client: Arc<dyn ContentClient>,
    reading_time: bool,
) -> Result<()> {
    let config = &press.config;
    let document_type = &config.prismic.document_type;

    let state =
        listing::initial_load(client.as_ref(), document_type, config.prismic.page_size).await?;
    let session = ListingSession::new(state);
    let mut pages = 1;
    while let LoadMore::Loaded(_) = session.handle_load_more(client.as_ref()).await? {
        pages += 1;
    }
    let state = session.snapshot().await;

    println!("Posts ({}, {} pages):", state.results.len(), pages);
    for post in &state.results {
        let date = post
            .first_publication_date
            .map(|d| {
                format_publication_date(&d, &config.date_format, &config.timezone, &config.language)
            })
            .unwrap_or_else(|| "-".to_string());
        let uid = post.uid.as_deref().unwrap_or("-");
        let mut line = format!("  {} - {}", date, post.data.title);
        if !post.data.subtitle.is_empty() {
            let subtitle = truncate(&post.data.subtitle, SUBTITLE_WIDTH, None);
            line.push_str(&format!(" ({})", subtitle));
        }
        line.push_str(&format!(" [{}]", uid));

        if reading_time && uid != "-" {
            if let DetailState::Resolved(view) =
                detail::resolve(client.as_ref(), document_type, uid).await?
            {
                line.push_str(&format!(" {} min", view.reading_time));
            }
        }
        println!("{}", line);
    }

    Ok(())
}
