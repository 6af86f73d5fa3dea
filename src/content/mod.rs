//! Content module - post models, structured text and reading time

mod post;
pub mod reading;
pub mod richtext;

pub use post::{
    parse_publication_date, Banner, ContentBlock, DetailData, PostDetail, PostPage, PostSummary,
    SummaryData,
};
pub use reading::{reading_time, word_count};
pub use richtext::{RichTextFragment, TrustedHtml};
