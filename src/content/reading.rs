//! Word count and reading-time estimate for post content

use super::post::ContentBlock;

/// Average reading speed used for the estimate
pub const WORDS_PER_MINUTE: usize = 200;

/// Number of whitespace-separated tokens; punctuation is not stripped
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Words in a single block: heading plus every body fragment
pub fn block_word_count(block: &ContentBlock) -> usize {
    let heading = block.heading.as_deref().map(count_words).unwrap_or(0);
    let body: usize = block.body.iter().map(|f| count_words(&f.text)).sum();
    heading + body
}

/// Total words over all blocks
pub fn word_count(blocks: &[ContentBlock]) -> usize {
    blocks.iter().map(block_word_count).sum()
}

/// Reading time in whole minutes, rounded up
pub fn reading_time(blocks: &[ContentBlock]) -> usize {
    word_count(blocks).div_ceil(WORDS_PER_MINUTE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::RichTextFragment;

    fn block(heading: Option<&str>, body: &[&str]) -> ContentBlock {
        ContentBlock {
            heading: heading.map(str::to_string),
            body: body.iter().map(|t| RichTextFragment::paragraph(t)).collect(),
        }
    }

    #[test]
    fn test_no_blocks() {
        assert_eq!(word_count(&[]), 0);
        assert_eq!(reading_time(&[]), 0);
    }

    #[test]
    fn test_single_block() {
        let blocks = vec![block(Some("a b c"), &["d e"])];
        assert_eq!(word_count(&blocks), 5);
        assert_eq!(reading_time(&blocks), 1);
    }

    #[test]
    fn test_missing_heading_and_body() {
        let blocks = vec![block(None, &["one two"]), block(Some("three"), &[]), block(Some(""), &[""])];
        assert_eq!(word_count(&blocks), 3);
    }

    #[test]
    fn test_whitespace_tokenizer() {
        assert_eq!(count_words("  hello,   world!\n\tnew-line  "), 3);
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   "), 0);
    }

    #[test]
    fn test_rounds_up() {
        let words = vec!["w"; 200].join(" ");
        let blocks = vec![block(None, &[words.as_str()])];
        assert_eq!(reading_time(&blocks), 1);

        let blocks = vec![block(Some("extra"), &[words.as_str()])];
        assert_eq!(reading_time(&blocks), 2);
    }
}
