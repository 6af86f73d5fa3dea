//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Route prefix of post pages
pub const POST_ROUTE: &str = "post";

/// Site path of a post page
///
/// # Examples
/// ```ignore
/// post_path("como-utilizar-hooks") // -> "/post/como-utilizar-hooks"
/// ```
pub fn post_path(uid: &str) -> String {
    format!("/{}/{}", POST_ROUTE, utf8_percent_encode(uid, SEGMENT))
}

/// Whether a slug can be used as an output directory name
///
/// Prismic UIDs are lowercase words joined by `-` or `_`; anything that could
/// escape the output directory is refused.
pub fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 200
        && !slug.starts_with('.')
        && slug
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_path() {
        assert_eq!(post_path("como-utilizar-hooks"), "/post/como-utilizar-hooks");
        assert_eq!(post_path("a b"), "/post/a%20b");
        assert_eq!(post_path("a/b"), "/post/a%2Fb");
    }

    #[test]
    fn test_is_safe_slug() {
        assert!(is_safe_slug("criando-um-app-cra-do-zero"));
        assert!(is_safe_slug("ação_2"));
        assert!(!is_safe_slug(""));
        assert!(!is_safe_slug(".."));
        assert!(!is_safe_slug("../etc"));
        assert!(!is_safe_slug("a/b"));
        assert!(!is_safe_slug("a\\b"));
    }
}
