//! URL helper functions

use crate::config::SiteConfig;

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/css/style.css") // -> "/blog/css/style.css"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Path of a post detail page relative to the root, e.g. `post/my-post/`
pub fn post_path(config: &SiteConfig, uid: &str) -> String {
    format!("{}/{}/", config.post_dir.trim_matches('/'), encode_segment(uid))
}

/// Path of the n-th accumulated listing page (1 is the index)
pub fn listing_path(config: &SiteConfig, page: usize) -> String {
    if page <= 1 {
        String::new()
    } else {
        format!("{}/{}/", config.pagination_dir.trim_matches('/'), page)
    }
}

/// Whether a slug can be used as a directory name under the public dir
pub fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('.')
        && !slug.contains(['/', '\\'])
        && !slug.chars().any(char::is_control)
}

/// Percent-encode a single path segment
pub fn encode_segment(segment: &str) -> String {
    percent_encoding::utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Decode a percent-encoded path segment, `None` if it is not UTF-8
pub fn decode_segment(segment: &str) -> Option<String> {
    percent_encoding::percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

/// Characters escaped inside a path segment
const SEGMENT: &percent_encoding::AsciiSet = &percent_encoding::CONTROLS
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

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SiteConfig {
        SiteConfig {
            root: "/blog/".to_string(),
            url: "https://example.com".to_string(),
            ..SiteConfig::default()
        }
    }

    #[test]
    fn test_url_for() {
        let config = test_config();
        assert_eq!(url_for(&config, "/css/style.css"), "/blog/css/style.css");
        assert_eq!(url_for(&config, ""), "/blog/");
    }

    #[test]
    fn test_full_url_for() {
        let config = test_config();
        assert_eq!(
            full_url_for(&config, "post/a/"),
            "https://example.com/blog/post/a/"
        );
    }

    #[test]
    fn test_post_and_listing_paths() {
        let config = SiteConfig::default();
        assert_eq!(post_path(&config, "como-utilizar-hooks"), "post/como-utilizar-hooks/");
        assert_eq!(post_path(&config, "a b"), "post/a%20b/");
        assert_eq!(listing_path(&config, 1), "");
        assert_eq!(listing_path(&config, 3), "page/3/");
    }

    #[test]
    fn test_decode_segment_reverses_encoding() {
        let encoded = encode_segment("ação");
        assert_eq!(encoded, "a%C3%A7%C3%A3o");
        assert_eq!(decode_segment(&encoded).as_deref(), Some("ação"));
        assert_eq!(decode_segment("a%20b").as_deref(), Some("a b"));
        assert_eq!(decode_segment("%FF"), None);
    }

    #[test]
    fn test_is_safe_slug() {
        assert!(is_safe_slug("como-utilizar-hooks"));
        assert!(!is_safe_slug(""));
        assert!(!is_safe_slug(".."));
        assert!(!is_safe_slug("a/b"));
        assert!(!is_safe_slug("a\\b"));
    }
}
