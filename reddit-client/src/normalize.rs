use std::sync::LazyLock;

use regex::Regex;

/// Canonical host every Reddit URL is rewritten to.
pub const CANONICAL_ORIGIN: &str = "https://www.reddit.com";

/// Path segment that marks a thread (post + comments) page.
pub const THREAD_MARKER: &str = "/comments/";

/// Substring a submitted URL must contain to be considered a Reddit URL at all.
pub const HOST_MARKER: &str = "reddit.com";

static RE_REDDIT_ORIGIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://(?:old\.|www\.)?reddit\.com").unwrap());

static RE_SUBREDDIT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

/// Rewrites a user-supplied Reddit URL into its JSON endpoint form.
///
/// Drops the query string, strips one trailing slash, maps the bare, `www.`
/// and `old.` hosts to the canonical host, and appends `.json` when missing.
/// Never fails; garbage in produces a URL that fails at fetch time.
pub fn normalize_url(url: &str) -> String {
    let without_query = url.split('?').next().unwrap_or_default();
    let trimmed = without_query
        .strip_suffix('/')
        .unwrap_or(without_query);
    let mut normalized = RE_REDDIT_ORIGIN
        .replace_all(trimmed, CANONICAL_ORIGIN)
        .into_owned();
    if !normalized.ends_with(".json") {
        normalized.push_str(".json");
    }
    normalized
}

/// Whether the URL points at a single thread rather than a subreddit listing.
pub fn is_thread_url(url: &str) -> bool {
    url.contains(THREAD_MARKER)
}

pub fn is_reddit_url(url: &str) -> bool {
    url.contains(HOST_MARKER)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    Thread,
    Subreddit,
}

pub fn classify(url: &str) -> UrlKind {
    if is_thread_url(url) {
        UrlKind::Thread
    } else {
        UrlKind::Subreddit
    }
}

/// Strips `r/` and `/` decoration from a subreddit name.
pub fn clean_subreddit_name(raw: &str) -> String {
    raw.trim().replace("r/", "").replace('/', "")
}

/// True for a cleaned name that is safe to splice into a listing path.
pub fn is_valid_subreddit_name(name: &str) -> bool {
    RE_SUBREDDIT_NAME.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_old_reddit_with_query() {
        assert_eq!(
            normalize_url("https://old.reddit.com/r/test/comments/abc123/title/?x=1"),
            "https://www.reddit.com/r/test/comments/abc123/title.json"
        );
    }

    #[test]
    fn test_bare_host_and_http() {
        assert_eq!(
            normalize_url("http://reddit.com/r/rust/comments/xyz/some_post"),
            "https://www.reddit.com/r/rust/comments/xyz/some_post.json"
        );
    }

    #[test]
    fn test_existing_json_suffix_kept() {
        let url = "https://www.reddit.com/r/rust/comments/xyz/some_post.json";
        assert_eq!(normalize_url(url), url);
    }

    #[test]
    fn test_only_one_trailing_slash_stripped() {
        assert_eq!(
            normalize_url("https://www.reddit.com/r/rust//"),
            "https://www.reddit.com/r/rust/.json"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "https://old.reddit.com/r/test/comments/abc123/title/?x=1",
            "reddit.com/r/test/comments/abc123/title",
            "https://www.reddit.com/r/test/",
            "https://www.reddit.com/r/test//",
            "not a url at all",
            "",
            "https://reddit.com/r/test/comments/abc/t/?a=1?b=2",
        ];
        for input in inputs {
            let once = normalize_url(input);
            assert_eq!(normalize_url(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_thread_classification() {
        assert!(is_thread_url("https://www.reddit.com/r/test/comments/abc/title"));
        assert!(!is_thread_url("https://www.reddit.com/r/test/"));
        assert_eq!(classify("https://www.reddit.com/r/test/"), UrlKind::Subreddit);
        assert_eq!(
            classify("https://old.reddit.com/r/a/comments/b/c/"),
            UrlKind::Thread
        );
    }

    #[test]
    fn test_clean_subreddit_name() {
        assert_eq!(clean_subreddit_name("r/SaaS"), "SaaS");
        assert_eq!(clean_subreddit_name("/r/startups/"), "startups");
        assert_eq!(clean_subreddit_name("  rust "), "rust");
        assert_eq!(clean_subreddit_name("r/"), "");
    }

    #[test]
    fn test_subreddit_name_validity() {
        assert!(is_valid_subreddit_name("SaaS"));
        assert!(is_valid_subreddit_name("startups_2024"));
        assert!(!is_valid_subreddit_name(""));
        assert!(!is_valid_subreddit_name("SaaS?limit=100"));
        assert!(!is_valid_subreddit_name("SaaS.json#"));
        assert!(!is_valid_subreddit_name("..%2Fapi"));
        assert!(!is_valid_subreddit_name("two words"));
    }
}
