use std::fmt::Write;

use url::Url;

/// Maps a URL to its canonical form, or `None` when it is not a URL the
/// caller recognizes. Implementations must be idempotent.
pub trait Canonicalizer {
    fn normalize(&self, url: &str) -> Option<String>;
}

impl<F> Canonicalizer for F
where
    F: Fn(&str) -> Option<String>,
{
    fn normalize(&self, url: &str) -> Option<String> {
        self(url)
    }
}

/// Default canonicalizer for story URLs, see [`normalize_url`].
#[derive(Debug, Default, Clone, Copy)]
pub struct UrlCanonicalizer;

impl Canonicalizer for UrlCanonicalizer {
    fn normalize(&self, url: &str) -> Option<String> {
        normalize_url(url)
    }
}

/// Canonical http(s) URL: lowercase scheme and host, no default port, no
/// user info or fragment, no trailing slash. The query is kept.
///
/// A missing scheme is taken to be `https`.
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = if has_scheme(trimmed) {
        Url::parse(trimmed).ok()?
    } else {
        Url::parse(&format!("https://{trimmed}")).ok()?
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?;

    let mut out = format!("{}://{}", parsed.scheme(), host);
    if let Some(port) = parsed.port() {
        let _ = write!(out, ":{port}");
    }
    out.push_str(parsed.path().trim_end_matches('/'));
    if let Some(query) = parsed.query() {
        out.push('?');
        out.push_str(query);
    }
    Some(out)
}

/// True when `url` starts with `<scheme>://`. A `://` further in, such as
/// inside a query, does not count.
fn has_scheme(url: &str) -> bool {
    let Some((scheme, _)) = url.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
