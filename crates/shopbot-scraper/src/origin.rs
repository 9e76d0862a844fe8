//! URL, host, and store-name helpers.

use reqwest::Url;

/// Returns `true` for syntactically valid absolute `http`/`https` URLs.
#[must_use]
pub fn is_absolute_http_url(url: &str) -> bool {
    Url::parse(url.trim())
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Lowercased host of `url` without a leading `www.`.
#[must_use]
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .map(|host| host.trim_start_matches("www.").to_string())
}

/// Store label shown to users, derived from the candidate's domain.
///
/// Falls back to the raw URL when it cannot be parsed.
#[must_use]
pub fn store_name(url: &str) -> String {
    host_of(url).unwrap_or_else(|| url.to_string())
}

/// `true` when `host` is `domain` or a subdomain of it.
#[must_use]
pub fn domain_matches(host: &str, domain: &str) -> bool {
    let domain = domain.trim().trim_start_matches("www.").to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Resolve `href` against `base`, returning an absolute http(s) URL.
pub(crate) fn resolve_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("data:") || href.starts_with("javascript:") {
        return None;
    }
    let resolved = match Url::parse(href) {
        Ok(u) => u,
        Err(_) => Url::parse(base).ok()?.join(href).ok()?,
    };
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}
