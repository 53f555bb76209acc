//! URL checks for link fields. Fails closed: anything that does not parse as
//! an absolute http(s) URL with a host is rejected outright.

use axum::http::Uri;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlCheckError {
    #[error("not a valid URL")]
    Malformed,

    #[error("URL must start with http:// or https://")]
    UnsupportedScheme,

    #[error("URL has no host")]
    MissingHost,

    #[error("host '{0}' is not allowed")]
    HostNotAllowed(String),
}

/// Parses an absolute http(s) URL and returns its lower-cased host.
pub fn web_host(raw: &str) -> Result<String, UrlCheckError> {
    let uri: Uri = raw.parse().map_err(|_| UrlCheckError::Malformed)?;

    match uri.scheme_str() {
        Some(s) if s.eq_ignore_ascii_case("http") || s.eq_ignore_ascii_case("https") => {}
        Some(_) => return Err(UrlCheckError::UnsupportedScheme),
        None => return Err(UrlCheckError::Malformed),
    }

    let host = uri
        .host()
        .map(|h| h.trim_end_matches('.').to_ascii_lowercase())
        .unwrap_or_default();
    if host.is_empty() {
        return Err(UrlCheckError::MissingHost);
    }
    Ok(host)
}

/// Returns true when `host` equals one of `allowed` or is a subdomain of it.
///
/// Suffix matching is anchored on a dot, so `notlinkedin.com` does not match
/// `linkedin.com`.
pub fn host_matches(host: &str, allowed: &[&str]) -> bool {
    allowed.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Accepts `raw` only if it is a web URL whose host is on the allow-list.
pub fn check_allowed_host(raw: &str, allowed: &[&str]) -> Result<String, UrlCheckError> {
    let host = web_host(raw)?;
    if host_matches(&host, allowed) {
        Ok(host)
    } else {
        Err(UrlCheckError::HostNotAllowed(host))
    }
}
