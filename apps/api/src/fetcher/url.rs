//! Job URL validation and normalization.

use url::Url;

/// Parses a job URL and normalizes it into the form used as the cache key.
///
/// Only `http`/`https` with a host are accepted. The fragment and an empty
/// query are dropped; host lowercasing and default-port elision come from
/// the `url` parser itself.
pub fn normalize_url(raw: &str) -> Result<Url, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("URL is required".to_string());
    }

    let mut url = Url::parse(trimmed).map_err(|e| format!("malformed URL: {e}"))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!(
            "unsupported scheme '{}': only http and https are allowed",
            url.scheme()
        ));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err("URL must include a host".to_string());
    }

    url.set_fragment(None);
    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}
