//! Fixed browser-like header set attached to every transfer request.
//!
//! Some mirrors reject requests that look like automation. A single reusable
//! header set keeps probe and stream traffic consistent; it is built once per
//! client, never per request.
//!
//! Accept-Encoding is deliberately absent: transparent compression would make
//! the decompressed byte count diverge from `Content-Length`, and resume
//! offsets are derived from on-disk size vs. that header.

use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONNECTION, HeaderMap, HeaderValue, UPGRADE_INSECURE_REQUESTS,
    USER_AGENT,
};

/// Browser-like User-Agent sent with every request.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Builds the default header set for transfer requests.
pub(crate) fn browser_header_set() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert("DNT", HeaderValue::from_static("1"));
    headers
}
