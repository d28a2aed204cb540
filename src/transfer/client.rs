//! HTTP transport for transfers: metadata probes and ranged byte streams.
//!
//! This is the only module that talks to the network. It exposes two
//! operations: [`HttpClient::probe`] (a HEAD request that extracts the
//! remote total size, range support, and suggested filename) and
//! [`HttpClient::open_stream`] (a GET request, optionally ranged, that
//! yields a lazily-pulled byte stream). Everything above it is I/O-free
//! decision logic.

use bytes::Bytes;
use futures_util::Stream;
use reqwest::header::{ACCEPT_RANGES, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, RANGE};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, instrument};

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::TransferError;
use super::filename::parse_content_disposition;
use crate::headers::browser_header_set;

/// HTTP client for transfer probes and streams.
///
/// Designed to be created once per engine and reused across transfer
/// attempts, taking advantage of connection pooling. Every request carries
/// the fixed browser-like header set from [`crate::headers`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

/// Remote resource metadata gathered by a probe.
#[derive(Debug, Clone, Default)]
pub struct RemoteMetadata {
    /// Total resource size in bytes, when the server reports one.
    ///
    /// `None` covers both a missing and a zero `Content-Length`; either way
    /// the transfer runs in unsized mode.
    pub total_size: Option<u64>,
    /// Whether the server advertises `Accept-Ranges: bytes`.
    pub accepts_ranges: bool,
    /// Filename from `Content-Disposition`, when present.
    pub suggested_filename: Option<String>,
    /// Raw `Content-Type` value, used for extension fallback.
    pub content_type: Option<String>,
}

/// An open GET response ready for streaming.
///
/// Each call to [`HttpClient::open_stream`] yields a fresh, finite,
/// non-restartable stream.
#[derive(Debug)]
pub struct TransferStream {
    response: Response,
}

impl TransferStream {
    /// True when the server honored a range request with `206 Partial Content`.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.response.status().as_u16() == 206
    }

    /// Body length of this response (for a 206, the *remaining* byte count).
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        header_u64(&self.response, CONTENT_LENGTH.as_str())
    }

    /// Consumes the handle, yielding the chunked byte stream.
    pub fn into_bytes_stream(self) -> impl Stream<Item = Result<Bytes, reqwest::Error>> + Unpin {
        self.response.bytes_stream()
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes
    /// - No total-request deadline: a paused transfer holds its connection
    ///   open indefinitely
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .default_headers(browser_header_set())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Probes a remote resource for size, range support, and filename.
    ///
    /// Issues a HEAD request, following redirects. A missing or zero
    /// `Content-Length` is reported as `total_size: None` (unsized mode).
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Network`]/[`TransferError::Timeout`] on
    /// transport failure and [`TransferError::HttpStatus`] on a non-2xx
    /// response.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn probe(&self, url: &str) -> Result<RemoteMetadata, TransferError> {
        let response = self.send_checked(self.client.head(url), url).await?;

        let total_size = header_u64(&response, CONTENT_LENGTH.as_str()).filter(|size| *size > 0);
        let accepts_ranges = response
            .headers()
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("bytes"));
        let suggested_filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_disposition);
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(std::string::ToString::to_string);

        debug!(
            total_size,
            accepts_ranges,
            suggested_filename = suggested_filename.as_deref(),
            "probe complete"
        );

        Ok(RemoteMetadata {
            total_size,
            accepts_ranges,
            suggested_filename,
            content_type,
        })
    }

    /// Opens a byte stream for a resource, optionally from a nonzero offset.
    ///
    /// When `range_start` is nonzero a `Range: bytes=<start>-` header is
    /// attached. The caller must check [`TransferStream::is_partial`] before
    /// appending: a 200 response to a ranged request means the server
    /// ignored the range and is sending the full body.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`probe`](Self::probe).
    #[instrument(skip(self), fields(url = %url, range_start))]
    pub async fn open_stream(
        &self,
        url: &str,
        range_start: u64,
    ) -> Result<TransferStream, TransferError> {
        let mut request = self.client.get(url);
        if range_start > 0 {
            request = request.header(RANGE, format!("bytes={range_start}-"));
        }

        let response = self.send_checked(request, url).await?;
        debug!(status = response.status().as_u16(), "stream open");
        Ok(TransferStream { response })
    }

    /// Sends a request and maps transport and status failures.
    async fn send_checked(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<Response, TransferError> {
        let response = request
            .send()
            .await
            .map_err(|e| TransferError::network(url, e))?;

        if !response.status().is_success() {
            return Err(TransferError::http_status(url, response.status().as_u16()));
        }
        Ok(response)
    }
}

fn header_u64(response: &Response, name: &str) -> Option<u64> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_probe_extracts_size_and_range_support() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/disk.iso"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Length", "10000")
                    .insert_header("Accept-Ranges", "bytes"),
            )
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let meta = client
            .probe(&format!("{}/disk.iso", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(meta.total_size, Some(10000));
        assert!(meta.accepts_ranges);
        assert_eq!(meta.suggested_filename, None);
    }

    #[tokio::test]
    async fn test_probe_reports_unknown_size_as_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/stream"))
            .respond_with(ResponseTemplate::new(200).insert_header("Content-Length", "0"))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let meta = client
            .probe(&format!("{}/stream", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(meta.total_size, None, "zero Content-Length means unsized");
        assert!(!meta.accepts_ranges);
    }

    #[tokio::test]
    async fn test_probe_extracts_content_disposition_filename() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/dl"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Length", "5")
                    .insert_header("Content-Disposition", r#"attachment; filename="real.iso""#),
            )
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let meta = client
            .probe(&format!("{}/dl", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(meta.suggested_filename, Some("real.iso".to_string()));
    }

    #[tokio::test]
    async fn test_probe_404_surfaces_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let result = client.probe(&format!("{}/gone", mock_server.uri())).await;

        match result {
            Err(TransferError::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("Expected HttpStatus(404), got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_open_stream_attaches_range_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/disk.iso"))
            .and(header("Range", "bytes=4000-"))
            .respond_with(
                ResponseTemplate::new(206).set_body_bytes(vec![7u8; 6000]),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let stream = client
            .open_stream(&format!("{}/disk.iso", mock_server.uri()), 4000)
            .await
            .unwrap();

        assert!(stream.is_partial());
        assert_eq!(stream.content_length(), Some(6000));
    }

    #[tokio::test]
    async fn test_open_stream_without_offset_sends_no_range() {
        let mock_server = MockServer::start().await;

        // A fresh transfer must not send Range at all; some servers answer
        // `bytes=0-` with 206 and that path is not a resume.
        Mock::given(method("GET"))
            .and(path("/file.bin"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"content"))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let stream = client
            .open_stream(&format!("{}/file.bin", mock_server.uri()), 0)
            .await
            .unwrap();
        assert!(!stream.is_partial());

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(
            !requests[0].headers.contains_key("Range"),
            "offset 0 must not attach a Range header"
        );
    }

    #[tokio::test]
    async fn test_stream_yields_body_bytes() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/file.bin"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"streamed content"))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let stream = client
            .open_stream(&format!("{}/file.bin", mock_server.uri()), 0)
            .await
            .unwrap();

        let mut body = Vec::new();
        let mut chunks = stream.into_bytes_stream();
        while let Some(chunk) = chunks.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(body, b"streamed content");
    }

    #[tokio::test]
    async fn test_requests_carry_browser_header_set() {
        let mock_server = MockServer::start().await;

        // wiremock's `header` exact matcher splits comma-containing values,
        // and the UA contains "(KHTML, like Gecko)" — so match nothing here
        // and inspect the received request instead.
        Mock::given(method("HEAD"))
            .and(path("/ua-check"))
            .respond_with(ResponseTemplate::new(200).insert_header("Content-Length", "1"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let result = client
            .probe(&format!("{}/ua-check", mock_server.uri()))
            .await;
        assert!(result.is_ok(), "browser UA must be attached: {result:?}");

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let ua = requests[0]
            .headers
            .get("User-Agent")
            .and_then(|v| v.to_str().ok());
        assert_eq!(
            ua,
            Some(crate::headers::BROWSER_USER_AGENT),
            "browser UA must be attached"
        );
    }

    #[test]
    fn test_connection_failure_maps_to_network_error() {
        // Unroutable port on localhost: connection refused.
        let client = HttpClient::new();
        let result = tokio_test::block_on(client.probe("http://127.0.0.1:1/missing"));
        assert!(
            matches!(
                result,
                Err(TransferError::Network { .. } | TransferError::Timeout { .. })
            ),
            "Expected network-class error, got: {result:?}"
        );
    }
}
