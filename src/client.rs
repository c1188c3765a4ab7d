//! HTTP client wrapper for metadata requests.

use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode};
use tracing::trace;

use crate::error::MetadataError;

/// HTTP client wrapper for metadata service requests.
///
/// Every request is bounded by the connect and read timeouts given at
/// construction and is attempted exactly once.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    inner: Client,
    base_url: String,
    max_size: Option<usize>,
}

impl MetadataClient {
    /// Create a new metadata client with the specified timeout and base URL.
    ///
    /// The timeout applies to the connect phase and the read phase separately.
    pub fn new(
        timeout: Duration,
        base_url: &str,
        max_size: Option<usize>,
    ) -> Result<Self, MetadataError> {
        let inner = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .danger_accept_invalid_certs(false)
            .build()?;
        Ok(Self {
            inner,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_size,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and return the body of a 2xx response.
    pub async fn get(
        &self,
        path: &str,
        headers: &[(&str, &str)],
    ) -> Result<String, MetadataError> {
        let response = self.send(Method::GET, path, headers).await?;
        self.read_text(response).await
    }

    /// GET `path` and return the body only if the status is exactly 200.
    pub async fn get_ok(
        &self,
        path: &str,
        headers: &[(&str, &str)],
    ) -> Result<String, MetadataError> {
        let response = self.send(Method::GET, path, headers).await?;
        if response.status() != StatusCode::OK {
            return Err(MetadataError::Http(response.status().as_u16()));
        }
        self.read_text(response).await
    }

    /// PUT `path` with an empty body and return the body of a 2xx response.
    pub async fn put(
        &self,
        path: &str,
        headers: &[(&str, &str)],
    ) -> Result<String, MetadataError> {
        let response = self.send(Method::PUT, path, headers).await?;
        self.read_text(response).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        headers: &[(&str, &str)],
    ) -> Result<Response, MetadataError> {
        let url = format!("{}{}", self.base_url, path);
        trace!("{} {}", method, url);

        let mut request = self.inner.request(method, &url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MetadataError::NotFound);
        }
        if !status.is_success() {
            return Err(MetadataError::Http(status.as_u16()));
        }
        Ok(response)
    }

    async fn read_text(&self, response: Response) -> Result<String, MetadataError> {
        let body = read_body_limited(response, self.max_size).await?;
        String::from_utf8(body).map_err(|_| MetadataError::Utf8)
    }
}

/// Read response body with an optional size limit.
///
/// If `max_size` is `Some`, this will:
/// 1. Check the `Content-Length` header and fail early if it exceeds the limit
/// 2. Read the body with a pre-allocated capped buffer, aborting immediately if exceeded
pub async fn read_body_limited(
    response: Response,
    max_size: Option<usize>,
) -> Result<Vec<u8>, MetadataError> {
    let Some(max_size) = max_size else {
        return Ok(response.bytes().await?.to_vec());
    };

    if let Some(content_length) = response.content_length() {
        if content_length as usize > max_size {
            return Err(MetadataError::TooLarge(content_length as usize, max_size));
        }
    }

    let capacity = response
        .content_length()
        .map(|cl| (cl as usize).min(max_size))
        .unwrap_or(max_size.min(8192));
    let mut body = Vec::with_capacity(capacity);
    let mut total_read = 0usize;

    let mut stream = response;
    while let Some(chunk) = stream.chunk().await? {
        if total_read.saturating_add(chunk.len()) > max_size {
            return Err(MetadataError::TooLarge(
                total_read.saturating_add(chunk.len()),
                max_size,
            ));
        }
        total_read += chunk.len();
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::DEFAULT_TIMEOUT;

    fn client(base_url: &str, max_size: Option<usize>) -> MetadataClient {
        MetadataClient::new(DEFAULT_TIMEOUT, base_url, max_size).unwrap()
    }

    #[test]
    fn test_client_strips_trailing_slash() {
        let client = client("http://localhost:8080/", None);
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_get_sends_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/value"))
            .and(header("X-Test", "yes"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .expect(1)
            .mount(&server)
            .await;

        let body = client(&server.uri(), None)
            .get("/value", &[("X-Test", "yes")])
            .await
            .unwrap();
        assert_eq!(body, "hello");
    }

    #[tokio::test]
    async fn test_put() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("tok"))
            .mount(&server)
            .await;

        let body = client(&server.uri(), None).put("/token", &[]).await.unwrap();
        assert_eq!(body, "tok");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forbidden"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = client(&server.uri(), None);
        assert!(matches!(
            client.get("/missing", &[]).await,
            Err(MetadataError::NotFound)
        ));
        assert!(matches!(
            client.get("/forbidden", &[]).await,
            Err(MetadataError::Http(403))
        ));
    }

    #[tokio::test]
    async fn test_get_ok_requires_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/empty"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/value"))
            .respond_with(ResponseTemplate::new(200).set_body_string("v"))
            .mount(&server)
            .await;

        let client = client(&server.uri(), None);
        assert!(client.get("/empty", &[]).await.is_ok());
        assert!(matches!(
            client.get_ok("/empty", &[]).await,
            Err(MetadataError::Http(204))
        ));
        assert_eq!(client.get_ok("/value", &[]).await.unwrap(), "v");
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = MetadataClient::new(Duration::from_millis(50), &server.uri(), None).unwrap();
        assert!(matches!(
            client.get("/slow", &[]).await,
            Err(MetadataError::Timeout)
        ));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Nothing listens on port 1.
        let client = client("http://127.0.0.1:1", None);
        assert!(matches!(
            client.get("/", &[]).await,
            Err(MetadataError::Request(_))
        ));
    }

    #[tokio::test]
    async fn test_body_too_large() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/big"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(100)))
            .mount(&server)
            .await;

        let result = client(&server.uri(), Some(10)).get("/big", &[]).await;
        assert!(matches!(result, Err(MetadataError::TooLarge(100, 10))));
    }

    #[tokio::test]
    async fn test_invalid_utf8() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bytes"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xfe]))
            .mount(&server)
            .await;

        let result = client(&server.uri(), None).get("/bytes", &[]).await;
        assert!(matches!(result, Err(MetadataError::Utf8)));
    }
}
