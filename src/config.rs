//! Discovery configuration.

use std::time::Duration;

/// Default connect and read timeout for each metadata request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// AWS instance metadata service base URL (link-local address).
pub const AWS_BASE_URL: &str = "http://169.254.169.254";

/// GCP metadata server base URL.
pub const GCP_BASE_URL: &str = "http://metadata.google.internal";

/// Maximum IMDSv2 token lifetime accepted by AWS.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(21600);

/// A cached token is treated as expired this long before its nominal TTL.
pub const DEFAULT_TOKEN_SAFETY_MARGIN: Duration = Duration::from_secs(300);

/// Default upper bound on a single metadata response body.
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 64 * 1024;

/// Settings shared by the detector, the providers and the token manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataConfig {
    pub aws_base_url: String,
    pub gcp_base_url: String,
    /// Applied separately to the connect and the read phase of every request.
    pub timeout: Duration,
    pub token_ttl: Duration,
    pub token_safety_margin: Duration,
    /// `None` disables the limit.
    pub max_response_size: Option<usize>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            aws_base_url: AWS_BASE_URL.to_string(),
            gcp_base_url: GCP_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            token_ttl: DEFAULT_TOKEN_TTL,
            token_safety_margin: DEFAULT_TOKEN_SAFETY_MARGIN,
            max_response_size: Some(DEFAULT_MAX_RESPONSE_SIZE),
        }
    }
}

impl MetadataConfig {
    /// Point both platforms at the same base URL (for testing with a mock server).
    pub fn with_base_url(self, base_url: &str) -> Self {
        self.with_aws_base_url(base_url).with_gcp_base_url(base_url)
    }

    pub fn with_aws_base_url(mut self, base_url: &str) -> Self {
        self.aws_base_url = base_url.to_string();
        self
    }

    pub fn with_gcp_base_url(mut self, base_url: &str) -> Self {
        self.gcp_base_url = base_url.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_token_safety_margin(mut self, margin: Duration) -> Self {
        self.token_safety_margin = margin;
        self
    }

    pub fn with_max_response_size(mut self, max_size: Option<usize>) -> Self {
        self.max_response_size = max_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MetadataConfig::default();
        assert_eq!(config.aws_base_url, "http://169.254.169.254");
        assert_eq!(config.gcp_base_url, "http://metadata.google.internal");
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(config.token_ttl, Duration::from_secs(21600));
        assert_eq!(config.token_safety_margin, Duration::from_secs(300));
        assert_eq!(config.max_response_size, Some(65536));
    }

    #[test]
    fn test_with_base_url_sets_both() {
        let config = MetadataConfig::default().with_base_url("http://localhost:8080");
        assert_eq!(config.aws_base_url, "http://localhost:8080");
        assert_eq!(config.gcp_base_url, "http://localhost:8080");
    }

    #[test]
    fn test_builder_methods() {
        let config = MetadataConfig::default()
            .with_aws_base_url("http://aws.test")
            .with_timeout(Duration::from_millis(250))
            .with_token_ttl(Duration::from_secs(60))
            .with_token_safety_margin(Duration::from_secs(10))
            .with_max_response_size(None);
        assert_eq!(config.aws_base_url, "http://aws.test");
        assert_eq!(config.gcp_base_url, GCP_BASE_URL);
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.token_ttl, Duration::from_secs(60));
        assert_eq!(config.token_safety_margin, Duration::from_secs(10));
        assert_eq!(config.max_response_size, None);
    }
}
