//! CloudMetadata struct and core implementation.

use tracing::debug;

use crate::client::MetadataClient;
use crate::config::MetadataConfig;
use crate::detector::PlatformDetector;
use crate::error::{MetadataError, UnavailableError};
use crate::instance::InstanceMetadata;
use crate::platform::Platform;
use crate::providers::{AwsProvider, GcpProvider};
use crate::token::TokenManager;

/// Main interface for discovering instance metadata.
///
/// Holds the discovery state: the detected platform and the AWS session
/// token. Build one per process and share it (for example in an `Arc`).
///
/// # Example
///
/// ```ignore
/// use instance_metadata::{CloudMetadata, MetadataConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let metadata = CloudMetadata::new(MetadataConfig::default())?;
///     let instance = metadata.get_metadata().await?;
///     println!("{} in {}", instance.instance_id, instance.region);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct CloudMetadata {
    detector: PlatformDetector,
    aws: AwsProvider,
    gcp: GcpProvider,
}

impl CloudMetadata {
    /// Create discovery state that detects the platform on first use.
    pub fn new(config: MetadataConfig) -> Result<Self, MetadataError> {
        Self::with_detector(config, PlatformDetector::new())
    }

    /// Create discovery state pinned to `platform`; no probing happens.
    pub fn with_platform(
        config: MetadataConfig,
        platform: Platform,
    ) -> Result<Self, MetadataError> {
        Self::with_detector(config, PlatformDetector::resolved(platform))
    }

    fn with_detector(
        config: MetadataConfig,
        detector: PlatformDetector,
    ) -> Result<Self, MetadataError> {
        let aws_client =
            MetadataClient::new(config.timeout, &config.aws_base_url, config.max_response_size)?;
        let gcp_client =
            MetadataClient::new(config.timeout, &config.gcp_base_url, config.max_response_size)?;
        let tokens = TokenManager::new(
            aws_client.clone(),
            config.token_ttl,
            config.token_safety_margin,
        );

        Ok(Self {
            detector,
            aws: AwsProvider::new(aws_client, tokens),
            gcp: GcpProvider::new(gcp_client),
        })
    }

    /// The active platform, detecting it on the first call.
    pub async fn platform(&self) -> Platform {
        self.detector.detect(&self.gcp, &self.aws).await
    }

    /// The platform if detection has already run.
    pub fn cached_platform(&self) -> Option<Platform> {
        self.detector.cached()
    }

    /// Fetch normalized metadata from the detected platform.
    ///
    /// # Errors
    ///
    /// Returns [`UnavailableError`] when no supported platform was detected
    /// or a mandatory attribute could not be fetched.
    pub async fn get_metadata(&self) -> Result<InstanceMetadata, UnavailableError> {
        match self.platform().await {
            Platform::Aws => self.aws.fetch().await,
            Platform::Gcp => self.gcp.fetch().await,
            Platform::None => {
                debug!("No cloud platform detected, metadata unavailable");
                Err(UnavailableError::not_detected())
            }
        }
    }

    /// The AWS provider, for access to its token cache.
    pub fn aws(&self) -> &AwsProvider {
        &self.aws
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_undetected() {
        let metadata = CloudMetadata::new(MetadataConfig::default()).unwrap();
        assert_eq!(metadata.cached_platform(), None);
    }

    #[test]
    fn test_with_platform() {
        let metadata =
            CloudMetadata::with_platform(MetadataConfig::default(), Platform::Gcp).unwrap();
        assert_eq!(metadata.cached_platform(), Some(Platform::Gcp));
    }

    #[tokio::test]
    async fn test_pinned_none_is_unavailable() {
        let config = MetadataConfig::default().with_base_url("http://127.0.0.1:1");
        let metadata = CloudMetadata::with_platform(config, Platform::None).unwrap();
        let err = metadata.get_metadata().await.unwrap_err();
        assert!(err.cause().is_none());
    }
}
