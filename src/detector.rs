//! Platform detection with a per-state cache.

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::platform::Platform;
use crate::providers::{AwsProvider, GcpProvider};

/// Resolves the platform once and remembers the answer, including
/// [`Platform::None`].
///
/// Concurrent first callers wait on the same probe sequence.
#[derive(Debug, Default)]
pub struct PlatformDetector {
    resolved: OnceCell<Platform>,
}

impl PlatformDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A detector that is already resolved to `platform` and never probes.
    pub fn resolved(platform: Platform) -> Self {
        Self {
            resolved: OnceCell::new_with(Some(platform)),
        }
    }

    /// The cached platform, if detection has run.
    pub fn cached(&self) -> Option<Platform> {
        self.resolved.get().copied()
    }

    /// Probe GCP, then AWS, and cache the first platform that answers.
    pub async fn detect(&self, gcp: &GcpProvider, aws: &AwsProvider) -> Platform {
        *self
            .resolved
            .get_or_init(|| async {
                let platform = probe(gcp, aws).await;
                info!("Detected cloud platform: {}", platform);
                platform
            })
            .await
    }
}

async fn probe(gcp: &GcpProvider, aws: &AwsProvider) -> Platform {
    match gcp.probe().await {
        Ok(()) => return Platform::Gcp,
        Err(err) => debug!("GCP metadata probe failed: {}", err),
    }
    match aws.probe().await {
        Ok(()) => return Platform::Aws,
        Err(err) => debug!("AWS metadata probe failed: {}", err),
    }
    Platform::None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_unresolved() {
        assert_eq!(PlatformDetector::new().cached(), None);
    }

    #[test]
    fn test_resolved() {
        let detector = PlatformDetector::resolved(Platform::Aws);
        assert_eq!(detector.cached(), Some(Platform::Aws));
    }
}
