//! AWS IMDSv2 session token cache.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::client::MetadataClient;
use crate::error::MetadataError;

/// AWS IMDSv2 token endpoint path.
pub(crate) const TOKEN_PATH: &str = "/latest/api/token";

/// Token TTL header name.
const TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";

#[derive(Debug)]
struct Token {
    value: String,
    issued_at: Instant,
}

/// Acquires the IMDSv2 token and reuses it until it nears expiry.
///
/// Holding the lock across the PUT means concurrent callers wait for one
/// acquisition instead of each requesting their own token.
#[derive(Debug)]
pub struct TokenManager {
    client: MetadataClient,
    ttl: Duration,
    safety_margin: Duration,
    current: Mutex<Option<Token>>,
}

impl TokenManager {
    pub fn new(client: MetadataClient, ttl: Duration, safety_margin: Duration) -> Self {
        Self {
            client,
            ttl,
            safety_margin,
            current: Mutex::new(None),
        }
    }

    /// Return the cached token, acquiring a new one if none is valid.
    pub async fn get_token(&self) -> Result<String, MetadataError> {
        let mut current = self.current.lock().await;
        if let Some(token) = current.as_ref() {
            if self.is_valid(token) {
                return Ok(token.value.clone());
            }
            debug!("IMDSv2 token expired, requesting a new one");
        }
        *current = None;

        let ttl = self.ttl.as_secs().to_string();
        let body = self
            .client
            .put(TOKEN_PATH, &[(TOKEN_TTL_HEADER, ttl.as_str())])
            .await
            .map_err(|err| {
                warn!("IMDSv2 token request failed: {}", err);
                MetadataError::Token(Box::new(err))
            })?;

        let value = body.trim().to_string();
        *current = Some(Token {
            value: value.clone(),
            issued_at: Instant::now(),
        });
        Ok(value)
    }

    /// Drop `token` from the cache so the next call acquires a fresh one.
    ///
    /// A newer token acquired by another caller in the meantime is kept.
    pub async fn invalidate(&self, token: &str) {
        let mut current = self.current.lock().await;
        if current.as_ref().is_some_and(|cached| cached.value == token) {
            *current = None;
            debug!("IMDSv2 token invalidated");
        }
    }

    /// Whether a token is currently cached and valid.
    pub async fn has_valid_token(&self) -> bool {
        self.current
            .lock()
            .await
            .as_ref()
            .is_some_and(|token| self.is_valid(token))
    }

    fn is_valid(&self, token: &Token) -> bool {
        token.issued_at.elapsed() < self.ttl.saturating_sub(self.safety_margin)
    }
}
