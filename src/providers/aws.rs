//! AWS IMDSv2 metadata implementation.

use tracing::{debug, warn};

use super::{first_line, listing_entries};
use crate::client::MetadataClient;
use crate::error::{MetadataError, UnavailableError};
use crate::instance::{InstanceMetadata, NetworkInterface};
use crate::platform::Platform;
use crate::token::TokenManager;

/// AWS metadata base path.
const METADATA_PATH: &str = "/latest/meta-data";

const INSTANCE_ID: &str = "instance-id";
const AVAILABILITY_ZONE: &str = "placement/availability-zone";
const INSTANCE_TYPE: &str = "instance-type";
const MACS: &str = "network/interfaces/macs/";

/// Token header name for requests.
const TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";

/// Client for the AWS instance metadata service.
#[derive(Debug)]
pub struct AwsProvider {
    client: MetadataClient,
    tokens: TokenManager,
}

impl AwsProvider {
    pub fn new(client: MetadataClient, tokens: TokenManager) -> Self {
        Self { client, tokens }
    }

    /// The session token cache used by this provider.
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Probe AWS metadata service to check if we're running on AWS.
    ///
    /// Only a 200 from `instance-id` counts as AWS.
    pub async fn probe(&self) -> Result<(), MetadataError> {
        let token = self.tokens.get_token().await?;
        let path = format!("{}/{}", METADATA_PATH, INSTANCE_ID);
        if let Err(err) = self.client.get_ok(&path, &[(TOKEN_HEADER, token.as_str())]).await {
            self.tokens.invalidate(&token).await;
            return Err(err);
        }
        Ok(())
    }

    /// Fetch the instance attributes and network interfaces.
    pub async fn fetch(&self) -> Result<InstanceMetadata, UnavailableError> {
        // A failed acquisition leaves nothing cached.
        let token = self.tokens.get_token().await.map_err(|err| {
            warn!("AWS metadata fetch failed: {}", err);
            UnavailableError::from(err)
        })?;

        let instance_id = self.get_required(&token, INSTANCE_ID).await?;
        let availability_zone = self.get_required(&token, AVAILABILITY_ZONE).await?;
        let machine_type = self.get_required(&token, INSTANCE_TYPE).await?;
        let network_interfaces = self.fetch_network_interfaces(&token).await?;

        Ok(InstanceMetadata {
            platform: Platform::Aws,
            instance_id,
            region: region_from_zone(&availability_zone),
            machine_type,
            network_interfaces,
        })
    }

    async fn fetch_network_interfaces(
        &self,
        token: &str,
    ) -> Result<Vec<NetworkInterface>, UnavailableError> {
        let macs = self.get_required(token, MACS).await?;

        let mut interfaces = Vec::new();
        for mac in listing_entries(&macs) {
            let base = format!("{}{}", MACS, mac);

            let local_ipv4s = format!("{}/local-ipv4s", base);
            let Some(private_ip) = self.get_optional(token, &local_ipv4s).await else {
                warn!("Skipping interface {}: no local-ipv4s", mac);
                continue;
            };
            let public_ip = self.get_optional(token, &format!("{}/public-ipv4s", base)).await;
            let vpc_id = self.get_optional(token, &format!("{}/vpc-id", base)).await;

            interfaces.push(NetworkInterface {
                private_ip: Some(private_ip),
                public_ip,
                network: vpc_id,
            });
        }
        Ok(interfaces)
    }

    /// Mandatory attribute: any failure drops the token and aborts the fetch.
    async fn get_required(&self, token: &str, path: &str) -> Result<String, UnavailableError> {
        match self.get(token, path).await {
            Ok(value) => Ok(value.trim().to_string()),
            Err(err) => {
                warn!("IMDS request failed: path={} error={}", path, err);
                self.tokens.invalidate(token).await;
                Err(err.into())
            }
        }
    }

    /// Optional attribute: failures and empty values become `None`.
    async fn get_optional(&self, token: &str, path: &str) -> Option<String> {
        match self.get(token, path).await {
            Ok(value) => Some(first_line(&value)).filter(|value| !value.is_empty()),
            Err(err) => {
                debug!("IMDS attribute unavailable: path={} error={}", path, err);
                if err.is_unauthorized() {
                    self.tokens.invalidate(token).await;
                }
                None
            }
        }
    }

    async fn get(&self, token: &str, path: &str) -> Result<String, MetadataError> {
        let path = format!("{}/{}", METADATA_PATH, path);
        self.client.get(&path, &[(TOKEN_HEADER, token)]).await
    }
}

/// Region of an availability zone: the zone without its trailing letter.
pub fn region_from_zone(zone: &str) -> String {
    let mut chars = zone.chars();
    chars.next_back();
    chars.as_str().to_string()
}
