//! GCP metadata implementation.

use tracing::{debug, warn};

use super::listing_entries;
use crate::client::MetadataClient;
use crate::error::{MetadataError, UnavailableError};
use crate::instance::{InstanceMetadata, NetworkInterface};
use crate::platform::Platform;

/// GCP metadata service base path.
const METADATA_PATH: &str = "/computeMetadata/v1";

const INSTANCE_ID: &str = "instance/id";
const ZONE: &str = "instance/zone";
const MACHINE_TYPE: &str = "instance/machine-type";
const NETWORK_INTERFACES: &str = "instance/network-interfaces/";

/// Required header for GCP metadata requests.
const METADATA_FLAVOR_HEADER: &str = "Metadata-Flavor";

/// Required header value for GCP metadata requests.
const METADATA_FLAVOR_VALUE: &str = "Google";

/// Client for the GCP metadata server.
#[derive(Debug, Clone)]
pub struct GcpProvider {
    client: MetadataClient,
}

impl GcpProvider {
    pub fn new(client: MetadataClient) -> Self {
        Self { client }
    }

    /// Probe GCP metadata service to check if we're running on GCP.
    ///
    /// Only a 200 from `instance/id` counts as GCP.
    pub async fn probe(&self) -> Result<(), MetadataError> {
        let path = format!("{}/{}", METADATA_PATH, INSTANCE_ID);
        self.client
            .get_ok(&path, &[(METADATA_FLAVOR_HEADER, METADATA_FLAVOR_VALUE)])
            .await
            .map(|_| ())
    }

    /// Fetch the instance attributes and network interfaces.
    pub async fn fetch(&self) -> Result<InstanceMetadata, UnavailableError> {
        let instance_id = self.get_required(INSTANCE_ID).await?;
        let zone = self.get_required(ZONE).await?;
        let machine_type = self.get_required(MACHINE_TYPE).await?;
        let network_interfaces = self.fetch_network_interfaces().await?;

        Ok(InstanceMetadata {
            platform: Platform::Gcp,
            instance_id,
            region: short_name(&zone).to_string(),
            machine_type: short_name(&machine_type).to_string(),
            network_interfaces,
        })
    }

    async fn fetch_network_interfaces(&self) -> Result<Vec<NetworkInterface>, UnavailableError> {
        let indices = self.get_required(NETWORK_INTERFACES).await?;

        let mut interfaces = Vec::new();
        for index in listing_entries(&indices) {
            let base = format!("{}{}", NETWORK_INTERFACES, index);

            let private_ip = self.get_optional(&format!("{}/ip", base)).await;
            let network = self
                .get_optional(&format!("{}/network", base))
                .await
                .map(|path| short_name(&path).to_string());
            let public_ip = self
                .get_optional(&format!("{}/access-configs/0/external-ip", base))
                .await;

            interfaces.push(NetworkInterface {
                private_ip,
                public_ip,
                network,
            });
        }
        Ok(interfaces)
    }

    async fn get_required(&self, path: &str) -> Result<String, UnavailableError> {
        self.get(path).await.map_err(|err| {
            warn!("GCP metadata request failed: path={} error={}", path, err);
            UnavailableError::from(err)
        })
    }

    async fn get_optional(&self, path: &str) -> Option<String> {
        match self.get(path).await {
            Ok(value) => Some(value).filter(|value| !value.is_empty()),
            Err(err) => {
                debug!("GCP attribute unavailable: path={} error={}", path, err);
                None
            }
        }
    }

    async fn get(&self, path: &str) -> Result<String, MetadataError> {
        let path = format!("{}/{}", METADATA_PATH, path);
        let value = self
            .client
            .get(&path, &[(METADATA_FLAVOR_HEADER, METADATA_FLAVOR_VALUE)])
            .await?;
        Ok(value.trim().to_string())
    }
}

/// Last `/`-delimited segment of a fully-qualified GCP resource path.
pub fn short_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("projects/123/zones/us-east1-b"), "us-east1-b");
        assert_eq!(short_name("projects/9/machineTypes/e2-small"), "e2-small");
        assert_eq!(short_name("projects/9/networks/default"), "default");
        assert_eq!(short_name("us-east1-b"), "us-east1-b");
        assert_eq!(short_name(""), "");
    }

    #[test]
    fn test_url_construction() {
        let base = "http://localhost:8080";
        let url = format!("{}{}/{}{}/ip", base, METADATA_PATH, NETWORK_INTERFACES, "0");
        assert_eq!(
            url,
            "http://localhost:8080/computeMetadata/v1/instance/network-interfaces/0/ip"
        );
    }
}
