//! Normalized instance metadata records.

use serde::Serialize;

use crate::platform::Platform;

/// One network interface attached to the instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkInterface {
    pub private_ip: Option<String>,
    pub public_ip: Option<String>,
    /// VPC id on AWS, short network name on GCP.
    pub network: Option<String>,
}

/// Attributes of the running instance, assembled fresh on every fetch.
///
/// `platform` is always [`Platform::Aws`] or [`Platform::Gcp`]. Interfaces
/// keep the order the metadata service listed them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceMetadata {
    #[serde(rename = "cloud_platform")]
    pub platform: Platform,
    pub instance_id: String,
    pub region: String,
    pub machine_type: String,
    pub network_interfaces: Vec<NetworkInterface>,
}
