//! Detect the cloud platform a host runs on and fetch normalized instance metadata.
//!
//! Detection probes the GCP metadata server first and the AWS instance
//! metadata service (IMDSv2) second. The result is cached for the lifetime of
//! the [`CloudMetadata`] value, as is the AWS session token.
//!
//! # Example
//!
//! ```ignore
//! use instance_metadata::{CloudMetadata, MetadataConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let metadata = CloudMetadata::new(MetadataConfig::default())?;
//!
//!     match metadata.get_metadata().await {
//!         Ok(instance) => println!("{}", serde_json::to_string(&instance)?),
//!         Err(unavailable) => eprintln!("{}", unavailable),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Platform-Specific Behavior
//!
//! | Platform | Region source | Machine type | Interface `network` |
//! |----------|---------------|--------------|---------------------|
//! | AWS | Availability zone minus trailing letter | `instance-type` | VPC id |
//! | GCP | Short name of `instance/zone` | Short name of `machine-type` | Short network name |

mod client;
mod config;
mod detector;
mod error;
mod instance;
mod metadata;
mod platform;
mod providers;
mod token;

pub use client::MetadataClient;
pub use config::{
    MetadataConfig, AWS_BASE_URL, DEFAULT_MAX_RESPONSE_SIZE, DEFAULT_TIMEOUT,
    DEFAULT_TOKEN_SAFETY_MARGIN, DEFAULT_TOKEN_TTL, GCP_BASE_URL,
};
pub use detector::PlatformDetector;
pub use error::{MetadataError, UnavailableError, UNAVAILABLE_MESSAGE};
pub use instance::{InstanceMetadata, NetworkInterface};
pub use metadata::CloudMetadata;
pub use platform::Platform;
pub use providers::aws::region_from_zone;
pub use providers::gcp::short_name;
pub use providers::{AwsProvider, GcpProvider};
pub use token::TokenManager;
