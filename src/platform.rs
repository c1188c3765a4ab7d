//! Cloud platform enumeration.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Result of platform detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Amazon Web Services
    Aws,
    /// Google Cloud Platform
    Gcp,
    /// No supported metadata service answered.
    None,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Aws => write!(f, "aws"),
            Platform::Gcp => write!(f, "gcp"),
            Platform::None => write!(f, "none"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aws" => Ok(Platform::Aws),
            "gcp" => Ok(Platform::Gcp),
            _ => Err(format!("unknown platform: {} (expected aws or gcp)", s)),
        }
    }
}
