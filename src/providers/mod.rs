//! Platform-specific metadata protocols.

pub mod aws;
pub mod gcp;

pub use aws::AwsProvider;
pub use gcp::GcpProvider;

/// Entries of a newline-delimited listing such as a MAC or interface index
/// directory, with blank lines dropped and a trailing `/` stripped.
pub(crate) fn listing_entries(body: &str) -> impl Iterator<Item = &str> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.strip_suffix('/').unwrap_or(line))
}

/// First line of a possibly multi-valued attribute.
pub(crate) fn first_line(value: &str) -> String {
    value.lines().next().unwrap_or_default().trim().to_string()
}
