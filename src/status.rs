//! Query status codes.

use serde::Serialize;
use std::fmt;

/// Status of a geolocation query.
///
/// Every [`crate::GeoRecord`] carries exactly one status. Only [`Status::Ok`]
/// records carry decoded columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Reader has not been initialized, or was closed
    NotInitialized,
    /// Reader is loading or reloading its database
    Initializing,
    /// Database file no longer exists at its path
    DatabaseNotFound,
    /// Input is not an IPv4 or IPv6 address
    InvalidIpAddress,
    /// IPv6 query against an IPv4-only database
    Ipv6NotSupported,
    /// No range in the database covers the address
    IpAddressNotFound,
    /// Lookup succeeded
    Ok,
}

impl Status {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NotInitialized => "NOT_INITIALIZED",
            Status::Initializing => "INITIALIZING",
            Status::DatabaseNotFound => "DATABASE_NOT_FOUND",
            Status::InvalidIpAddress => "INVALID_IP_ADDRESS",
            Status::Ipv6NotSupported => "IPV6_NOT_SUPPORTED",
            Status::IpAddressNotFound => "IP_ADDRESS_NOT_FOUND",
            Status::Ok => "OK",
        }
    }

    /// Whether the record carries decoded data.
    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
