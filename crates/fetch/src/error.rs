//! Fetch Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::time::Duration;

/// A fetch error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// None of these are fatal to the process: a media slot whose fetch fails
/// keeps its remote reference and is marked as a fallback.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// DNS resolution or connection establishment failed.
    #[display("unreachable: {_0}")]
    Unreachable(#[error(not(source))] String),
    /// The wall-clock budget (connect + full body) ran out.
    #[display("timed out after {}ms", _0.as_millis())]
    Timeout(#[error(not(source))] Duration),
    /// The server answered with a non-2xx status.
    #[display("bad status: {_0}")]
    BadStatus(#[error(not(source))] u16),
    /// The body is (or declares itself to be) larger than the byte ceiling.
    #[display("response exceeds the {_0} byte ceiling")]
    TooLarge(#[error(not(source))] u64),
    /// The connection dropped part way through the body.
    #[display("connection interrupted mid-transfer")]
    Interrupted,
    /// Only `http` and `https` references can be fetched.
    #[display("unsupported reference: {_0}")]
    InvalidReference(#[error(not(source))] String),
    /// The HTTP client could not be constructed.
    #[display("failed to build HTTP client")]
    Client,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Rate limiting (429) and server errors (5xx) are transient; every
    /// other status is a property of the reference itself.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unreachable(_) | Self::Timeout(_) | Self::Interrupted => true,
            Self::BadStatus(status) => *status == 429 || (500..600).contains(status),
            Self::TooLarge(_) | Self::InvalidReference(_) | Self::Client => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::Unreachable("dns".into()), true)]
    #[case(ErrorKind::Timeout(Duration::from_secs(10)), true)]
    #[case(ErrorKind::Interrupted, true)]
    #[case(ErrorKind::BadStatus(429), true)]
    #[case(ErrorKind::BadStatus(503), true)]
    #[case(ErrorKind::BadStatus(404), false)]
    #[case(ErrorKind::BadStatus(403), false)]
    #[case(ErrorKind::TooLarge(20), false)]
    #[case(ErrorKind::InvalidReference("ftp://x".into()), false)]
    fn test_retryable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorKind::Timeout(Duration::from_millis(1500)).to_string(), "timed out after 1500ms");
        assert_eq!(ErrorKind::BadStatus(404).to_string(), "bad status: 404");
        assert_eq!(ErrorKind::TooLarge(1024).to_string(), "response exceeds the 1024 byte ceiling");
    }
}
