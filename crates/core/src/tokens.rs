//! Shared-secret comparison.
//!
//! Both sides are hashed to fixed-length digests before comparing, so the
//! comparison time does not depend on where the inputs first differ or on
//! their lengths.

use log::error;
use sha2::{Digest, Sha256};

use crate::errors::{Error, Result};

/// Checks `provided` against the configured secret.
///
/// `what` names the secret for the misconfiguration log line only.
pub fn verify_shared_secret(
    what: &str,
    expected: Option<&str>,
    provided: Option<&str>,
) -> Result<()> {
    let expected = match expected {
        Some(secret) if !secret.is_empty() => secret,
        _ => {
            error!("[CRITICAL] {} is not configured", what);
            return Err(Error::Unconfigured(format!("{} not configured", what)));
        }
    };
    match provided {
        Some(candidate) if !candidate.is_empty() && digests_match(expected, candidate) => Ok(()),
        _ => Err(Error::Unauthorized),
    }
}

fn digests_match(a: &str, b: &str) -> bool {
    let a = Sha256::digest(a.as_bytes());
    let b = Sha256::digest(b.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_token_is_accepted() {
        assert!(verify_shared_secret("WEBHOOK_TOKEN", Some("s3cret"), Some("s3cret")).is_ok());
    }

    #[test]
    fn test_wrong_or_missing_token_is_unauthorized() {
        for provided in [None, Some(""), Some("s3cre"), Some("s3cret ")] {
            let err = verify_shared_secret("WEBHOOK_TOKEN", Some("s3cret"), provided).unwrap_err();
            assert!(matches!(err, Error::Unauthorized));
        }
    }

    #[test]
    fn test_missing_secret_is_unconfigured() {
        let err = verify_shared_secret("WEBHOOK_TOKEN", None, Some("x")).unwrap_err();
        assert!(matches!(err, Error::Unconfigured(_)));
        let err = verify_shared_secret("WEBHOOK_TOKEN", Some(""), Some("x")).unwrap_err();
        assert!(matches!(err, Error::Unconfigured(_)));
    }
}
