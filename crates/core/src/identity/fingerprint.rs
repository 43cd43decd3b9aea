//! Gravatar fingerprints.
//!
//! Gravatar addresses images by the MD5 digest of the owner's email address
//! after trimming surrounding whitespace and forcing lower case.

use md5::{Digest, Md5};

use crate::errors::IdentityError;

/// Compute the 32-character lowercase hex fingerprint for `email`.
///
/// Fails with [`IdentityError::InvalidArgument`] when `email` is empty or
/// whitespace only.
pub fn fingerprint(email: &str) -> Result<String, IdentityError> {
    let normalized = email.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(IdentityError::InvalidArgument(
            "a non-empty email address is required to compute a fingerprint".into(),
        ));
    }
    Ok(hex::encode(Md5::digest(normalized.as_bytes())))
}
