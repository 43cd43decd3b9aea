//! Committer identities.
//!
//! A committer is a display name plus an email address as recorded in the
//! Git log. The same person usually appears many times, sometimes with a
//! different email casing, so identities are folded into a
//! [`CommitterRegistry`] before anything is fetched. The email, normalized
//! and hashed, is the [`fingerprint`] used to address the person's avatar.

pub mod committer;
pub mod fingerprint;
pub mod registry;

pub use committer::CommitterIdentity;
pub use fingerprint::fingerprint;
pub use registry::{build_unique_set, CommitterRegistry, IdentityMatch};
