//! gitavatar core library.
//!
//! Reads the committers of a Git working copy, folds them into a set of
//! unique identities, and fetches one Gravatar image per identity
//! concurrently, recording failures without aborting the run.

pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod git;
pub mod gravatar;
pub mod identity;

// Re-exports for convenience.
pub use config::AppConfig;
pub use engine::{AvatarEngine, FetchReport};
pub use errors::CoreError;
pub use events::{Event, EventSink, NullSink, TracingSink};
pub use git::GitLog;
pub use gravatar::{FetchOrchestrator, FetchSummary, GravatarClient};
pub use identity::{fingerprint, CommitterIdentity, CommitterRegistry, IdentityMatch};
