//! Diagnostic events emitted by the registry and the fetch orchestrator.
//!
//! Business logic never logs directly; it reports through an injected
//! [`EventSink`]. The default [`TracingSink`] forwards every event to
//! `tracing`, [`NullSink`] discards them.

use std::fmt;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::identity::CommitterIdentity;

/// A single diagnostic event.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    /// A parsed log entry was offered to the registry.
    CommitterSeen {
        committer: &'a CommitterIdentity,
        added: bool,
    },
    /// The registry finished consuming its input.
    RegistryBuilt { added: usize },
    /// A request for one committer is about to be sent.
    FetchStarted {
        committer: &'a CommitterIdentity,
        url: &'a str,
    },
    /// An image was written to disk.
    Saved {
        committer: &'a CommitterIdentity,
        path: &'a Path,
    },
    /// The image service has no image for this committer.
    NotFound { committer: &'a CommitterIdentity },
    /// Fetching or persisting failed for this committer.
    Failed {
        committer: &'a CommitterIdentity,
        cause: &'a str,
    },
    /// Every task of a run has finished.
    RunCompleted {
        saved: usize,
        not_found: usize,
        failed: usize,
    },
}

impl fmt::Display for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommitterSeen { committer, added } => {
                write!(f, "seen {} (added={})", committer, added)
            }
            Self::RegistryBuilt { added } => write!(f, "registry built ({} added)", added),
            Self::FetchStarted { committer, url } => write!(f, "fetching {} from {}", committer, url),
            Self::Saved { committer, path } => {
                write!(f, "saved {} => {}", committer, path.display())
            }
            Self::NotFound { committer } => write!(f, "no image for {}", committer),
            Self::Failed { committer, cause } => write!(f, "failed {}: {}", committer, cause),
            Self::RunCompleted {
                saved,
                not_found,
                failed,
            } => write!(
                f,
                "run completed (saved={}, not_found={}, failed={})",
                saved, not_found, failed
            ),
        }
    }
}

/// Passive observer for [`Event`]s.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &Event<'_>);
}

/// Forwards events to `tracing` at a level matching their severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &Event<'_>) {
        match *event {
            Event::CommitterSeen { committer, added } => {
                debug!(committer = %committer, added, "read committer from log");
            }
            Event::RegistryBuilt { added } => {
                info!(count = added, "added a total of {} committers", added);
            }
            Event::FetchStarted { committer, url } => {
                debug!(committer = %committer, url, "requesting avatar");
            }
            Event::Saved { committer, path } => {
                info!(committer = %committer, path = %path.display(), "saved avatar");
            }
            Event::NotFound { committer } => {
                info!(committer = %committer, "no avatar registered");
            }
            Event::Failed { committer, cause } => {
                warn!(committer = %committer, error = cause, "avatar fetch failed");
            }
            Event::RunCompleted {
                saved,
                not_found,
                failed,
            } => {
                info!(saved, not_found, failed, "avatar fetch run completed");
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: &Event<'_>) {}
}
