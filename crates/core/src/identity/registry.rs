//! Deduplicating registry of committers.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::CommitterIdentity;
use crate::events::{Event, EventSink};
use crate::git::LogEntry;

/// Rule deciding whether a new log entry names a committer already held.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMatch {
    /// Same email ignoring case, or same name exactly. Checked pairwise
    /// against every member, so the outcome can depend on encounter order.
    #[default]
    EmailOrName,
    /// Same email ignoring case only.
    EmailOnly,
}

/// Sorted set of unique committers built from log entries.
///
/// The first entry seen for a person wins; later equivalents are discarded
/// and never replace it. Entries are never removed.
pub struct CommitterRegistry {
    committers: BTreeSet<CommitterIdentity>,
    rule: IdentityMatch,
    added: usize,
    sink: Arc<dyn EventSink>,
}

impl CommitterRegistry {
    pub fn with_sink(rule: IdentityMatch, sink: Arc<dyn EventSink>) -> Self {
        Self {
            committers: BTreeSet::new(),
            rule,
            added: 0,
            sink,
        }
    }

    /// Offer one committer to the registry. Returns `true` if it was new.
    pub fn insert(&mut self, name: &str, email: &str) -> bool {
        let candidate = CommitterIdentity::new(name, email);
        let known = match self.rule {
            IdentityMatch::EmailOrName => self
                .committers
                .iter()
                .any(|member| member.is_same_committer(&candidate)),
            IdentityMatch::EmailOnly => self.committers.contains(&candidate),
        };
        let added = !known;
        self.sink.record(&Event::CommitterSeen {
            committer: &candidate,
            added,
        });
        if added {
            self.committers.insert(candidate);
            self.added += 1;
        }
        added
    }

    /// Offer every entry in order. Returns how many were new.
    pub fn extend_from<'a, I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = LogEntry<'a>>,
    {
        let before = self.added;
        for entry in entries {
            self.insert(entry.name, entry.email);
        }
        let added = self.added - before;
        self.sink.record(&Event::RegistryBuilt { added });
        added
    }

    /// The committers, in case-insensitive email order.
    pub fn into_set(self) -> BTreeSet<CommitterIdentity> {
        self.committers
    }
}

/// Fold `entries` into a sorted set of unique committers.
///
/// Returns the set together with the number of entries that were genuinely
/// added.
pub fn build_unique_set<'a, I>(
    entries: I,
    rule: IdentityMatch,
    sink: Arc<dyn EventSink>,
) -> (BTreeSet<CommitterIdentity>, usize)
where
    I: IntoIterator<Item = LogEntry<'a>>,
{
    let mut registry = CommitterRegistry::with_sink(rule, sink);
    let added = registry.extend_from(entries);
    (registry.into_set(), added)
}
