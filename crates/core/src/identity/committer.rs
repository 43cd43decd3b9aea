//! The committer value type.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A person who appears in a repository's commit log.
///
/// Immutable once built. Ordering and `Eq` consider only the email address,
/// compared case-insensitively, which makes a `BTreeSet<CommitterIdentity>`
/// iterate in canonical email order. The looser "same person" rule used for
/// deduplication lives in [`is_same_committer`](Self::is_same_committer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitterIdentity {
    name: String,
    email: String,
}

impl CommitterIdentity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Display name, exactly as it appeared in the log.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Email address, exactly as it appeared in the log.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Whether `other` should be treated as the same person.
    ///
    /// True when the emails match ignoring case, or when the names match
    /// exactly. Not transitive: A and B may share a name and B and C an
    /// email while A and C match on neither.
    pub fn is_same_committer(&self, other: &CommitterIdentity) -> bool {
        self.name == other.name || self.same_email(other)
    }

    /// Whether the emails match ignoring case.
    pub fn same_email(&self, other: &CommitterIdentity) -> bool {
        compare_ignore_case(&self.email, &other.email) == Ordering::Equal
    }

    /// Whether a free-text query names this committer.
    ///
    /// Matches the name or the email ignoring case, or the exact
    /// `Name <email>` display form.
    pub fn matches_text(&self, text: &str) -> bool {
        compare_ignore_case(&self.name, text) == Ordering::Equal
            || compare_ignore_case(&self.email, text) == Ordering::Equal
            || self.to_string() == text
    }
}

impl fmt::Display for CommitterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

impl PartialEq for CommitterIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.same_email(other)
    }
}

impl Eq for CommitterIdentity {}

impl PartialOrd for CommitterIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CommitterIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_ignore_case(&self.email, &other.email)
    }
}

/// Lexicographic comparison of the lower-cased characters of `a` and `b`.
fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
