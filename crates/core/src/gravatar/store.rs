//! Where avatar images are written.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::FetchError;
use crate::identity::CommitterIdentity;

/// What happens when two committers share a display name.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// `<name>.png`; a later write silently replaces an earlier one.
    #[default]
    Overwrite,
    /// `<name>-<fingerprint>.png`; distinct emails never collide.
    SuffixFingerprint,
}

/// Path of the image file for `committer` inside `dir`.
///
/// Path separators in the display name are replaced with `_` so every file
/// stays directly inside `dir`.
pub fn avatar_path(
    dir: &Path,
    committer: &CommitterIdentity,
    fingerprint: &str,
    policy: CollisionPolicy,
) -> PathBuf {
    let stem: String = committer
        .name()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    let file_name = match policy {
        CollisionPolicy::Overwrite => format!("{}.png", stem),
        CollisionPolicy::SuffixFingerprint => format!("{}-{}.png", stem, fingerprint),
    };
    dir.join(file_name)
}

/// Create `dir` if needed and return its absolute form.
pub fn prepare_output_dir(dir: &Path) -> Result<PathBuf, FetchError> {
    std::fs::create_dir_all(dir)
        .and_then(|_| dir.canonicalize())
        .map_err(|source| FetchError::OutputDirectory {
            path: dir.to_path_buf(),
            source,
        })
}

/// Write `bytes` to `path` unchanged.
///
/// The bytes land in a temporary file next to `path` which then replaces it,
/// so writers racing on one path leave exactly one complete image behind.
pub async fn save_avatar(path: &Path, bytes: Vec<u8>) -> Result<(), FetchError> {
    let target = path.to_path_buf();
    let len = bytes.len();
    tokio::task::spawn_blocking(move || write_replacing(&target, &bytes))
        .await
        .map_err(io::Error::other)
        .and_then(|written| written)
        .map_err(|source| FetchError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), bytes = len, "wrote avatar");
    Ok(())
}

fn write_replacing(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut part = tempfile::Builder::new()
        .prefix(".gitavatar-")
        .suffix(".part")
        .tempfile_in(dir)?;
    part.write_all(bytes)?;
    part.persist(path).map_err(|e| e.error)?;
    Ok(())
}
