//! Path normalization for record-set keys.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Make `path` absolute against the working directory and normalize it.
///
/// Symlinks are not resolved; a scanned link keeps its own path as its key.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|e| Error::path_io(path, e))?;
    Ok(normalize(&absolute))
}

/// Lexically remove `.` and `..` components.
///
/// `..` never climbs above the root: `/../etc` normalizes to `/etc`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(component),
            },
            other => normalized.push(other),
        }
    }
    normalized
}
