//! Symlink resolution bounded by an allow list.
//!
//! Every collector inspects a path through [`inspect`] before touching it. A
//! path that is gone (or a link whose target is gone) is reported as `None`
//! and dropped. A link whose target lies outside the allow list is a hard
//! error naming the link.

use crate::error::{Error, Result};
use crate::path::normalize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path prefixes a resolved symlink target must fall under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    prefixes: Vec<PathBuf>,
    // Canonical forms of the prefixes, for targets reached through other links.
    canonical: Vec<PathBuf>,
}

impl AllowList {
    /// Create an allow list from absolute prefixes.
    pub fn new<I, P>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut list = AllowList::default();
        for prefix in prefixes {
            list.push(prefix.into());
        }
        list
    }

    fn push(&mut self, prefix: PathBuf) {
        let prefix = normalize(&prefix);
        if self.prefixes.contains(&prefix) {
            return;
        }
        if let Ok(canonical) = fs::canonicalize(&prefix) {
            if canonical != prefix && !self.canonical.contains(&canonical) {
                self.canonical.push(canonical);
            }
        }
        self.prefixes.push(prefix);
    }

    /// Whether `path` is under one of the prefixes (component-wise).
    pub fn is_allowed(&self, path: &Path) -> bool {
        self.prefixes
            .iter()
            .chain(self.canonical.iter())
            .any(|prefix| path.starts_with(prefix))
    }

    /// The configured prefixes, in insertion order.
    pub fn prefixes(&self) -> &[PathBuf] {
        &self.prefixes
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

/// Resolve a link target the way the kernel would: relative to the link's directory.
pub fn resolve_target(link: &Path, target: &Path) -> PathBuf {
    if target.is_absolute() {
        normalize(target)
    } else {
        let base = link.parent().unwrap_or_else(|| Path::new("/"));
        normalize(&base.join(target))
    }
}

/// Inspect `path` under the symlink policy.
///
/// Returns the metadata of the path itself, or of the symlink target when the
/// path is a link. `Ok(None)` means the path or its target does not exist.
pub fn inspect(path: &Path, allow_list: &AllowList) -> Result<Option<fs::Metadata>> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "path vanished, skipping");
            return Ok(None);
        }
        Err(e) => return Err(Error::path_io(path, e)),
    };

    if !metadata.file_type().is_symlink() {
        return Ok(Some(metadata));
    }

    let target = match fs::read_link(path) {
        Ok(target) => target,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::path_io(path, e)),
    };
    let resolved = resolve_target(path, &target);
    if !allow_list.is_allowed(&resolved) {
        return Err(Error::symlink_not_allowed(path, resolved));
    }

    // The lexical target may itself pass through further links.
    let canonical = match fs::canonicalize(&resolved) {
        Ok(canonical) => canonical,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), target = %resolved.display(), "dangling symlink, skipping");
            return Ok(None);
        }
        Err(e) => return Err(Error::path_io(path, e)),
    };
    if !allow_list.is_allowed(&canonical) {
        return Err(Error::symlink_not_allowed(path, canonical));
    }

    match fs::metadata(&canonical) {
        Ok(metadata) => Ok(Some(metadata)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::path_io(path, e)),
    }
}
