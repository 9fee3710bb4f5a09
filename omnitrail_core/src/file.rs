//! Content digests and gitoids for files.

use crate::collector::{Collector, CollectorContext};
use crate::envelope::{ElementType, Envelope, Feature};
use crate::error::{Error, Result};
use crate::gitoid;
use crate::hash::{Algorithm, HashKind};
use crate::symlink::{self, AllowList};
use std::collections::BTreeMap;
use std::fs;
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Hashes every regular file it is shown.
#[derive(Debug)]
pub struct FileCollector {
    kinds: Vec<HashKind>,
    allow_list: Arc<AllowList>,
    // kind -> path -> hex value
    files: BTreeMap<HashKind, BTreeMap<PathBuf, String>>,
}

impl FileCollector {
    /// Create a collector recording a raw digest and a gitoid per algorithm.
    pub fn new(algorithms: &[Algorithm], allow_list: Arc<AllowList>) -> Self {
        let mut kinds: Vec<HashKind> = algorithms
            .iter()
            .flat_map(|a| [a.digest_kind(), a.gitoid_kind()])
            .collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds.dedup();

        Self {
            kinds,
            allow_list,
            files: BTreeMap::new(),
        }
    }

    pub fn from_context(context: &CollectorContext) -> Self {
        Self::new(context.algorithms(), context.allow_list())
    }

    /// Hash kinds computed for each file, in feature-manifest order.
    pub fn kinds(&self) -> &[HashKind] {
        &self.kinds
    }

    /// The value computed for `path` under `kind`, if the file was hashed.
    pub fn get(&self, path: &Path, kind: HashKind) -> Option<&str> {
        self.files.get(&kind)?.get(path).map(String::as_str)
    }

    fn hash_file(&mut self, path: &Path, length: u64) -> Result<()> {
        let mut file = fs::File::open(path).map_err(|e| Error::path_io(path, e))?;

        // One pass per kind; the handle is closed on every return path.
        for &kind in &self.kinds {
            file.seek(SeekFrom::Start(0))
                .map_err(|e| Error::path_io(path, e))?;
            let value = if kind.is_gitoid() {
                gitoid::from_reader(kind.algorithm(), &mut file, length)
            } else {
                kind.algorithm().digest_reader(&mut file)
            }
            .map_err(|e| match e {
                Error::Io { source } => Error::path_io(path, source),
                other => other,
            })?;
            self.files
                .entry(kind)
                .or_default()
                .insert(path.to_path_buf(), value);
        }
        Ok(())
    }
}

impl Collector for FileCollector {
    fn name(&self) -> &'static str {
        "file"
    }

    fn add(&mut self, path: &Path) -> Result<()> {
        let Some(metadata) = symlink::inspect(path, &self.allow_list)? else {
            return Ok(());
        };
        if metadata.is_dir() {
            return Ok(());
        }
        if !metadata.is_file() {
            warn!(path = %path.display(), "not a regular file, skipping content hash");
            return Ok(());
        }
        self.hash_file(path, metadata.len())
    }

    fn store(&mut self, envelope: &mut Envelope) -> Result<()> {
        envelope.set_feature(self.name(), Feature::from_kinds(self.kinds.iter().copied()));
        for (&kind, paths) in &self.files {
            for (path, value) in paths {
                envelope
                    .entry(path, ElementType::File)
                    .set_hash(kind, value.as_str());
            }
        }
        debug!(
            files = self.files.values().next().map_or(0, BTreeMap::len),
            "stored file hashes"
        );
        Ok(())
    }

    fn export_adg(&self, algorithm: Algorithm, adgs: &mut BTreeMap<String, String>) {
        if let Some(paths) = self.files.get(&algorithm.gitoid_kind()) {
            for identity in paths.values() {
                adgs.entry(identity.clone()).or_default();
            }
        }
    }
}
