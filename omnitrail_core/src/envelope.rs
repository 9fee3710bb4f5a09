//! The output document: a header of enabled features and a path-keyed record set.

use crate::hash::{Algorithm, HashKind};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Record set shared by every collector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub header: Header,
    #[serde(serialize_with = "serialize_paths_lossy")]
    pub mapping: BTreeMap<PathBuf, Element>,
}

// Paths that are not valid UTF-8 are written with U+FFFD substitutions.
fn serialize_paths_lossy<S: Serializer>(
    mapping: &BTreeMap<PathBuf, Element>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(mapping.len()))?;
    for (path, element) in mapping {
        map.serialize_entry(&path.to_string_lossy(), element)?;
    }
    map.end()
}

impl Envelope {
    /// Create an empty envelope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the element recorded for `path`.
    pub fn get(&self, path: &Path) -> Option<&Element> {
        self.mapping.get(path)
    }

    /// Get the element for `path`, inserting an empty one of `kind` if absent.
    ///
    /// The type of an existing element is left untouched.
    pub fn entry(&mut self, path: &Path, kind: ElementType) -> &mut Element {
        self.mapping
            .entry(path.to_path_buf())
            .or_insert_with(|| Element::new(kind))
    }

    /// Record which hash kinds a collector ran with.
    pub fn set_feature(&mut self, name: &str, feature: Feature) {
        self.header.features.insert(name.to_string(), feature);
    }
}

/// Per-collector feature manifests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub features: BTreeMap<String, Feature>,
}

/// Hash kinds a collector had enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub algorithms: Vec<String>,
}

impl Feature {
    /// Build a feature manifest from hash kinds, sorted lexically.
    pub fn from_kinds<I: IntoIterator<Item = HashKind>>(kinds: I) -> Self {
        let mut algorithms: Vec<String> = kinds
            .into_iter()
            .map(|k| k.as_str().to_string())
            .collect();
        algorithms.sort();
        algorithms.dedup();
        Self { algorithms }
    }
}

/// Whether a path is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    File,
    Directory,
}

/// Everything recorded about one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub kind: ElementType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(rename = "gitoid:sha1", default, skip_serializing_if = "Option::is_none")]
    pub gitoid_sha1: Option<String>,
    #[serde(rename = "gitoid:sha256", default, skip_serializing_if = "Option::is_none")]
    pub gitoid_sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posix: Option<Posix>,
}

impl Element {
    /// Create an element with no hashes.
    pub fn new(kind: ElementType) -> Self {
        Self {
            kind,
            sha1: None,
            sha256: None,
            gitoid_sha1: None,
            gitoid_sha256: None,
            posix: None,
        }
    }

    fn slot(&mut self, kind: HashKind) -> &mut Option<String> {
        match kind {
            HashKind::Sha1 => &mut self.sha1,
            HashKind::Sha256 => &mut self.sha256,
            HashKind::GitoidSha1 => &mut self.gitoid_sha1,
            HashKind::GitoidSha256 => &mut self.gitoid_sha256,
        }
    }

    /// The value recorded for `kind`, if any.
    pub fn hash(&self, kind: HashKind) -> Option<&str> {
        match kind {
            HashKind::Sha1 => self.sha1.as_deref(),
            HashKind::Sha256 => self.sha256.as_deref(),
            HashKind::GitoidSha1 => self.gitoid_sha1.as_deref(),
            HashKind::GitoidSha256 => self.gitoid_sha256.as_deref(),
        }
    }

    /// Record a value for `kind`, replacing any previous one.
    pub fn set_hash(&mut self, kind: HashKind, value: impl Into<String>) {
        *self.slot(kind) = Some(value.into());
    }

    /// The gitoid identity under `algorithm`.
    pub fn identity(&self, algorithm: Algorithm) -> Option<&str> {
        self.hash(algorithm.gitoid_kind())
    }

    pub fn is_file(&self) -> bool {
        self.kind == ElementType::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == ElementType::Directory
    }
}

/// POSIX metadata snapshot, rendered as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posix {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_inode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hard_link_count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_gid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}
