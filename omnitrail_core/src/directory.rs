//! Directory identities, aggregated bottom-up from their children.
//!
//! `add` only records which paths are directories. `store` runs after every
//! file identity is in the envelope and folds them upward:
//!
//! 1. one empty [`AggregationNode`] per directory and algorithm;
//! 2. each file's identity is appended to its parent's node;
//! 3. directories are finalized deepest-first, each appending its identity to
//!    its parent's node, so a parent is never finalized before a child;
//! 4. every identity is written back into the envelope.

use crate::collector::{Collector, CollectorContext};
use crate::envelope::{ElementType, Envelope, Feature};
use crate::error::{Error, Result};
use crate::hash::Algorithm;
use crate::node::{AggregationNode, FinalizedNode};
use crate::symlink::{self, AllowList};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Builds the artifact dependency graph for directories.
#[derive(Debug)]
pub struct DirectoryCollector {
    algorithms: Vec<Algorithm>,
    allow_list: Arc<AllowList>,
    directories: BTreeSet<PathBuf>,
    graphs: BTreeMap<Algorithm, BTreeMap<PathBuf, FinalizedNode>>,
}

impl DirectoryCollector {
    pub fn new(algorithms: &[Algorithm], allow_list: Arc<AllowList>) -> Self {
        let mut algorithms = algorithms.to_vec();
        algorithms.sort();
        algorithms.dedup();

        Self {
            algorithms,
            allow_list,
            directories: BTreeSet::new(),
            graphs: BTreeMap::new(),
        }
    }

    pub fn from_context(context: &CollectorContext) -> Self {
        Self::new(context.algorithms(), context.allow_list())
    }

    /// Directories recorded so far.
    pub fn directories(&self) -> &BTreeSet<PathBuf> {
        &self.directories
    }

    /// The finalized node for `path` under `algorithm`, after `store`.
    pub fn node(&self, path: &Path, algorithm: Algorithm) -> Option<&FinalizedNode> {
        self.graphs.get(&algorithm)?.get(path)
    }
}

fn depth(path: &Path) -> usize {
    path.components().count()
}

/// Fold file identities in `envelope` up through `directories`.
fn aggregate(
    algorithm: Algorithm,
    directories: &BTreeSet<PathBuf>,
    envelope: &Envelope,
) -> Result<BTreeMap<PathBuf, FinalizedNode>> {
    let mut pending: HashMap<&Path, AggregationNode> = directories
        .iter()
        .map(|dir| (dir.as_path(), AggregationNode::new(algorithm)))
        .collect();

    for (path, element) in envelope.mapping.iter().filter(|(_, e)| e.is_file()) {
        let Some(node) = path.parent().and_then(|parent| pending.get_mut(parent)) else {
            continue;
        };
        let identity = element.identity(algorithm).ok_or_else(|| {
            Error::invalid_reference(format!(
                "{} has no {} identity",
                path.display(),
                algorithm.gitoid_kind()
            ))
        })?;
        node.add_existing_reference(identity)?;
    }

    // A descendant always has more components than its ancestors, so
    // deepest-first finalizes every child before its parent.
    let mut order: Vec<&Path> = directories.iter().map(PathBuf::as_path).collect();
    order.sort_by(|a, b| depth(b).cmp(&depth(a)).then_with(|| a.cmp(b)));

    let mut graph = BTreeMap::new();
    for dir in order {
        let Some(node) = pending.remove(dir) else {
            continue;
        };
        let finalized = node.finalize();
        if let Some(parent) = dir.parent().and_then(|parent| pending.get_mut(parent)) {
            parent.add_existing_reference(finalized.identity())?;
        }
        graph.insert(dir.to_path_buf(), finalized);
    }
    Ok(graph)
}

impl Collector for DirectoryCollector {
    fn name(&self) -> &'static str {
        "directory"
    }

    fn add(&mut self, path: &Path) -> Result<()> {
        let Some(metadata) = symlink::inspect(path, &self.allow_list)? else {
            return Ok(());
        };
        if metadata.is_dir() {
            self.directories.insert(path.to_path_buf());
        }
        Ok(())
    }

    fn store(&mut self, envelope: &mut Envelope) -> Result<()> {
        envelope.set_feature(
            self.name(),
            Feature::from_kinds(self.algorithms.iter().map(Algorithm::gitoid_kind)),
        );

        for &algorithm in &self.algorithms {
            let graph = aggregate(algorithm, &self.directories, envelope)?;
            for (path, node) in &graph {
                envelope
                    .entry(path, ElementType::Directory)
                    .set_hash(algorithm.gitoid_kind(), node.identity());
            }
            debug!(%algorithm, directories = graph.len(), "aggregated directory identities");
            self.graphs.insert(algorithm, graph);
        }
        Ok(())
    }

    fn export_adg(&self, algorithm: Algorithm, adgs: &mut BTreeMap<String, String>) {
        if let Some(graph) = self.graphs.get(&algorithm) {
            for node in graph.values() {
                adgs.insert(node.identity().to_string(), node.manifest().to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Element;
    use crate::gitoid;
    use crate::hash::HashKind;

    fn file_element(algorithm: Algorithm, content: &[u8]) -> Element {
        let mut element = Element::new(ElementType::File);
        element.set_hash(algorithm.gitoid_kind(), gitoid::from_bytes(algorithm, content));
        element
    }

    fn collector_with(dirs: &[&str]) -> DirectoryCollector {
        let mut c = DirectoryCollector::new(&[Algorithm::Sha1], Arc::default());
        c.directories.extend(dirs.iter().map(PathBuf::from));
        c
    }

    #[test]
    fn test_nested_aggregation() {
        let mut c = collector_with(&["/r", "/r/a", "/r/a/b"]);
        let mut envelope = Envelope::new();
        envelope.mapping.insert(
            PathBuf::from("/r/a/b/file.txt"),
            file_element(Algorithm::Sha1, b"content"),
        );
        c.store(&mut envelope).unwrap();

        let file_id = gitoid::from_bytes(Algorithm::Sha1, b"content");
        let b = c.node(Path::new("/r/a/b"), Algorithm::Sha1).unwrap();
        let a = c.node(Path::new("/r/a"), Algorithm::Sha1).unwrap();
        let r = c.node(Path::new("/r"), Algorithm::Sha1).unwrap();

        assert_eq!(b.manifest(), format!("gitoid:blob:sha1\nblob {}\n", file_id));
        assert_eq!(a.manifest(), format!("gitoid:blob:sha1\nblob {}\n", b.identity()));
        assert_eq!(r.manifest(), format!("gitoid:blob:sha1\nblob {}\n", a.identity()));

        let element = envelope.get(Path::new("/r")).unwrap();
        assert!(element.is_directory());
        assert_eq!(element.identity(Algorithm::Sha1), Some(r.identity()));
    }

    #[test]
    fn test_identity_ignores_names() {
        let mut first = collector_with(&["/x"]);
        let mut envelope = Envelope::new();
        envelope
            .mapping
            .insert(PathBuf::from("/x/one"), file_element(Algorithm::Sha1, b"1"));
        first.store(&mut envelope).unwrap();

        let mut second = collector_with(&["/y"]);
        let mut other = Envelope::new();
        other
            .mapping
            .insert(PathBuf::from("/y/renamed"), file_element(Algorithm::Sha1, b"1"));
        second.store(&mut other).unwrap();

        assert_eq!(
            envelope.get(Path::new("/x")).unwrap().gitoid_sha1,
            other.get(Path::new("/y")).unwrap().gitoid_sha1
        );
    }

    #[test]
    fn test_empty_directory() {
        let mut c = collector_with(&["/empty"]);
        let mut envelope = Envelope::new();
        c.store(&mut envelope).unwrap();

        let expected = gitoid::from_bytes(Algorithm::Sha1, b"gitoid:blob:sha1\n");
        assert_eq!(
            envelope.get(Path::new("/empty")).unwrap().identity(Algorithm::Sha1),
            Some(expected.as_str())
        );
    }

    #[test]
    fn test_file_without_identity_is_fatal() {
        let mut c = collector_with(&["/r"]);
        let mut envelope = Envelope::new();
        let mut element = Element::new(ElementType::File);
        element.set_hash(HashKind::Sha1, "not an identity");
        envelope.mapping.insert(PathBuf::from("/r/f"), element);

        let err = c.store(&mut envelope).unwrap_err();
        assert!(matches!(err, Error::InvalidReference { .. }));
    }

    #[test]
    fn test_malformed_identity_is_fatal() {
        let mut c = collector_with(&["/r"]);
        let mut envelope = Envelope::new();
        let mut element = Element::new(ElementType::File);
        element.set_hash(HashKind::GitoidSha1, "XYZ");
        envelope.mapping.insert(PathBuf::from("/r/f"), element);

        assert!(c.store(&mut envelope).is_err());
    }

    #[test]
    fn test_files_outside_recorded_directories_are_ignored() {
        let mut c = collector_with(&["/r"]);
        let mut envelope = Envelope::new();
        envelope
            .mapping
            .insert(PathBuf::from("/elsewhere/f"), file_element(Algorithm::Sha1, b"f"));
        c.store(&mut envelope).unwrap();

        let r = c.node(Path::new("/r"), Algorithm::Sha1).unwrap();
        assert_eq!(r.manifest(), "gitoid:blob:sha1\n");
    }

    #[test]
    fn test_export_adg() {
        let mut c = collector_with(&["/r", "/r/sub"]);
        let mut envelope = Envelope::new();
        c.store(&mut envelope).unwrap();

        let mut adgs = BTreeMap::new();
        c.export_adg(Algorithm::Sha1, &mut adgs);
        // the empty subdirectory and its parent have different manifests
        assert_eq!(adgs.len(), 2);
        assert!(adgs.values().all(|m| m.starts_with("gitoid:blob:sha1\n")));

        let mut none = BTreeMap::new();
        c.export_adg(Algorithm::Sha256, &mut none);
        assert!(none.is_empty());
    }

    #[test]
    fn test_depth_order_tie_break() {
        let mut paths = vec![Path::new("/b/x"), Path::new("/a"), Path::new("/a/y/z")];
        paths.sort_by(|a, b| depth(b).cmp(&depth(a)).then_with(|| a.cmp(b)));
        assert_eq!(
            paths,
            vec![Path::new("/a/y/z"), Path::new("/b/x"), Path::new("/a")]
        );
    }
}
