//! The trail: collectors plus the envelope they write into.

use crate::collector::{Collector, CollectorContext, CollectorFactory};
use crate::directory::DirectoryCollector;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::file::FileCollector;
use crate::hash::Algorithm;
use crate::path;
use crate::symlink::AllowList;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Owns the collectors and the envelope for one or more scans.
///
/// Scans are added with [`Trail::add`]. Collectors run in registration order:
/// file, directory, posix, then any registered with
/// [`TrailBuilder::collector`].
pub struct Trail {
    pub(crate) algorithms: Vec<Algorithm>,
    pub(crate) allow_list: Arc<AllowList>,
    pub(crate) envelope: Envelope,
    pub(crate) collectors: Vec<Box<dyn Collector>>,
}

impl Trail {
    /// A trail with both algorithms, the posix collector, and an empty allow list.
    pub fn new() -> Result<Self> {
        TrailBuilder::new().build()
    }

    pub fn builder() -> TrailBuilder {
        TrailBuilder::new()
    }

    /// Enabled algorithms, sorted.
    pub fn algorithms(&self) -> &[Algorithm] {
        &self.algorithms
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// The accumulated record set.
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Identity recorded for `path` under `algorithm`.
    ///
    /// Relative paths are resolved against the working directory.
    pub fn identity<P: AsRef<Path>>(&self, path: P, algorithm: Algorithm) -> Option<&str> {
        let path = path::absolutize(path.as_ref()).ok()?;
        self.envelope.get(&path)?.identity(algorithm)
    }

    /// Union of `identity -> serialized node` pairs from every collector.
    pub fn adgs(&self, algorithm: Algorithm) -> BTreeMap<String, String> {
        let mut adgs = BTreeMap::new();
        for collector in &self.collectors {
            collector.export_adg(algorithm, &mut adgs);
        }
        adgs
    }

    pub fn sha1_adgs(&self) -> BTreeMap<String, String> {
        self.adgs(Algorithm::Sha1)
    }

    pub fn sha256_adgs(&self) -> BTreeMap<String, String> {
        self.adgs(Algorithm::Sha256)
    }

    /// Names of the registered collectors, in run order.
    pub fn collector_names(&self) -> Vec<&'static str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }
}

impl fmt::Debug for Trail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trail")
            .field("algorithms", &self.algorithms)
            .field("allow_list", &self.allow_list)
            .field("collectors", &self.collector_names())
            .field("elements", &self.envelope.mapping.len())
            .finish()
    }
}

/// Configures a [`Trail`].
pub struct TrailBuilder {
    algorithms: Vec<Algorithm>,
    allow_list: Vec<PathBuf>,
    posix: bool,
    factories: Vec<CollectorFactory>,
}

impl Default for TrailBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrailBuilder {
    pub fn new() -> Self {
        Self {
            algorithms: Algorithm::ALL.to_vec(),
            allow_list: Vec::new(),
            posix: true,
            factories: Vec::new(),
        }
    }

    /// Replace the enabled algorithms. An empty set falls back to SHA-1.
    pub fn algorithms<I: IntoIterator<Item = Algorithm>>(mut self, algorithms: I) -> Self {
        self.algorithms = algorithms.into_iter().collect();
        self
    }

    /// Enable only `algorithm`.
    pub fn algorithm(self, algorithm: Algorithm) -> Self {
        self.algorithms([algorithm])
    }

    /// Allow symlinks resolving under `prefix`.
    pub fn allow<P: Into<PathBuf>>(mut self, prefix: P) -> Self {
        self.allow_list.push(prefix.into());
        self
    }

    /// Record POSIX metadata (unix only; ignored elsewhere).
    pub fn posix(mut self, enabled: bool) -> Self {
        self.posix = enabled;
        self
    }

    /// Register an extra collector, run after the built-in ones.
    pub fn collector<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(&CollectorContext) -> Box<dyn Collector> + 'static,
    {
        self.factories.push(Box::new(factory));
        self
    }

    pub fn build(self) -> Result<Trail> {
        let mut algorithms = self.algorithms;
        algorithms.sort();
        algorithms.dedup();
        if algorithms.is_empty() {
            algorithms.push(Algorithm::Sha1);
        }

        let prefixes = self
            .allow_list
            .iter()
            .map(|p| path::absolutize(p))
            .collect::<Result<Vec<_>>>()?;
        let allow_list = Arc::new(AllowList::new(prefixes));
        let context = CollectorContext::new(algorithms.clone(), Arc::clone(&allow_list));

        let mut collectors: Vec<Box<dyn Collector>> = vec![
            Box::new(FileCollector::from_context(&context)),
            Box::new(DirectoryCollector::from_context(&context)),
        ];
        #[cfg(unix)]
        {
            if self.posix {
                collectors.push(Box::new(crate::posix::PosixCollector::from_context(
                    &context,
                )));
            }
        }
        for factory in self.factories {
            collectors.push(factory(&context));
        }

        Ok(Trail {
            algorithms,
            allow_list,
            envelope: Envelope::new(),
            collectors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_build() {
        let trail = Trail::new().unwrap();
        assert_eq!(trail.algorithms(), &[Algorithm::Sha1, Algorithm::Sha256]);
        assert!(trail.allow_list().is_empty());
        assert!(trail.envelope().mapping.is_empty());

        let names = trail.collector_names();
        assert_eq!(&names[..2], &["file", "directory"]);
        #[cfg(unix)]
        assert_eq!(names, vec!["file", "directory", "posix"]);
    }

    #[test]
    fn test_empty_algorithms_fall_back_to_sha1() {
        let trail = Trail::builder().algorithms(Vec::new()).build().unwrap();
        assert_eq!(trail.algorithms(), &[Algorithm::Sha1]);
    }

    #[test]
    fn test_algorithms_sorted_and_distinct() {
        let trail = Trail::builder()
            .algorithms([Algorithm::Sha256, Algorithm::Sha1, Algorithm::Sha256])
            .build()
            .unwrap();
        assert_eq!(trail.algorithms(), &[Algorithm::Sha1, Algorithm::Sha256]);
    }

    #[test]
    fn test_posix_can_be_disabled() {
        let trail = Trail::builder().posix(false).build().unwrap();
        assert_eq!(trail.collector_names(), vec!["file", "directory"]);
    }

    #[test]
    fn test_relative_allow_prefix_is_made_absolute() {
        let trail = Trail::builder().allow("relative/dir").build().unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(
            trail.allow_list().prefixes(),
            &[path::normalize(&cwd.join("relative/dir"))]
        );
    }

    #[test]
    fn test_no_adgs_before_add() {
        let trail = Trail::new().unwrap();
        assert!(trail.sha1_adgs().is_empty());
        assert!(trail.sha256_adgs().is_empty());
    }
}
