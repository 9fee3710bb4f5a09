//! The collector abstraction.
//!
//! A trail feeds every visited path to each collector's [`Collector::add`],
//! then calls [`Collector::store`] on each collector in registration order so
//! later collectors can read what earlier ones wrote.

use crate::envelope::Envelope;
use crate::error::Result;
use crate::hash::Algorithm;
use crate::symlink::AllowList;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// A pluggable unit that observes every visited path.
pub trait Collector {
    /// Name under which the collector's feature manifest is recorded.
    fn name(&self) -> &'static str;

    /// Observe one path. Paths arrive parent-first.
    fn add(&mut self, path: &Path) -> Result<()>;

    /// Flush accumulated state into the envelope.
    fn store(&mut self, envelope: &mut Envelope) -> Result<()>;

    /// Export `identity -> serialized node` pairs for `algorithm`.
    ///
    /// Leaves contribute an empty serialized form.
    fn export_adg(&self, _algorithm: Algorithm, _adgs: &mut BTreeMap<String, String>) {}
}

/// Shared settings handed to collector factories when a trail is built.
#[derive(Debug, Clone)]
pub struct CollectorContext {
    algorithms: Vec<Algorithm>,
    allow_list: Arc<AllowList>,
}

impl CollectorContext {
    pub(crate) fn new(algorithms: Vec<Algorithm>, allow_list: Arc<AllowList>) -> Self {
        Self {
            algorithms,
            allow_list,
        }
    }

    /// Enabled algorithms, sorted and distinct.
    pub fn algorithms(&self) -> &[Algorithm] {
        &self.algorithms
    }

    /// The trail's allow list.
    pub fn allow_list(&self) -> Arc<AllowList> {
        Arc::clone(&self.allow_list)
    }
}

/// Builds a collector for a trail.
pub type CollectorFactory = Box<dyn FnOnce(&CollectorContext) -> Box<dyn Collector>>;
