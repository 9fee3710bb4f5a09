//! Filesystem walking and collector dispatch.

use crate::error::{Error, Result};
use crate::path;
use crate::trail::Trail;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

impl Trail {
    /// Scan a file or directory tree into the trail.
    ///
    /// Every path under `root` is shown to every collector, parents first.
    /// Then each collector stores into the envelope in registration order.
    /// Adding a root that is already in the envelope, or one that does not
    /// exist, does nothing.
    ///
    /// On error the envelope may hold partial results from this call.
    pub fn add<P: AsRef<Path>>(&mut self, root: P) -> Result<()> {
        let root = path::absolutize(root.as_ref())?;

        if self.envelope.mapping.contains_key(&root) {
            debug!(root = %root.display(), "root already scanned");
            return Ok(());
        }

        match fs::symlink_metadata(&root) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(root = %root.display(), "root does not exist");
                return Ok(());
            }
            Err(e) => return Err(Error::path_io(&root, e)),
        }

        let visited = self.walk(&root)?;

        for collector in &mut self.collectors {
            collector.store(&mut self.envelope)?;
            debug!(collector = collector.name(), "collector stored");
        }

        info!(
            root = %root.display(),
            visited,
            elements = self.envelope.mapping.len(),
            "scan complete"
        );
        Ok(())
    }

    /// Feed every entry under `root` to the collectors. Returns the number visited.
    fn walk(&mut self, root: &Path) -> Result<usize> {
        // Every entry counts, hidden or ignored. Symlinked directories are
        // descended; the link itself reaches the collectors first, so one
        // outside the allow list fails before anything beneath it is read.
        let walker = ignore::WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(true)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut visited = 0;
        for entry in walker {
            let entry = match entry {
                Err(err) if is_loop(&err) => {
                    debug!(error = %err, "symlink cycle, not descending");
                    continue;
                }
                other => other,
            };
            let entry = match entry.map_err(Error::from) {
                Ok(entry) => entry,
                Err(err) if err.is_not_found() => {
                    debug!(error = %err, "entry vanished during walk");
                    continue;
                }
                Err(err) => return Err(err),
            };

            let path = path::normalize(entry.path());
            for collector in &mut self.collectors {
                collector.add(&path)?;
            }
            visited += 1;
        }
        Ok(visited)
    }
}

fn is_loop(err: &ignore::Error) -> bool {
    match err {
        ignore::Error::Loop { .. } => true,
        ignore::Error::WithPath { err, .. } | ignore::Error::WithDepth { err, .. } => is_loop(err),
        _ => false,
    }
}
