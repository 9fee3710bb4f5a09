//! # Omnitrail Core
//!
//! Content-addressed identities for files and directory trees.
//!
//! Every file gets a gitoid: the digest of a `blob <len>\0` header followed by
//! its bytes. Every directory gets the gitoid of a manifest listing the
//! identities of its children, so a directory's identity depends on content
//! and never on names, timestamps or permissions. The manifests form an
//! artifact dependency graph (ADG).
//!
//! ## Features
//!
//! - SHA-1 and SHA-256 gitoids, selectable per trail
//! - Bottom-up directory aggregation, deepest directory first
//! - Pluggable collectors writing into one shared envelope
//! - Symlinks followed only when they resolve inside an allow list
//! - POSIX metadata capture on unix
//!
//! ## Example
//!
//! ```no_run
//! use omnitrail_core::{Algorithm, Trail};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut trail = Trail::builder().allow("./my-data").build()?;
//! trail.add("./my-data")?;
//!
//! if let Some(id) = trail.identity("./my-data", Algorithm::Sha256) {
//!     println!("gitoid:blob:sha256:{}", id);
//! }
//!
//! for (identity, manifest) in trail.sha1_adgs() {
//!     println!("{}\n{}", identity, manifest);
//! }
//! # Ok(())
//! # }
//! ```

mod collector;
mod directory;
mod envelope;
mod error;
mod file;
pub mod gitoid;
mod hash;
mod listing;
mod node;
mod path;
#[cfg(unix)]
mod posix;
mod symlink;
mod trail;
mod walk;

pub use collector::{Collector, CollectorContext, CollectorFactory};
pub use directory::DirectoryCollector;
pub use envelope::{Element, ElementType, Envelope, Feature, Header, Posix};
pub use error::{Error, Result};
pub use file::FileCollector;
pub use hash::{Algorithm, HashKind};
pub use listing::format_adg;
pub use node::{AggregationNode, FinalizedNode};
#[cfg(unix)]
pub use posix::{PosixCollector, PosixSnapshot, permission_string};
pub use symlink::AllowList;
pub use trail::{Trail, TrailBuilder};
