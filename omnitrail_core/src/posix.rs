//! POSIX metadata snapshots.

use crate::collector::{Collector, CollectorContext};
use crate::envelope::{Envelope, Feature, Posix};
use crate::error::Result;
use crate::symlink::{self, AllowList};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const S_IFMT: u32 = 0o170000;
const S_IFSOCK: u32 = 0o140000;
const S_IFLNK: u32 = 0o120000;
const S_IFREG: u32 = 0o100000;
const S_IFBLK: u32 = 0o060000;
const S_IFDIR: u32 = 0o040000;
const S_IFCHR: u32 = 0o020000;
const S_IFIFO: u32 = 0o010000;

/// What was captured for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosixSnapshot {
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    /// `None` for directories.
    pub size: Option<u64>,
    pub atime: Option<String>,
    pub mtime: Option<String>,
    pub ctime: Option<String>,
    pub inode: u64,
    pub nlink: u64,
    pub dev: u64,
}

impl PosixSnapshot {
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        Self {
            mode: metadata.mode(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: (!metadata.is_dir()).then(|| metadata.size()),
            atime: timestamp(metadata.atime(), metadata.atime_nsec()),
            mtime: timestamp(metadata.mtime(), metadata.mtime_nsec()),
            ctime: timestamp(metadata.ctime(), metadata.ctime_nsec()),
            inode: metadata.ino(),
            nlink: metadata.nlink(),
            dev: metadata.dev(),
        }
    }

    pub fn to_posix(&self) -> Posix {
        Posix {
            atime: self.atime.clone(),
            ctime: self.ctime.clone(),
            mtime: self.mtime.clone(),
            file_device_id: Some(self.dev.to_string()),
            file_inode: Some(self.inode.to_string()),
            file_type: Some(file_type(self.mode).to_string()),
            hard_link_count: Some(self.nlink.to_string()),
            owner_gid: Some(self.gid.to_string()),
            owner_uid: Some(self.uid.to_string()),
            permissions: Some(permission_string(self.mode)),
            size: self.size.map(|s| s.to_string()),
        }
    }
}

fn timestamp(secs: i64, nsecs: i64) -> Option<String> {
    let nsecs = u32::try_from(nsecs).ok()?;
    DateTime::<Utc>::from_timestamp(secs, nsecs)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

fn file_type(mode: u32) -> &'static str {
    match mode & S_IFMT {
        S_IFREG => "regular",
        S_IFDIR => "directory",
        S_IFLNK => "symlink",
        S_IFIFO => "fifo",
        S_IFSOCK => "socket",
        S_IFCHR => "char_device",
        S_IFBLK => "block_device",
        _ => "unknown",
    }
}

/// Render a mode `ls`-style, e.g. `drwxr-xr-x` or `-rwsr-xr-x`.
pub fn permission_string(mode: u32) -> String {
    let type_char = match mode & S_IFMT {
        S_IFDIR => 'd',
        S_IFLNK => 'l',
        S_IFIFO => 'p',
        S_IFSOCK => 's',
        S_IFCHR => 'c',
        S_IFBLK => 'b',
        _ => '-',
    };

    let mut out = String::with_capacity(10);
    out.push(type_char);

    // (read, write, execute, special bit, special char when x set / unset)
    let triples = [
        (0o400, 0o200, 0o100, 0o4000, ('s', 'S')),
        (0o040, 0o020, 0o010, 0o2000, ('s', 'S')),
        (0o004, 0o002, 0o001, 0o1000, ('t', 'T')),
    ];
    for (r, w, x, special, (with_x, without_x)) in triples {
        out.push(if mode & r != 0 { 'r' } else { '-' });
        out.push(if mode & w != 0 { 'w' } else { '-' });
        out.push(match (mode & special != 0, mode & x != 0) {
            (true, true) => with_x,
            (true, false) => without_x,
            (false, true) => 'x',
            (false, false) => '-',
        });
    }
    out
}

/// Records permissions, ownership, size and timestamps of every path.
#[derive(Debug)]
pub struct PosixCollector {
    allow_list: Arc<AllowList>,
    snapshots: BTreeMap<PathBuf, PosixSnapshot>,
}

impl PosixCollector {
    pub fn new(allow_list: Arc<AllowList>) -> Self {
        Self {
            allow_list,
            snapshots: BTreeMap::new(),
        }
    }

    pub fn from_context(context: &CollectorContext) -> Self {
        Self::new(context.allow_list())
    }

    pub fn snapshot(&self, path: &Path) -> Option<&PosixSnapshot> {
        self.snapshots.get(path)
    }
}

impl Collector for PosixCollector {
    fn name(&self) -> &'static str {
        "posix"
    }

    fn add(&mut self, path: &Path) -> Result<()> {
        if let Some(metadata) = symlink::inspect(path, &self.allow_list)? {
            self.snapshots
                .insert(path.to_path_buf(), PosixSnapshot::from_metadata(&metadata));
        }
        Ok(())
    }

    fn store(&mut self, envelope: &mut Envelope) -> Result<()> {
        envelope.set_feature(self.name(), Feature::default());
        for (path, element) in envelope.mapping.iter_mut() {
            if let Some(snapshot) = self.snapshots.get(path) {
                element.posix = Some(snapshot.to_posix());
            }
        }
        Ok(())
    }
}
