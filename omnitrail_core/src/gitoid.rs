//! Gitoid identities and OmniBOR input manifests.
//!
//! A gitoid is the git blob hash of a byte sequence: the digest of
//! `"blob " + decimal(len) + NUL + bytes`. An aggregation node is identified by
//! the gitoid of its manifest:
//!
//! ```text
//! gitoid:blob:sha1
//! blob 3b18e512dba79e4c8300dd08aeb37f8e728b8dad
//! blob e69de29bb2d1d6434b8b29ae775ad8c2e48c5391
//! ```
//!
//! Reference lines are distinct and sorted ascending, so the manifest does not
//! depend on the order in which references were appended.

use crate::error::{Error, Result};
use crate::hash::{Algorithm, Hasher};
use std::collections::BTreeSet;
use std::io::{self, Read};

/// Object type prefix used for every gitoid produced here.
const BLOB: &str = "blob";

fn blob_header(length: u64) -> String {
    format!("{} {}\0", BLOB, length)
}

/// Gitoid of an in-memory byte sequence.
pub fn from_bytes(algorithm: Algorithm, data: &[u8]) -> String {
    let mut hasher = Hasher::new(algorithm);
    hasher.update(blob_header(data.len() as u64).as_bytes());
    hasher.update(data);
    hasher.finalize_hex()
}

/// Gitoid of `length` bytes read from `reader`.
///
/// Fails with `UnexpectedEof` if the reader yields fewer bytes than announced,
/// which happens when a file shrinks while it is being hashed.
pub fn from_reader<R: Read>(algorithm: Algorithm, reader: R, length: u64) -> Result<String> {
    let mut hasher = Hasher::new(algorithm);
    hasher.update(blob_header(length).as_bytes());
    let copied = io::copy(&mut reader.take(length), &mut hasher)?;
    if copied != length {
        return Err(Error::Io {
            source: io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {} bytes, read {}", length, copied),
            ),
        });
    }
    Ok(hasher.finalize_hex())
}

/// Check that `id` is a lowercase hex gitoid of the right length.
pub fn validate(algorithm: Algorithm, id: &str) -> Result<()> {
    if id.len() != algorithm.hex_len() {
        return Err(Error::invalid_reference(format!(
            "Expected {} hex characters for {}, got {}",
            algorithm.hex_len(),
            algorithm,
            id.len()
        )));
    }
    if !id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(Error::invalid_reference(format!(
            "Not lowercase hex: {}",
            id
        )));
    }
    Ok(())
}

/// First line of every manifest for `algorithm`.
pub fn manifest_header(algorithm: Algorithm) -> String {
    format!("gitoid:{}:{}\n", BLOB, algorithm)
}

/// Encode an input manifest over `references`.
pub fn encode_manifest<'a, I>(algorithm: Algorithm, references: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let sorted: BTreeSet<&str> = references.into_iter().collect();
    let mut manifest = manifest_header(algorithm);
    for reference in sorted {
        manifest.push_str(BLOB);
        manifest.push(' ');
        manifest.push_str(reference);
        manifest.push('\n');
    }
    manifest
}
