//! Digest algorithms and the hash kinds recorded per file.

use crate::error::{Error, Result};
use sha1::Digest;
use std::fmt;
use std::io::{self, Read, Write};

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Algorithm {
    /// SHA-1 with 160-bit output.
    Sha1,
    /// SHA-256 with 256-bit output.
    Sha256,
}

impl Algorithm {
    /// Every supported algorithm, in output order.
    pub const ALL: [Algorithm; 2] = [Algorithm::Sha1, Algorithm::Sha256];

    /// Returns the string representation of the algorithm.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha256 => "sha256",
        }
    }

    /// Parse algorithm from string.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(Algorithm::Sha1),
            "sha256" | "sha-256" => Ok(Algorithm::Sha256),
            _ => Err(Error::unsupported_algorithm(s)),
        }
    }

    /// Digest size in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            Algorithm::Sha1 => 20,
            Algorithm::Sha256 => 32,
        }
    }

    /// Length of a hex-encoded digest.
    pub fn hex_len(&self) -> usize {
        self.digest_len() * 2
    }

    /// The raw content digest kind for this algorithm.
    pub fn digest_kind(&self) -> HashKind {
        match self {
            Algorithm::Sha1 => HashKind::Sha1,
            Algorithm::Sha256 => HashKind::Sha256,
        }
    }

    /// The gitoid identity kind for this algorithm.
    pub fn gitoid_kind(&self) -> HashKind {
        match self {
            Algorithm::Sha1 => HashKind::GitoidSha1,
            Algorithm::Sha256 => HashKind::GitoidSha256,
        }
    }

    /// Hash raw bytes, returning lowercase hex.
    pub fn digest_bytes(&self, data: &[u8]) -> String {
        let mut hasher = Hasher::new(*self);
        hasher.update(data);
        hasher.finalize_hex()
    }

    /// Hash data from a reader, returning lowercase hex.
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> Result<String> {
        let mut hasher = Hasher::new(*self);
        io::copy(&mut reader, &mut hasher)?;
        Ok(hasher.finalize_hex())
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value recorded for a file: either a raw content digest or a gitoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashKind {
    Sha1,
    Sha256,
    GitoidSha1,
    GitoidSha256,
}

impl HashKind {
    /// Returns the key used in the output document.
    pub fn as_str(&self) -> &'static str {
        match self {
            HashKind::Sha1 => "sha1",
            HashKind::Sha256 => "sha256",
            HashKind::GitoidSha1 => "gitoid:sha1",
            HashKind::GitoidSha256 => "gitoid:sha256",
        }
    }

    /// Parse a hash kind from its document key.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "sha1" => Ok(HashKind::Sha1),
            "sha256" => Ok(HashKind::Sha256),
            "gitoid:sha1" => Ok(HashKind::GitoidSha1),
            "gitoid:sha256" => Ok(HashKind::GitoidSha256),
            _ => Err(Error::unsupported_algorithm(s)),
        }
    }

    /// The underlying digest algorithm.
    pub fn algorithm(&self) -> Algorithm {
        match self {
            HashKind::Sha1 | HashKind::GitoidSha1 => Algorithm::Sha1,
            HashKind::Sha256 | HashKind::GitoidSha256 => Algorithm::Sha256,
        }
    }

    /// Whether this kind is a gitoid identity rather than a raw digest.
    pub fn is_gitoid(&self) -> bool {
        matches!(self, HashKind::GitoidSha1 | HashKind::GitoidSha256)
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Streaming hasher over either algorithm.
pub(crate) enum Hasher {
    Sha1(sha1::Sha1),
    Sha256(sha2::Sha256),
}

impl Hasher {
    pub(crate) fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Sha1 => Hasher::Sha1(sha1::Sha1::new()),
            Algorithm::Sha256 => Hasher::Sha256(sha2::Sha256::new()),
        }
    }

    pub(crate) fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha1(h) => h.update(data),
            Hasher::Sha256(h) => h.update(data),
        }
    }

    pub(crate) fn finalize_hex(self) -> String {
        match self {
            Hasher::Sha1(h) => hex::encode(h.finalize()),
            Hasher::Sha256(h) => hex::encode(h.finalize()),
        }
    }
}

impl Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_empty() {
        assert_eq!(
            Algorithm::Sha1.digest_bytes(b""),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(
            Algorithm::Sha256.digest_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_digest_hello_world() {
        assert_eq!(
            Algorithm::Sha1.digest_bytes(b"hello world"),
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
        );
        assert_eq!(
            Algorithm::Sha256.digest_bytes(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_digest_reader_matches_bytes() {
        let data = b"some file content".to_vec();
        for algorithm in Algorithm::ALL {
            let from_reader = algorithm.digest_reader(&data[..]).unwrap();
            assert_eq!(from_reader, algorithm.digest_bytes(&data));
            assert_eq!(from_reader.len(), algorithm.hex_len());
        }
    }

    #[test]
    fn test_algorithm_conversions() {
        assert_eq!(Algorithm::parse("sha1").unwrap(), Algorithm::Sha1);
        assert_eq!(Algorithm::parse("SHA-256").unwrap(), Algorithm::Sha256);
        assert!(Algorithm::parse("md5").is_err());

        assert_eq!(Algorithm::Sha1.digest_kind(), HashKind::Sha1);
        assert_eq!(Algorithm::Sha256.gitoid_kind(), HashKind::GitoidSha256);
    }

    #[test]
    fn test_hash_kind_conversions() {
        for kind in [
            HashKind::Sha1,
            HashKind::Sha256,
            HashKind::GitoidSha1,
            HashKind::GitoidSha256,
        ] {
            assert_eq!(HashKind::parse(kind.as_str()).unwrap(), kind);
        }
        assert!(HashKind::GitoidSha1.is_gitoid());
        assert!(!HashKind::Sha256.is_gitoid());
        assert_eq!(HashKind::GitoidSha256.algorithm(), Algorithm::Sha256);
        assert!(HashKind::parse("gitoid:md5").is_err());
    }

    // Property-based tests
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Hashing the same data always produces the same lowercase hex digest
        #[test]
        fn prop_digest_deterministic(data: Vec<u8>) {
            for algorithm in Algorithm::ALL {
                let first = algorithm.digest_bytes(&data);
                let second = algorithm.digest_reader(&data[..])?;
                prop_assert_eq!(&first, &second);
                prop_assert_eq!(first.len(), algorithm.hex_len());
                prop_assert!(first.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
            }
        }
    }
}
