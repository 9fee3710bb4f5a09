//! Aggregation nodes: one per directory and algorithm.

use crate::error::Result;
use crate::gitoid;
use crate::hash::Algorithm;

/// Accumulates child references until the directory's identity is fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationNode {
    algorithm: Algorithm,
    references: Vec<String>,
}

impl AggregationNode {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            references: Vec::new(),
        }
    }

    /// Append a child's identity.
    ///
    /// Fails if `reference` is not a gitoid for this node's algorithm.
    pub fn add_existing_reference(&mut self, reference: &str) -> Result<()> {
        gitoid::validate(self.algorithm, reference)?;
        self.references.push(reference.to_string());
        Ok(())
    }

    /// References in append order.
    pub fn references(&self) -> &[String] {
        &self.references
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Encode the manifest and fix the identity.
    pub fn finalize(self) -> FinalizedNode {
        let manifest =
            gitoid::encode_manifest(self.algorithm, self.references.iter().map(String::as_str));
        let identity = gitoid::from_bytes(self.algorithm, manifest.as_bytes());
        FinalizedNode { identity, manifest }
    }
}

/// An aggregation node whose identity can no longer change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedNode {
    identity: String,
    manifest: String,
}

impl FinalizedNode {
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// The serialized node: the manifest the identity was computed over.
    pub fn manifest(&self) -> &str {
        &self.manifest
    }
}
