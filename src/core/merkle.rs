//! Transaction Log Commitments
//!
//! Binary SHA-256 Merkle tree over transaction fingerprints. The root
//! commits to the whole append-only log; an inclusion proof shows a single
//! transaction belongs to it without shipping the rest of the log.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::hash::Fingerprint;

/// Domain separator for internal nodes.
const NODE_DOMAIN: &[u8] = b"POK_MERKLE_NODE_V1";

/// Domain separator for padding leaves and the empty root.
const EMPTY_DOMAIN: &[u8] = b"POK_MERKLE_EMPTY_V1";

fn empty_hash() -> Fingerprint {
    Sha256::digest(EMPTY_DOMAIN).into()
}

fn hash_nodes(left: &Fingerprint, right: &Fingerprint) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(NODE_DOMAIN);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Which side of the path node a sibling sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Sibling is the left child.
    Left,
    /// Sibling is the right child.
    Right,
}

/// Merkle inclusion proof for one leaf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Position of the leaf in the log.
    pub leaf_index: usize,
    /// Sibling hashes from the leaf level up.
    pub siblings: Vec<(Fingerprint, Side)>,
}

impl MerkleProof {
    /// Recompute the root from `leaf` and compare.
    pub fn verify(&self, root: &Fingerprint, leaf: &Fingerprint) -> bool {
        let computed = self.siblings.iter().fold(*leaf, |acc, (sibling, side)| match side {
            Side::Left => hash_nodes(sibling, &acc),
            Side::Right => hash_nodes(&acc, sibling),
        });
        computed == *root
    }
}

/// Fully built Merkle tree. Leaves are padded to a power of two.
#[derive(Clone, Debug, Default)]
pub struct MerkleTree {
    leaf_count: usize,
    /// Leaves at index 0, root level last.
    levels: Vec<Vec<Fingerprint>>,
}

impl MerkleTree {
    /// Build from pre-hashed leaves.
    pub fn from_leaf_hashes(leaves: Vec<Fingerprint>) -> Self {
        let leaf_count = leaves.len();
        if leaf_count == 0 {
            return Self::default();
        }

        let mut level = leaves;
        level.resize(leaf_count.next_power_of_two(), empty_hash());

        let mut levels = vec![level];
        while let Some(top) = levels.last().filter(|l| l.len() > 1) {
            let next: Vec<Fingerprint> = top
                .chunks(2)
                .map(|pair| hash_nodes(&pair[0], &pair[1]))
                .collect();
            levels.push(next);
        }

        Self { leaf_count, levels }
    }

    /// Number of real (unpadded) leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Root hash; a fixed sentinel for an empty tree.
    pub fn root(&self) -> Fingerprint {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or_else(empty_hash)
    }

    /// Inclusion proof for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaf_count {
            return None;
        }

        let mut siblings = Vec::with_capacity(self.levels.len().saturating_sub(1));
        let mut position = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let (sibling, side) = if position % 2 == 0 {
                (position + 1, Side::Right)
            } else {
                (position - 1, Side::Left)
            };
            siblings.push((level[sibling], side));
            position /= 2;
        }

        Some(MerkleProof {
            leaf_index: index,
            siblings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hash::hash_with_domain;

    fn leaves(n: usize) -> Vec<Fingerprint> {
        (0..n)
            .map(|i| hash_with_domain(b"test-leaf", format!("tx_{}", i).as_bytes()))
            .collect()
    }

    #[test]
    fn test_empty_tree() {
        let tree = MerkleTree::from_leaf_hashes(Vec::new());
        assert_eq!(tree.root(), empty_hash());
        assert_eq!(tree.leaf_count(), 0);
        assert!(tree.proof(0).is_none());
    }

    #[test]
    fn test_single_leaf_proof() {
        let leaf = leaves(1);
        let tree = MerkleTree::from_leaf_hashes(leaf.clone());
        assert_eq!(tree.root(), leaf[0]);

        let proof = tree.proof(0).unwrap();
        assert!(proof.siblings.is_empty());
        assert!(proof.verify(&tree.root(), &leaf[0]));
    }

    #[test]
    fn test_root_changes_with_leaves() {
        let a = MerkleTree::from_leaf_hashes(leaves(4));
        let mut altered = leaves(4);
        altered[3] = hash_with_domain(b"test-leaf", b"tampered");
        let b = MerkleTree::from_leaf_hashes(altered);
        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn test_appending_changes_root() {
        let a = MerkleTree::from_leaf_hashes(leaves(3));
        let b = MerkleTree::from_leaf_hashes(leaves(4));
        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn test_every_proof_verifies() {
        let data = leaves(13);
        let tree = MerkleTree::from_leaf_hashes(data.clone());
        let root = tree.root();

        for (i, leaf) in data.iter().enumerate() {
            let proof = tree.proof(i).unwrap();
            assert_eq!(proof.leaf_index, i);
            assert!(proof.verify(&root, leaf), "leaf {} failed", i);
        }
        assert!(tree.proof(13).is_none());
    }

    #[test]
    fn test_proof_rejects_wrong_leaf() {
        let data = leaves(4);
        let tree = MerkleTree::from_leaf_hashes(data.clone());
        let proof = tree.proof(1).unwrap();
        assert!(!proof.verify(&tree.root(), &data[2]));
    }
}
