//! Node algebra: the three node variants that make up a trie, and the
//! operations the trie engine and hashing pass perform on them.

use crate::hash::{digest, Hash, NULL_HASH};

/// Number of byte-valued child slots a [`BranchNode`] holds.
pub const BRANCHING_FACTOR: usize = 256;

/// A terminal node: the content digest of a single key/value pair, plus the
/// key suffix remaining after the branching point that led to this slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashOfLeaf {
    /// `digest(le_u64(len(key)) ‖ key ‖ value)`.
    pub hash: Hash,
    /// Key bytes remaining after the path that reached this slot.
    pub extension: Vec<u8>,
}

impl HashOfLeaf {
    /// Builds a leaf for `key`/`value`, terminating the path with `extension`
    /// (the key suffix not already consumed by the walk).
    pub fn new(key: &[u8], value: &[u8], extension: Vec<u8>) -> Self {
        let mut preimage = Vec::with_capacity(8 + key.len() + value.len());
        preimage.extend_from_slice(&(key.len() as u64).to_le_bytes());
        preimage.extend_from_slice(key);
        preimage.extend_from_slice(value);
        Self { hash: digest(&preimage), extension }
    }
}

/// A parent-held stub standing in for a [`BranchNode`] that lives in the
/// [`crate::NodeStore`]. Carries that branch's extension and a cached hash
/// that is stale whenever `dirty` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashOfBranch {
    /// Cached hash of the referenced branch; stale if `dirty`.
    pub hash: Hash,
    /// Extension of the referenced branch.
    pub extension: Vec<u8>,
    /// Whether an insert has touched the referenced branch since the last
    /// hashing pass.
    pub dirty: bool,
}

/// The occupant of one of a [`BranchNode`]'s 256 child slots. Structurally
/// excludes a raw nested `BranchNode` — every interior edge must go through
/// a [`HashOfBranch`] stub, per the trie's first invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildNode {
    /// The path terminates in a leaf at this slot.
    Leaf(HashOfLeaf),
    /// The path continues into a branch held in the node store.
    Branch(HashOfBranch),
}

/// A true interior node: up to 256 byte-indexed children plus an optional
/// leaf for a key that ends exactly at this branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchNode {
    /// Hash of this branch, valid once all descendant dirty edges have been
    /// recomputed and folded in.
    pub hash: Hash,
    /// Compressed path bytes shared by every child of this branch.
    pub extension: Vec<u8>,
    /// Present iff some inserted key equals exactly the path reaching this
    /// branch followed by its extension.
    pub leaf: Option<HashOfLeaf>,
    /// The 256 byte-indexed child slots.
    pub children: Box<[Option<ChildNode>; BRANCHING_FACTOR]>,
}

impl BranchNode {
    /// An empty branch with the given extension and no children or leaf.
    pub fn new(extension: Vec<u8>) -> Self {
        Self {
            hash: *NULL_HASH,
            extension,
            leaf: None,
            children: Box::new(std::array::from_fn(|_| None)),
        }
    }

    /// Installs (or overwrites) the leaf slot for a key terminating exactly
    /// at this branch.
    pub fn set_leaf(&mut self, key: &[u8], value: &[u8]) {
        self.leaf = Some(HashOfLeaf::new(key, value, Vec::new()));
    }

    /// Recomputes the `HashOfLeaf` at child slot `slot` in place, preserving
    /// its extension.
    pub fn update_leaf_child(&mut self, slot: u8, key: &[u8], value: &[u8]) {
        let extension = match &self.children[slot as usize] {
            Some(ChildNode::Leaf(leaf)) => leaf.extension.clone(),
            other => unreachable!("update_leaf_child on non-leaf slot: {other:?}"),
        };
        self.children[slot as usize] = Some(ChildNode::Leaf(HashOfLeaf::new(key, value, extension)));
    }

    /// Drops the first `n` bytes of this node's extension, saturating at its
    /// length.
    pub fn truncate_extension(&mut self, n: usize) {
        let n = n.min(self.extension.len());
        self.extension.drain(..n);
    }

    /// Exchanges the occupant of `slot` with `other`, returning the previous
    /// occupant.
    pub fn swap_child(&mut self, slot: u8, other: Option<ChildNode>) -> Option<ChildNode> {
        std::mem::replace(&mut self.children[slot as usize], other)
    }

    /// Produces the dirty stub parents use to reference this branch once it
    /// has been (or will be) placed in the node store.
    pub fn create_stub(&self) -> HashOfBranch {
        HashOfBranch { hash: self.hash, extension: self.extension.clone(), dirty: true }
    }

    /// Recomputes and stores this node's hash from its leaf and 256 children,
    /// per the canonical preimage `H_leaf ‖ H_0 ‖ … ‖ H_255`.
    pub fn compute_hash(&mut self) {
        let mut preimage = Vec::with_capacity(32 * (BRANCHING_FACTOR + 1));
        preimage.extend_from_slice(&self.child_hash_for_leaf());
        for slot in 0..BRANCHING_FACTOR {
            preimage.extend_from_slice(&self.child_hash(slot as u8));
        }
        self.hash = digest(&preimage);
    }

    fn child_hash_for_leaf(&self) -> Hash {
        self.leaf.as_ref().map_or(*NULL_HASH, |leaf| leaf.hash)
    }

    fn child_hash(&self, slot: u8) -> Hash {
        match &self.children[slot as usize] {
            None => *NULL_HASH,
            Some(ChildNode::Leaf(leaf)) => leaf.hash,
            Some(ChildNode::Branch(stub)) => stub.hash,
        }
    }
}

/// The generic node enum used by the wire-format codec and the node store's
/// values. Unlike [`ChildNode`], this includes [`BranchNode`] directly,
/// since store entries and the root *are* branches rather than edges to one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// See [`HashOfBranch`].
    HashOfBranch(HashOfBranch),
    /// See [`HashOfLeaf`].
    HashOfLeaf(HashOfLeaf),
    /// See [`BranchNode`].
    BranchNode(BranchNode),
    /// Absence of a node, used in the wire format for empty child/leaf slots.
    Null,
}

impl From<ChildNode> for Node {
    fn from(child: ChildNode) -> Self {
        match child {
            ChildNode::Leaf(leaf) => Self::HashOfLeaf(leaf),
            ChildNode::Branch(branch) => Self::HashOfBranch(branch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn set_leaf_is_idempotent_on_same_value() {
        let mut branch = BranchNode::new(Vec::new());
        branch.set_leaf(b"key", b"value");
        let first = branch.leaf.clone();
        branch.set_leaf(b"key", b"value");
        assert_eq!(branch.leaf, first);
    }

    #[test]
    fn update_leaf_child_preserves_extension() {
        let mut branch = BranchNode::new(Vec::new());
        branch.children[5] = Some(ChildNode::Leaf(HashOfLeaf::new(b"a", b"1", vec![9, 9])));
        branch.update_leaf_child(5, b"a", b"2");
        assert_matches!(&branch.children[5], Some(ChildNode::Leaf(leaf)) if leaf.extension == vec![9, 9]);
    }

    #[test]
    fn truncate_extension_saturates() {
        let mut branch = BranchNode::new(vec![1, 2, 3]);
        branch.truncate_extension(10);
        assert!(branch.extension.is_empty());
    }

    #[test]
    fn compute_hash_changes_with_children() {
        let mut branch = BranchNode::new(Vec::new());
        branch.compute_hash();
        let empty_hash = branch.hash;

        branch.children[0] = Some(ChildNode::Leaf(HashOfLeaf::new(b"k", b"v", Vec::new())));
        branch.compute_hash();
        assert_ne!(branch.hash, empty_hash);
    }

    #[test]
    fn compute_hash_covers_slot_255() {
        let mut a = BranchNode::new(Vec::new());
        let mut b = BranchNode::new(Vec::new());
        a.children[255] = Some(ChildNode::Leaf(HashOfLeaf::new(b"k", b"v", Vec::new())));
        a.compute_hash();
        b.compute_hash();
        assert_ne!(a.hash, b.hash, "slot 255 must contribute to the hash preimage");
    }

    #[test]
    fn create_stub_is_dirty_and_carries_extension() {
        let branch = BranchNode::new(vec![1, 2]);
        let stub = branch.create_stub();
        assert!(stub.dirty);
        assert_eq!(stub.extension, vec![1, 2]);
    }
}
