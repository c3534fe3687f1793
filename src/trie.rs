//! The trie engine: restructuring insert and the store-backed walk that
//! drives it.

use crate::extension::{CompareOutcome, ExtensionCursor};
use crate::hashing;
use crate::node::{BranchNode, ChildNode, HashOfLeaf};
use crate::store::NodeStore;

/// A radix-256 Merkle-Patricia trie over byte-string keys.
///
/// `Tree` is single-writer: [`Tree::insert`] and [`Tree::calculate_hash`]
/// must not be called concurrently with each other or with any read. Every
/// method either completes or panics on an invariant violation — there is
/// no recoverable error path on this type (see [`crate::NodeCodecError`]
/// for the crate's one fallible boundary).
#[derive(Debug, Clone)]
pub struct Tree {
    pub(crate) root: BranchNode,
    pub(crate) store: NodeStore,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// An empty trie.
    pub fn new() -> Self {
        Self { root: BranchNode::new(Vec::new()), store: NodeStore::new() }
    }

    /// Inserts or overwrites `key` with `value`.
    ///
    /// Restructures the trie as needed (leaf split, branch split, or
    /// in-place update) and marks every `HashOfBranch` edge it crosses or
    /// creates as dirty. Does not recompute any hash; call
    /// [`Tree::calculate_hash`] when a fresh root digest is needed.
    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        let key = key.into();
        let value = value.into();
        let mut branch_key: Vec<u8> = Vec::new();
        let mut cursor = ExtensionCursor::new(&key);

        loop {
            let is_root = branch_key.is_empty();
            let node_extension = self.node(is_root, &branch_key).extension.clone();
            let (outcome, m) = cursor.compare_to(&node_extension);

            tracing::trace!(
                target: "merkle_trie::insert",
                branch_key = %hex::encode(&branch_key),
                ?outcome,
                m,
                "dispatch"
            );

            match outcome {
                CompareOutcome::Equals => {
                    self.node_mut(is_root, &branch_key).set_leaf(&key, &value);
                    return;
                }

                CompareOutcome::ContainsOtherExtension => {
                    cursor.advance(m);
                    let b = cursor.peek().expect("a byte follows a fully-matched extension");
                    cursor.advance(1);

                    let node = self.node_mut(is_root, &branch_key);
                    match node.children[b as usize].take() {
                        None => {
                            let leaf = HashOfLeaf::new(&key, &value, cursor.remainder().to_vec());
                            node.children[b as usize] = Some(ChildNode::Leaf(leaf));
                            return;
                        }
                        Some(ChildNode::Leaf(old_leaf)) => {
                            let (r2, m2) = cursor.compare_to(&old_leaf.extension);
                            if r2 == CompareOutcome::Equals {
                                node.children[b as usize] = Some(ChildNode::Leaf(old_leaf));
                                node.update_leaf_child(b, &key, &value);
                                return;
                            }
                            self.split_leaf(is_root, &branch_key, &node_extension, b, &key, &value, &mut cursor, old_leaf, m2);
                            return;
                        }
                        Some(ChildNode::Branch(mut hob)) => {
                            hob.dirty = true;
                            node.children[b as usize] = Some(ChildNode::Branch(hob));
                            branch_key.extend_from_slice(&node_extension);
                            branch_key.push(b);
                        }
                    }
                }

                CompareOutcome::Substring | CompareOutcome::Diverge => {
                    self.split_branch(is_root, &branch_key, &key, &value, &mut cursor, m);
                    return;
                }
            }
        }
    }

    /// Splits a `HashOfLeaf` child into a fresh `BranchNode` holding the
    /// old and new leaves, per the trie engine's leaf-split case.
    #[allow(clippy::too_many_arguments)]
    fn split_leaf(
        &mut self,
        is_root: bool,
        branch_key: &[u8],
        node_extension: &[u8],
        b: u8,
        key: &[u8],
        value: &[u8],
        cursor: &mut ExtensionCursor<'_>,
        old_leaf: HashOfLeaf,
        m2: usize,
    ) {
        let new_branch_key = {
            let mut bk = branch_key.to_vec();
            bk.extend_from_slice(node_extension);
            bk.push(b);
            bk
        };

        let mut n = BranchNode::new(cursor.slice_until(m2).to_vec());

        let mut old_cursor = ExtensionCursor::new(&old_leaf.extension);
        old_cursor.advance(m2);
        let c_old = old_cursor.peek();
        old_cursor.advance(1);
        let old_leaf_tail = HashOfLeaf { hash: old_leaf.hash, extension: old_cursor.remainder().to_vec() };
        match c_old {
            Some(c) => n.children[c as usize] = Some(ChildNode::Leaf(old_leaf_tail)),
            None => n.leaf = Some(old_leaf_tail),
        }

        cursor.advance(m2);
        let c_new = cursor.peek();
        cursor.advance(1);
        let new_leaf = HashOfLeaf::new(key, value, cursor.remainder().to_vec());
        match c_new {
            Some(c) => n.children[c as usize] = Some(ChildNode::Leaf(new_leaf)),
            None => n.leaf = Some(new_leaf),
        }

        let stub = n.create_stub();
        self.node_mut(is_root, branch_key).children[b as usize] = Some(ChildNode::Branch(stub));
        self.store.insert(new_branch_key, n);
    }

    /// Splits the current node's own extension into a fresh `BranchNode`
    /// sitting above it, per the trie engine's branch-split case.
    fn split_branch(
        &mut self,
        is_root: bool,
        branch_key: &[u8],
        key: &[u8],
        value: &[u8],
        cursor: &mut ExtensionCursor<'_>,
        m: usize,
    ) {
        let new_ext = cursor.slice_until(m).to_vec();
        let mut n = BranchNode::new(new_ext.clone());

        cursor.advance(m);
        let c_new = cursor.peek();
        cursor.advance(1);
        let new_leaf = HashOfLeaf::new(key, value, cursor.remainder().to_vec());
        match c_new {
            Some(c) => n.children[c as usize] = Some(ChildNode::Leaf(new_leaf)),
            None => n.leaf = Some(new_leaf),
        }

        let mut old_node = if is_root {
            std::mem::replace(&mut self.root, n)
        } else {
            self.store.insert(branch_key.to_vec(), n).expect("branch_key must reference an existing branch")
        };

        old_node.truncate_extension(m);
        let c_old = old_node.extension[0];
        old_node.truncate_extension(1);
        let stub = old_node.create_stub();

        self.node_mut(is_root, branch_key).children[c_old as usize] = Some(ChildNode::Branch(stub));

        let mut old_key = branch_key.to_vec();
        old_key.extend_from_slice(&new_ext);
        old_key.push(c_old);
        self.store.insert(old_key, old_node);
    }

    fn node(&self, is_root: bool, branch_key: &[u8]) -> &BranchNode {
        if is_root {
            &self.root
        } else {
            self.store.get(branch_key).expect("branch_key must reference an existing branch")
        }
    }

    fn node_mut(&mut self, is_root: bool, branch_key: &[u8]) -> &mut BranchNode {
        if is_root {
            &mut self.root
        } else {
            self.store.get_mut(branch_key).expect("branch_key must reference an existing branch")
        }
    }

    /// Looks up the `BranchNode` stored at `branch_key`. Returns `None` for
    /// a key with no corresponding branch; use `&[]` or [`Tree::get_root_node`]
    /// for the root, which is never stored.
    pub fn get_branch_node(&self, branch_key: &[u8]) -> Option<&BranchNode> {
        self.store.get(branch_key)
    }

    /// The root `BranchNode`.
    pub fn get_root_node(&self) -> &BranchNode {
        &self.root
    }

    /// Number of branches held in the node store, excluding the root.
    pub fn db_size(&self) -> usize {
        self.store.len()
    }

    /// The node store, for read-only iteration.
    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// Recomputes the hash of every branch reached by a dirty edge, clears
    /// those edges' dirty flags, and returns the number of branches
    /// visited. Idempotent: calling this twice with no intervening insert
    /// returns `0` on the second call.
    pub fn calculate_hash(&mut self) -> usize {
        hashing::calculate_hash(self)
    }

    /// Recursively dumps the trie's shape via `tracing::debug!`.
    pub fn print_tree(&self) {
        Self::print_branch(&self.root, Vec::new(), 0, &self.store);
    }

    fn print_branch(branch: &BranchNode, branch_key: Vec<u8>, depth: usize, store: &NodeStore) {
        tracing::debug!(
            target: "merkle_trie::print_tree",
            depth,
            branch_key = %hex::encode(&branch_key),
            extension = %hex::encode(&branch.extension),
            hash = %hex::encode(branch.hash),
            has_leaf = branch.leaf.is_some(),
            "branch"
        );
        for slot in 0u16..=255 {
            let slot = slot as u8;
            match &branch.children[slot as usize] {
                Some(ChildNode::Leaf(leaf)) => {
                    tracing::debug!(
                        target: "merkle_trie::print_tree",
                        depth = depth + 1,
                        slot,
                        extension = %hex::encode(&leaf.extension),
                        hash = %hex::encode(leaf.hash),
                        "leaf"
                    );
                }
                Some(ChildNode::Branch(hob)) => {
                    let mut child_key = branch_key.clone();
                    child_key.extend_from_slice(&branch.extension);
                    child_key.push(slot);
                    tracing::debug!(
                        target: "merkle_trie::print_tree",
                        depth = depth + 1,
                        slot,
                        dirty = hob.dirty,
                        "branch-stub"
                    );
                    if let Some(child) = store.get(&child_key) {
                        Self::print_branch(child, child_key, depth + 1, store);
                    }
                }
                None => {}
            }
        }
    }
}
