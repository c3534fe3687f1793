//! Lazy hashing: recomputes only the branches reached by a dirty
//! `HashOfBranch` edge, in a depth-first post-order walk.

use crate::node::{BranchNode, ChildNode};
use crate::trie::Tree;

/// Recomputes the hash of every branch reached by a dirty edge, writing the
/// new hash into the parent's `HashOfBranch` and clearing its dirty flag.
/// Returns the number of branches visited.
pub(crate) fn calculate_hash(tree: &mut Tree) -> usize {
    let mut visited = 0;
    count_and_hash(Vec::new(), &mut tree.root, &mut tree.store, &mut visited);
    visited
}

fn count_and_hash(
    branch_key: Vec<u8>,
    branch: &mut BranchNode,
    store: &mut crate::NodeStore,
    visited: &mut usize,
) {
    for slot in 0u16..=255 {
        let slot = slot as u8;
        let is_dirty =
            matches!(&branch.children[slot as usize], Some(ChildNode::Branch(hob)) if hob.dirty);
        if !is_dirty {
            continue;
        }

        let mut child_key = branch_key.clone();
        child_key.extend_from_slice(&branch.extension);
        child_key.push(slot);

        let mut child = store
            .remove(&child_key)
            .expect("a dirty HashOfBranch must reference a branch present in the store");

        tracing::trace!(
            target: "merkle_trie::hash",
            branch_key = %hex::encode(&child_key),
            "descend"
        );

        count_and_hash(child_key.clone(), &mut child, store, visited);

        if let Some(ChildNode::Branch(hob)) = &mut branch.children[slot as usize] {
            hob.hash = child.hash;
            hob.dirty = false;
        }

        tracing::trace!(
            target: "merkle_trie::hash",
            branch_key = %hex::encode(&child_key),
            hash = %hex::encode(child.hash),
            "ascend"
        );

        store.insert(child_key, child);
        *visited += 1;
    }

    branch.compute_hash();
}
