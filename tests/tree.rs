//! Integration tests exercising `Tree` end to end: insertion, hashing, and
//! the relationship between the node store and the parent `HashOfBranch`
//! stubs that reference it.

use merkle_radix_trie::{ChildNode, Tree};

#[test]
fn calculate_hash_chains_backward_through_the_store() {
    let mut tree = Tree::new();
    // A set of keys chosen to produce several nested branches, each one
    // byte deeper than the last.
    let keys: &[&[u8]] = &[
        &[1],
        &[1, 2],
        &[1, 2, 3],
        &[1, 2, 3, 4],
        &[1, 2, 3, 4, 5],
        &[9, 9],
    ];
    for (i, key) in keys.iter().enumerate() {
        tree.insert(key.to_vec(), vec![i as u8]);
    }

    tree.calculate_hash();

    // Every branch key's last byte names the slot in the *preceding*
    // store entry (in ascending-key order) that must hold a HashOfBranch
    // whose cached hash matches this branch's own hash.
    let mut prev: Option<(&Vec<u8>, &merkle_radix_trie::BranchNode)> = None;
    for (branch_key, branch) in tree.store().iter() {
        if let Some((_, prev_branch)) = prev {
            let slot = *branch_key.last().expect("branch keys are never empty");
            match &prev_branch.children[slot as usize] {
                Some(ChildNode::Branch(hob)) => {
                    assert!(!hob.dirty);
                    assert_eq!(hob.hash, branch.hash);
                }
                other => panic!("expected a branch stub at slot {slot}, got {other:?}"),
            }
        }
        prev = Some((branch_key, branch));
    }
}

#[test]
fn insert_order_does_not_affect_root_hash() {
    let keys_and_values: Vec<(Vec<u8>, Vec<u8>)> = vec![
        (b"apple".to_vec(), b"1".to_vec()),
        (b"application".to_vec(), b"2".to_vec()),
        (b"apply".to_vec(), b"3".to_vec()),
        (b"banana".to_vec(), b"4".to_vec()),
        (b"band".to_vec(), b"5".to_vec()),
    ];

    let mut forward = Tree::new();
    for (k, v) in &keys_and_values {
        forward.insert(k.clone(), v.clone());
    }
    forward.calculate_hash();

    let mut backward = Tree::new();
    for (k, v) in keys_and_values.iter().rev() {
        backward.insert(k.clone(), v.clone());
    }
    backward.calculate_hash();

    assert_eq!(forward.get_root_node().hash, backward.get_root_node().hash);
}

#[test]
fn overwriting_a_value_changes_the_root_hash() {
    let mut tree = Tree::new();
    tree.insert(b"key".to_vec(), b"v1".to_vec());
    tree.calculate_hash();
    let first = tree.get_root_node().hash;

    tree.insert(b"key".to_vec(), b"v2".to_vec());
    tree.calculate_hash();
    let second = tree.get_root_node().hash;

    assert_ne!(first, second);
}
