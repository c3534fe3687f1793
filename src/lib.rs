#![doc = include_str!("../README.md")]
#![warn(missing_docs, unreachable_pub, rust_2018_idioms)]

mod hash;
pub use hash::{digest, Hash, NULL_HASH};

mod extension;
pub use extension::{CompareOutcome, ExtensionCursor};

mod node;
pub use node::{BranchNode, ChildNode, HashOfBranch, HashOfLeaf, Node};

mod error;
pub use error::NodeCodecError;

mod codec;

mod store;
pub use store::NodeStore;

mod trie;
pub use trie::Tree;

mod hashing;

/// Encodes and decodes [`Node`]s to and from their bit-exact wire format.
pub mod wire {
    pub use crate::codec::{decode, encode};
}
