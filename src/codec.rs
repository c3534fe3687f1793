//! Bit-exact binary serialization of [`Node`]s.
//!
//! ```text
//! node      := tag(1) ‖ hash(32) ‖ ext_len(8) ‖ ext(ext_len) ‖ variant_tail
//! tag       := 0x00 HashOfBranch | 0x01 HashOfLeaf | 0x02 BranchNode | 0x03 Null
//! ```
//!
//! Multi-byte fields are little-endian, a deliberate deviation from the
//! host-endian layout of the system this crate's design is grounded on —
//! see `SPEC_FULL.md` §9.

use crate::error::NodeCodecError;
use crate::node::{BranchNode, ChildNode, HashOfBranch, HashOfLeaf, Node, BRANCHING_FACTOR};

const TAG_HASH_OF_BRANCH: u8 = 0x00;
const TAG_HASH_OF_LEAF: u8 = 0x01;
const TAG_BRANCH_NODE: u8 = 0x02;
const TAG_NULL: u8 = 0x03;

/// Encodes `node` into its bit-exact wire format.
pub fn encode(node: &Node) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(node, &mut out);
    out
}

fn encode_into(node: &Node, out: &mut Vec<u8>) {
    match node {
        Node::HashOfBranch(hob) => {
            out.push(TAG_HASH_OF_BRANCH);
            out.extend_from_slice(&hob.hash);
            write_bytes(out, &hob.extension);
            out.push(u8::from(hob.dirty));
        }
        Node::HashOfLeaf(leaf) => {
            out.push(TAG_HASH_OF_LEAF);
            out.extend_from_slice(&leaf.hash);
            write_bytes(out, &leaf.extension);
        }
        Node::BranchNode(branch) => {
            out.push(TAG_BRANCH_NODE);
            out.extend_from_slice(&branch.hash);
            write_bytes(out, &branch.extension);
            let leaf_node = branch.leaf.clone().map_or(Node::Null, |leaf| Node::HashOfLeaf(leaf));
            encode_into(&leaf_node, out);
            for slot in 0..BRANCHING_FACTOR {
                let child_node =
                    branch.children[slot].clone().map_or(Node::Null, Node::from);
                encode_into(&child_node, out);
            }
        }
        Node::Null => out.push(TAG_NULL),
    }
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    out.extend_from_slice(bytes);
}

/// Decodes a single [`Node`] from the front of `bytes`, returning it along
/// with the number of bytes consumed.
pub fn decode(bytes: &[u8]) -> Result<(Node, usize), NodeCodecError> {
    let mut cursor = Cursor { bytes, pos: 0 };
    let node = cursor.decode_node()?;
    Ok((node, cursor.pos))
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], NodeCodecError> {
        let available = self.bytes.len() - self.pos;
        if available < n {
            return Err(NodeCodecError::UnexpectedEof { needed: n, available });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, NodeCodecError> {
        Ok(self.take(1)?[0])
    }

    fn read_hash(&mut self) -> Result<[u8; 32], NodeCodecError> {
        self.take(32)?.try_into().expect("take(32) yields a 32-byte slice")
    }

    fn read_bytes(&mut self) -> Result<Vec<u8>, NodeCodecError> {
        let len_bytes: [u8; 8] = self.take(8)?.try_into().expect("take(8) yields an 8-byte slice");
        let len = u64::from_le_bytes(len_bytes) as usize;
        Ok(self.take(len)?.to_vec())
    }

    fn decode_node(&mut self) -> Result<Node, NodeCodecError> {
        let tag = self.read_u8()?;
        match tag {
            TAG_HASH_OF_BRANCH => {
                let hash = self.read_hash()?;
                let extension = self.read_bytes()?;
                let dirty = self.read_u8()? != 0;
                Ok(Node::HashOfBranch(HashOfBranch { hash, extension, dirty }))
            }
            TAG_HASH_OF_LEAF => {
                let hash = self.read_hash()?;
                let extension = self.read_bytes()?;
                Ok(Node::HashOfLeaf(HashOfLeaf { hash, extension }))
            }
            TAG_BRANCH_NODE => {
                let hash = self.read_hash()?;
                let extension = self.read_bytes()?;
                let leaf = match self.decode_node()? {
                    Node::Null => None,
                    Node::HashOfLeaf(leaf) => Some(leaf),
                    other => unreachable!("branch leaf slot decoded to {other:?}"),
                };
                let mut children = Box::new(std::array::from_fn(|_| None));
                for slot in 0..BRANCHING_FACTOR {
                    children[slot] = match self.decode_node()? {
                        Node::Null => None,
                        Node::HashOfLeaf(leaf) => Some(ChildNode::Leaf(leaf)),
                        Node::HashOfBranch(hob) => Some(ChildNode::Branch(hob)),
                        Node::BranchNode(_) => {
                            unreachable!("branch child slot decoded to a raw BranchNode")
                        }
                    };
                }
                Ok(Node::BranchNode(BranchNode { hash, extension, leaf, children }))
            }
            TAG_NULL => Ok(Node::Null),
            other => Err(NodeCodecError::UnknownTag(other)),
        }
    }
}
