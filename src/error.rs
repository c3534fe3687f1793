use derive_more::{Display, From};

/// Errors produced while decoding a [`crate::Node`] from its binary wire
/// format.
///
/// This is the only fallible boundary the crate exposes: the in-process
/// [`crate::Tree`] API never returns a `Result` and instead asserts on
/// invariant violations, per its single-writer, infallible design.
#[derive(Debug, Display, From, thiserror::Error)]
pub enum NodeCodecError {
    /// The input buffer ended before a fixed-size field could be read.
    #[display("unexpected end of input: needed {needed} bytes, had {available}")]
    UnexpectedEof {
        /// Bytes required to decode the current field.
        needed: usize,
        /// Bytes actually remaining in the buffer.
        available: usize,
    },
    /// The leading tag byte did not match any known node variant.
    #[display("unknown node tag: {0:#x}")]
    UnknownTag(u8),
}
