use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// Digest of a single zero byte, used as the preimage placeholder for an
/// absent child or leaf in a [`crate::BranchNode`]'s hash.
pub static NULL_HASH: std::sync::LazyLock<Hash> = std::sync::LazyLock::new(|| digest(&[0x00]));

/// One-shot SHA-256 over `bytes`.
pub fn digest(bytes: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_hash_is_digest_of_zero_byte() {
        assert_eq!(*NULL_HASH, digest(&[0x00]));
    }

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(digest(b"hello"), digest(b"hello"));
        assert_ne!(digest(b"hello"), digest(b"world"));
    }
}
