//! Content digest of a rendered block.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `block`, hashed after normalising line endings
/// to LF so that checkouts with CRLF endings agree with LF ones.
pub fn digest(block: &str) -> String {
    let normalized = block.replace("\r\n", "\n");
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        assert_eq!(
            digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn crlf_and_lf_share_the_same_digest() {
        assert_eq!(digest("a\r\nb\r\n"), digest("a\nb\n"));
    }

    #[test]
    fn different_blocks_differ() {
        assert_ne!(digest("a\nb"), digest("a\nc"));
    }
}
