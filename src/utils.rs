//! Utility functions for identifiers and index keys

use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique time-ordered id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

/// Index key `len(owner) owner seq`, big-endian so that a reversed prefix scan yields
/// newest first.
pub fn index_key(owner: &str, seq: u64) -> Vec<u8> {
    let mut key = index_prefix(owner);
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

/// The owner is length-prefixed, so no other owner id can extend this prefix.
pub fn index_prefix(owner: &str) -> Vec<u8> {
    let len = owner.len() as u32;
    let mut key = Vec::with_capacity(owner.len() + 12);
    key.extend_from_slice(&len.to_be_bytes());
    key.extend_from_slice(owner.as_bytes());
    key
}

/// Digest identifying the (book, requester) pair in the active request index.
pub fn pair_digest(book_id: &str, requester_id: &str) -> String {
    let mut material = String::with_capacity(book_id.len() + requester_id.len() + 1);
    material.push_str(book_id);
    material.push('\0');
    material.push_str(requester_id);
    sha256::digest(material)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_keys_sort_by_sequence() {
        let a = index_key("user_a", 1);
        let b = index_key("user_a", 256);
        assert!(a < b);
        assert!(a.starts_with(&index_prefix("user_a")));
    }

    #[test]
    fn prefix_does_not_match_longer_owner() {
        let key = index_key("user_ab", 7);
        assert!(!key.starts_with(&index_prefix("user_a")));
    }

    #[test]
    fn prefix_does_not_match_owner_with_embedded_nul() {
        let key = index_key("user_a\0mallory", 7);
        assert!(!key.starts_with(&index_prefix("user_a")));
    }

    #[test]
    fn pair_digest_is_order_sensitive() {
        assert_ne!(pair_digest("a", "b"), pair_digest("b", "a"));
        assert_eq!(pair_digest("a", "b"), pair_digest("a", "b"));
    }
}
