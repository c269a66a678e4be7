//! The buffer pool's bucket hash: a 64-bit xxh3 digest of a page's
//! `(space_id, page_no)` pair.

use xxhash_rust::xxh3::xxh3_64;

/// Hash a page identifier for buffer-pool bucket placement.
pub fn hash_page_id(space_id: u32, page_no: u32) -> u64 {
    let mut buf = [0u8; 8];
    buf[0..4].copy_from_slice(&space_id.to_le_bytes());
    buf[4..8].copy_from_slice(&page_no.to_le_bytes());
    xxh3_64(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash_page_id(1, 2), hash_page_id(1, 2));
    }

    #[test]
    fn different_page_numbers_hash_differently() {
        assert_ne!(hash_page_id(1, 2), hash_page_id(1, 3));
    }

    #[test]
    fn different_spaces_hash_differently() {
        assert_ne!(hash_page_id(1, 2), hash_page_id(2, 2));
    }
}
