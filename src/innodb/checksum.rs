//! Page checksum: CRC-32 (IEEE polynomial) over the page body excluding the
//! trailer's own checksum field.
//!
//! The source tool this core is grounded on computes a dual-range CRC-32C
//! (Castagnoli) checksum plus two legacy fold-based schemes. This format
//! specifies a single CRC-32 (IEEE) range instead, so `crc32fast` (IEEE) is
//! used in place of the source tool's `crc32c` dependency.

use crate::innodb::constants::{BUF_NO_CHECKSUM_MAGIC, CHECKSUM_RANGE_END};

/// Compute the CRC-32 (IEEE) checksum over `page[0..CHECKSUM_RANGE_END)`.
///
/// Panics if `page` is shorter than `CHECKSUM_RANGE_END`; callers are
/// expected to have already validated the page length via
/// [`crate::innodb::page::PAGE_SIZE`].
pub fn compute(page: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&page[..CHECKSUM_RANGE_END]);
    hasher.finalize()
}

/// Outcome of validating a page's stored checksum against its recomputed
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumResult {
    pub stored: u32,
    pub computed: u32,
    pub valid: bool,
}

/// Validate a page's trailer checksum.
///
/// An all-zero page (never written) and a page whose stored checksum is the
/// legacy "no checksum" magic both bypass the mismatch check, mirroring the
/// source tool's handling of unwritten/placeholder pages.
pub fn validate(page: &[u8], stored: u32) -> ChecksumResult {
    if page.iter().all(|&b| b == 0) || stored == BUF_NO_CHECKSUM_MAGIC {
        return ChecksumResult {
            stored,
            computed: stored,
            valid: true,
        };
    }
    let computed = compute(page);
    ChecksumResult {
        stored,
        computed,
        valid: computed == stored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_zero_page_is_valid_regardless_of_stored() {
        let page = vec![0u8; 16384];
        let result = validate(&page, 0xABCD1234);
        assert!(result.valid);
    }

    #[test]
    fn no_checksum_magic_is_valid() {
        let mut page = vec![0u8; 16384];
        page[0] = 0xFF;
        let result = validate(&page, BUF_NO_CHECKSUM_MAGIC);
        assert!(result.valid);
    }

    #[test]
    fn mismatched_checksum_is_invalid() {
        let mut page = vec![0u8; 16384];
        page[10] = 0x42;
        let computed = compute(&page);
        let result = validate(&page, computed.wrapping_add(1));
        assert!(!result.valid);
        assert_eq!(result.computed, computed);
    }

    #[test]
    fn single_byte_flip_changes_checksum() {
        let mut page = vec![0u8; 16384];
        page[10] = 0x42;
        let before = compute(&page);
        page[100] ^= 0x01;
        let after = compute(&page);
        assert_ne!(before, after);
    }
}
