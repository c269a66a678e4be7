//! Page type tag definitions.
//!
//! Maps the 2-byte page type field (bytes 24-25 of the FIL header) to a
//! [`PageType`] enum. This core's tag set is the simplified one this format
//! uses (not the exhaustive historical MySQL/MariaDB tag set): one variant
//! per body layout in `innodb::page`, plus `Unknown` for anything else so a
//! decode never loses information it didn't understand.

use serde::Serialize;

/// INDEX's canonical real-world tag. A page may also be read with a legacy
/// `0x0000` tag; both are accepted on decode (see [`IndexTag`]).
pub const INDEX_TAG_CANONICAL: u16 = 0x45BF;
/// Legacy/alternate tag some writers use for INDEX pages.
pub const INDEX_TAG_LEGACY_ZERO: u16 = 0x0000;

const TAG_UNDO_LOG: u16 = 2;
const TAG_INODE: u16 = 3;
const TAG_IBUF_FREE_LIST: u16 = 4;
const TAG_IBUF_BITMAP: u16 = 5;
const TAG_SYS: u16 = 6;
const TAG_TRX_SYS: u16 = 7;
const TAG_FSP_HDR: u16 = 8;
const TAG_XDES: u16 = 9;
const TAG_BLOB: u16 = 10;
const TAG_COMPRESSED: u16 = 11;
const TAG_ENCRYPTED: u16 = 12;
const TAG_ENCRYPTED_RTREE: u16 = 14;
const TAG_ALLOCATED: u16 = 15;

/// Which raw tag value an INDEX page was read with, so encoding can
/// round-trip it bit-exactly (testable property 1 in the corpus this core
/// is grounded on requires `decode(encode(p)) == p`).
///
/// A freshly constructed INDEX page (not decoded from existing bytes)
/// defaults to [`IndexTag::Canonical`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IndexTag {
    /// `0x45BF`, the real format's canonical INDEX tag.
    Canonical,
    /// `0x0000`, a legacy tag some writers use for INDEX pages.
    LegacyZero,
}

impl Default for IndexTag {
    fn default() -> Self {
        IndexTag::Canonical
    }
}

impl IndexTag {
    pub fn as_u16(self) -> u16 {
        match self {
            IndexTag::Canonical => INDEX_TAG_CANONICAL,
            IndexTag::LegacyZero => INDEX_TAG_LEGACY_ZERO,
        }
    }
}

/// The page type tag set this core implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageType {
    Index(IndexTag),
    UndoLog,
    Inode,
    IbufFreeList,
    IbufBitmap,
    Sys,
    TrxSys,
    FspHdr,
    Xdes,
    Blob,
    Compressed,
    Encrypted,
    EncryptedRtree,
    Allocated,
    /// Any tag this core does not assign a typed body layout to. The raw
    /// tag value is preserved so the page still round-trips.
    Unknown(u16),
}

impl PageType {
    /// Decode a page type from its raw 2-byte tag.
    pub fn from_u16(tag: u16) -> PageType {
        match tag {
            INDEX_TAG_CANONICAL => PageType::Index(IndexTag::Canonical),
            INDEX_TAG_LEGACY_ZERO => PageType::Index(IndexTag::LegacyZero),
            TAG_UNDO_LOG => PageType::UndoLog,
            TAG_INODE => PageType::Inode,
            TAG_IBUF_FREE_LIST => PageType::IbufFreeList,
            TAG_IBUF_BITMAP => PageType::IbufBitmap,
            TAG_SYS => PageType::Sys,
            TAG_TRX_SYS => PageType::TrxSys,
            TAG_FSP_HDR => PageType::FspHdr,
            TAG_XDES => PageType::Xdes,
            TAG_BLOB => PageType::Blob,
            TAG_COMPRESSED => PageType::Compressed,
            TAG_ENCRYPTED => PageType::Encrypted,
            TAG_ENCRYPTED_RTREE => PageType::EncryptedRtree,
            TAG_ALLOCATED => PageType::Allocated,
            other => PageType::Unknown(other),
        }
    }

    /// Encode back to the raw 2-byte tag, preserving whichever INDEX tag
    /// variant was originally decoded (or `Canonical` for a fresh page).
    pub fn as_u16(self) -> u16 {
        match self {
            PageType::Index(tag) => tag.as_u16(),
            PageType::UndoLog => TAG_UNDO_LOG,
            PageType::Inode => TAG_INODE,
            PageType::IbufFreeList => TAG_IBUF_FREE_LIST,
            PageType::IbufBitmap => TAG_IBUF_BITMAP,
            PageType::Sys => TAG_SYS,
            PageType::TrxSys => TAG_TRX_SYS,
            PageType::FspHdr => TAG_FSP_HDR,
            PageType::Xdes => TAG_XDES,
            PageType::Blob => TAG_BLOB,
            PageType::Compressed => TAG_COMPRESSED,
            PageType::Encrypted => TAG_ENCRYPTED,
            PageType::EncryptedRtree => TAG_ENCRYPTED_RTREE,
            PageType::Allocated => TAG_ALLOCATED,
            PageType::Unknown(raw) => raw,
        }
    }

    /// True if this page was decoded with the legacy `0x0000` INDEX tag
    /// rather than the canonical `0x45BF`.
    pub fn is_legacy_index_tag(self) -> bool {
        matches!(self, PageType::Index(IndexTag::LegacyZero))
    }

    pub fn name(self) -> &'static str {
        match self {
            PageType::Index(_) => "INDEX",
            PageType::UndoLog => "UNDO_LOG",
            PageType::Inode => "INODE",
            PageType::IbufFreeList => "IBUF_FREE_LIST",
            PageType::IbufBitmap => "IBUF_BITMAP",
            PageType::Sys => "SYS",
            PageType::TrxSys => "TRX_SYS",
            PageType::FspHdr => "FSP_HDR",
            PageType::Xdes => "XDES",
            PageType::Blob => "BLOB",
            PageType::Compressed => "COMPRESSED",
            PageType::Encrypted => "ENCRYPTED",
            PageType::EncryptedRtree => "ENCRYPTED_RTREE",
            PageType::Allocated => "ALLOCATED",
            PageType::Unknown(_) => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageType::Unknown(raw) => write!(f, "UNKNOWN(0x{raw:04X})"),
            other => write!(f, "{}", other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_tag_round_trips_canonical() {
        let pt = PageType::from_u16(0x45BF);
        assert_eq!(pt, PageType::Index(IndexTag::Canonical));
        assert_eq!(pt.as_u16(), 0x45BF);
    }

    #[test]
    fn index_tag_round_trips_legacy_zero() {
        let pt = PageType::from_u16(0x0000);
        assert_eq!(pt, PageType::Index(IndexTag::LegacyZero));
        assert!(pt.is_legacy_index_tag());
        assert_eq!(pt.as_u16(), 0x0000);
    }

    #[test]
    fn fresh_index_page_defaults_to_canonical() {
        let pt = PageType::Index(IndexTag::default());
        assert_eq!(pt.as_u16(), 0x45BF);
    }

    #[test]
    fn unknown_tag_round_trips() {
        let pt = PageType::from_u16(0xBEEF);
        assert_eq!(pt, PageType::Unknown(0xBEEF));
        assert_eq!(pt.as_u16(), 0xBEEF);
    }

    #[test]
    fn all_named_tags_round_trip() {
        let tags = [2u16, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 14, 15];
        for tag in tags {
            let pt = PageType::from_u16(tag);
            assert_eq!(pt.as_u16(), tag, "tag {tag} did not round-trip");
        }
    }
}
