//! InnoDB page and file structure constants.
//!
//! Offsets are derived from the same layout MySQL/InnoDB's `fil0fil.h`,
//! `page0page.h`, and `fsp0fsp.h` describe, pinned to this core's fixed
//! 16 KiB page size (no multi-size auto-detection: the size is fixed by the
//! format this core implements).

// ── Page size ───────────────────────────────────────────────────────

/// The only page size this core supports.
pub const PAGE_SIZE: usize = 16384;

// ── FIL Header (38 bytes total) ─────────────────────────────────────

/// Size of the FIL header in bytes.
pub const SIZE_FIL_HEAD: usize = 38;
/// Offset of the checksum (or space id in older formats). 4 bytes.
pub const FIL_PAGE_SPACE_OR_CHKSUM: usize = 0;
/// Offset of the page number within the tablespace. 4 bytes.
pub const FIL_PAGE_OFFSET: usize = 4;
/// Offset of the previous page pointer. 4 bytes.
pub const FIL_PAGE_PREV: usize = 8;
/// Offset of the next page pointer. 4 bytes.
pub const FIL_PAGE_NEXT: usize = 12;
/// Offset of the LSN of newest modification. 8 bytes.
pub const FIL_PAGE_LSN: usize = 16;
/// Offset of the page type field. 2 bytes.
pub const FIL_PAGE_TYPE: usize = 24;
/// Offset of the flush LSN (only page 0 of system tablespace). 8 bytes.
pub const FIL_PAGE_FILE_FLUSH_LSN: usize = 26;
/// Offset of the space ID. 4 bytes.
pub const FIL_PAGE_SPACE_ID: usize = 34;

// ── FIL Trailer (8 bytes total) ─────────────────────────────────────

/// Size of the FIL trailer in bytes.
pub const SIZE_FIL_TRAILER: usize = 8;
/// Offset (within the trailer) of the checksum. 4 bytes.
pub const FIL_TRAILER_CHECKSUM: usize = 0;
/// Offset (within the trailer) of the low 32 bits of the LSN. 4 bytes.
pub const FIL_TRAILER_LOW32_LSN: usize = 4;

/// Start of page body (immediately after FIL header).
pub const FIL_PAGE_DATA: usize = SIZE_FIL_HEAD;
/// Size of the page body, between header and trailer.
pub const BODY_SIZE: usize = PAGE_SIZE - SIZE_FIL_HEAD - SIZE_FIL_TRAILER;
/// Offset of the trailer within the page.
pub const TRAILER_OFFSET: usize = PAGE_SIZE - SIZE_FIL_TRAILER;
/// End of the checksummed range: bytes `[0, CHECKSUM_RANGE_END)` are covered
/// by the page checksum (the entire 8-byte trailer is excluded, including
/// its own checksum field).
pub const CHECKSUM_RANGE_END: usize = PAGE_SIZE - SIZE_FIL_TRAILER;

// ── FSP Header (112 bytes, starts at FIL_PAGE_DATA on page 0) ──────

/// Size of the FSP header in bytes.
pub const FSP_HEADER_SIZE: usize = 112;
/// Offset of the space ID within the FSP header. 4 bytes.
pub const FSP_SPACE_ID: usize = 0;
/// Offset of the tablespace size (in pages) within the FSP header. 4 bytes.
pub const FSP_SIZE: usize = 8;
/// Offset of the minimum page not yet initialized. 4 bytes.
pub const FSP_FREE_LIMIT: usize = 12;
/// Offset of the FSP flags field. 4 bytes.
pub const FSP_SPACE_FLAGS: usize = 16;
/// Offset of the used-page count in the FSP_FREE_FRAG list. 4 bytes.
pub const FSP_FRAG_N_USED: usize = 20;
/// Offset of the next-segment-id counter. 8 bytes.
pub const FSP_NEXT_SEGMENT_ID: usize = 24;
/// Offset of the FREE extent list base node. 16 bytes.
pub const FSP_FREE_LIST: usize = 32;
/// Offset of the FREE_FRAG extent list base node. 16 bytes.
pub const FSP_FREE_FRAG_LIST: usize = 48;
/// Offset of the FULL_FRAG extent list base node. 16 bytes.
pub const FSP_FULL_FRAG_LIST: usize = 64;
/// Offset of the INODE page list base node. 16 bytes.
pub const FSP_INODE_LIST: usize = 80;

// ── List base node / list node (shared layout) ──────────────────────

/// Size of a list base node: length(4) + first(page4+off2) + last(page4+off2).
pub const LIST_BASE_NODE_SIZE: usize = 16;
/// Size of a list node embedded in a list member: prev(page4+off2) + next(page4+off2).
pub const LIST_NODE_SIZE: usize = 12;

// ── Extent / XDES ────────────────────────────────────────────────────

/// Pages per extent.
pub const EXTENT_SIZE: u32 = 64;
/// Size of one XDES entry.
pub const XDES_ENTRY_SIZE: usize = 40;
/// Number of XDES entries per XDES page.
pub const XDES_ENTRIES_PER_PAGE: usize = 256;
/// Byte offset of the first XDES entry within the page body. (112 preceding
/// bytes of padding + 256*40 entries + 5986 trailing bytes of padding sums
/// to exactly `BODY_SIZE`; this is the value that keeps that arithmetic
/// consistent — see DESIGN.md.)
pub const XDES_ARRAY_OFFSET: usize = 112;
/// Bytes of bitmap per XDES entry (2 bits/page * 64 pages / 8).
pub const XDES_BITMAP_SIZE: usize = 16;

// ── Segment / INode ──────────────────────────────────────────────────

/// Size of one INodeEntry.
pub const INODE_ENTRY_SIZE: usize = 192;
/// Number of INodeEntries per INODE page.
pub const INODE_ENTRIES_PER_PAGE: usize = 85;
/// Magic number stamped into every live INodeEntry.
pub const INODE_MAGIC: u32 = 0x05D669D2;
/// Number of fragment-array slots per segment.
pub const FRAG_ARRAY_SIZE: usize = 32;
/// Size in bytes of one fragment-array entry.
pub const FRAG_ARRAY_ENTRY_SIZE: usize = 4;

// ── Page Header (INDEX page specific, starts at FIL_PAGE_DATA) ──────

/// Offset of the directory slot count. 2 bytes.
pub const PAGE_N_DIR_SLOTS: usize = 0;
/// Offset of the record heap top pointer. 2 bytes.
pub const PAGE_HEAP_TOP: usize = 2;
/// Offset of the heap record count (bit 15 = compact flag). 2 bytes.
pub const PAGE_N_HEAP: usize = 4;
/// Offset of the free record list pointer. 2 bytes.
pub const PAGE_FREE: usize = 6;
/// Offset of the deleted-record byte count (garbage). 2 bytes.
pub const PAGE_GARBAGE: usize = 8;
/// Offset of the last-inserted record pointer. 2 bytes.
pub const PAGE_LAST_INSERT: usize = 10;
/// Offset of the last insert direction. 2 bytes.
pub const PAGE_DIRECTION: usize = 12;
/// Offset of the consecutive same-direction insert count. 2 bytes.
pub const PAGE_N_DIRECTION: usize = 14;
/// Offset of the user record count. 2 bytes.
pub const PAGE_N_RECS: usize = 16;
/// Offset of the maximum transaction ID (secondary indexes only). 8 bytes.
pub const PAGE_MAX_TRX_ID: usize = 18;
/// Offset of the B+Tree level (0 = leaf). 2 bytes.
pub const PAGE_LEVEL: usize = 26;
/// Offset of the index ID. 8 bytes.
pub const PAGE_INDEX_ID: usize = 28;
/// Offset of the leaf segment FSEG header. 10 bytes.
pub const PAGE_BTR_SEG_LEAF: usize = 36;
/// Offset of the non-leaf segment FSEG header. 10 bytes.
pub const PAGE_BTR_SEG_TOP: usize = 46;
/// Total INDEX page header size (before FSEG headers are included).
pub const PAGE_HEADER_SIZE: usize = 56;

// ── FSEG Header ─────────────────────────────────────────────────────

/// Size of an FSEG (file segment) header in bytes.
pub const FSEG_HEADER_SIZE: usize = 10;

// ── Record extra bytes ──────────────────────────────────────────────

/// Extra bytes preceding each record in compact format (this core only
/// implements the compact record format).
pub const REC_N_NEW_EXTRA_BYTES: usize = 5;

// ── System record offsets (compact pages) ───────────────────────────

/// Offset, relative to the start of the page *body* (i.e. within the slice
/// `PageBody::decode`/`encode` operate on, which already excludes the FIL
/// header), where the page header ends and user-record space begins.
/// `PAGE_HEADER_SIZE` already includes both FSEG headers
/// (`PAGE_BTR_SEG_LEAF`/`PAGE_BTR_SEG_TOP` span its last 20 bytes), so they
/// are not added again here.
pub const PAGE_DATA_OFFSET: usize = PAGE_HEADER_SIZE; // 56

/// Offset of the infimum record's header start (compact format), body-relative.
pub const PAGE_NEW_INFIMUM: usize = PAGE_DATA_OFFSET + REC_N_NEW_EXTRA_BYTES; // 61
/// Infimum's data payload length ("infimum\0").
pub const INFIMUM_DATA_LEN: usize = 8;
/// Offset of the supremum record's header start (compact format), body-relative.
pub const PAGE_NEW_SUPREMUM: usize = PAGE_NEW_INFIMUM + REC_N_NEW_EXTRA_BYTES + INFIMUM_DATA_LEN; // 74
/// Supremum's data payload length ("supremum").
pub const SUPREMUM_DATA_LEN: usize = 8;
/// Offset where user-record heap space begins, body-relative.
pub const HEAP_DATA_START: usize = PAGE_NEW_SUPREMUM + SUPREMUM_DATA_LEN; // 82

// ── Special values ──────────────────────────────────────────────────

/// Null page reference (0xFFFFFFFF / 4294967295).
pub const FIL_NULL: u32 = 0xFFFFFFFF;
/// Heap number reserved for the infimum record.
pub const INFIMUM_HEAP_NO: u16 = 0;
/// Heap number reserved for the supremum record.
pub const SUPREMUM_HEAP_NO: u16 = 1;
/// First heap number available to a user record.
pub const FIRST_USER_HEAP_NO: u16 = 2;

// ── Insert direction values ─────────────────────────────────────────

/// Insert direction: left.
pub const PAGE_LEFT: u16 = 1;
/// Insert direction: right.
pub const PAGE_RIGHT: u16 = 2;
/// Insert direction: same record position.
pub const PAGE_SAME_REC: u16 = 3;
/// Insert direction: same page.
pub const PAGE_SAME_PAGE: u16 = 4;
/// Insert direction: no direction.
pub const PAGE_NO_DIRECTION: u16 = 5;

// ── Slot directory ───────────────────────────────────────────────────

/// Size of one slot directory entry.
pub const SLOT_SIZE: usize = 2;
/// Minimum records (including the owner) an interior slot may own.
pub const SLOT_MIN_OWNED: u8 = 4;
/// Maximum records (including the owner) a slot may own before it splits.
pub const SLOT_MAX_OWNED: u8 = 8;
/// Safety margin subtracted from a page's free space budget when judging
/// merge eligibility: `PAGE_SIZE / 16`.
pub const MERGE_SAFETY_DIVISOR: usize = 16;

// ── IBUF pages ────────────────────────────────────────────────────────

/// Bytes of bitmap data on an IBUF_BITMAP page (4 bits per covered page).
pub const IBUF_BITMAP_BYTES: usize = 8192;
/// Size of the IBUF_FREE_LIST page header.
pub const IBUF_FREE_LIST_HEADER_SIZE: usize = 32;
/// Size of one IBUF_FREE_LIST entry.
pub const IBUF_FREE_LIST_ENTRY_SIZE: usize = 8;
/// Maximum number of IBUF_FREE_LIST entries that fit after the header.
pub const IBUF_FREE_LIST_MAX_ENTRIES: usize = 2038;

// ── BLOB pages ────────────────────────────────────────────────────────

/// Size of the BLOB page header.
pub const BLOB_HEADER_SIZE: usize = 20;

// ── UNDO_LOG pages ───────────────────────────────────────────────────

/// Size of the UNDO_LOG page header this core round-trips (not interpreted).
pub const UNDO_PAGE_HEADER_SIZE: usize = 18;

// ── COMPRESSED / ENCRYPTED page headers ─────────────────────────────

/// Size of the COMPRESSED page header.
pub const COMPRESSED_HEADER_SIZE: usize = 16;
/// Size of the ENCRYPTED page header.
pub const ENCRYPTED_HEADER_SIZE: usize = 32;
/// Length of the IV carried in the ENCRYPTED header.
pub const ENCRYPTED_IV_LEN: usize = 16;

// ── Checksum ─────────────────────────────────────────────────────────

/// Magic value historically used to mean "no checksum computed".
pub const BUF_NO_CHECKSUM_MAGIC: u32 = 0xDEADBEEF;
