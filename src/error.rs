//! Crate-wide error taxonomy.

use thiserror::Error;

/// Errors surfaced by the page codec, buffer pool, space manager, and index
/// page operations.
///
/// Propagation policy: every error travels to the caller untouched. The core
/// never logs and never retries; `Corrupted` and `IoError` are the only
/// variants that mark persistent state suspect.
#[derive(Error, Debug)]
pub enum Error {
    /// Page bytes were not exactly `PAGE_SIZE` long.
    #[error("invalid page size: expected {expected}, got {actual}")]
    InvalidPageSize { expected: usize, actual: usize },

    /// The 38-byte FIL header could not be parsed.
    #[error("invalid page header: {0}")]
    InvalidHeader(String),

    /// A body-level structural invariant was violated.
    #[error("invalid page body: {0}")]
    InvalidBody(String),

    /// Checksum mismatch or on-disk invariant violation.
    #[error("corrupted page (space={space_id}, page={page_no}): {reason}")]
    Corrupted {
        space_id: u32,
        page_no: u32,
        reason: String,
    },

    /// Allocation demand exceeds tablespace capacity.
    #[error("no free space in tablespace {space_id}")]
    NoFreeSpace { space_id: u32 },

    /// Every buffer frame is pinned; no victim can be chosen.
    #[error("no evictable frame available in buffer pool")]
    NoEvictableFrame,

    /// An insert could not fit on the page; caller must split.
    #[error("page full (space={space_id}, page={page_no})")]
    PageFull { space_id: u32, page_no: u32 },

    /// A lookup target was absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Attempted to drop a segment that still owns extents or fragment pages.
    #[error("segment {segment_id} is not empty")]
    SegmentNotEmpty { segment_id: u64 },

    /// A compression/encryption algorithm tag was selected that is not built in.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Underlying filesystem failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Crate-wide `Result` alias, matching this codebase's convention of pairing
/// an error enum with a `Result` alias at the crate root.
pub type Result<T> = std::result::Result<T, Error>;
