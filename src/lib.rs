//! `innodb-core` — the storage-engine core of an InnoDB-compatible database:
//! a byte-exact page codec, a midpoint-insertion LRU buffer pool, a
//! free-space manager built from FSP/XDES/INODE pages, and B+-tree index
//! page mechanics.
//!
//! This crate owns the hard engineering of the on-disk format and the cache
//! that sits in front of it. It does not parse SQL, plan queries, manage
//! transactions, or write a redo log — those are external collaborators
//! that consume the types here (page identifiers, LSNs, page guards).
//!
//! # Layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`innodb::page`] | FIL header/trailer and the per-variant page codec |
//! | [`innodb::page_types`] | The page type tag enum |
//! | [`innodb::checksum`] | CRC-32 (IEEE) page checksum |
//! | [`innodb::record`] | Compact record header encode/decode |
//! | [`innodb::io`] | Fixed-size block I/O against a tablespace file |
//! | [`innodb::constants`] | Byte-offset constants for every on-disk structure |
//! | [`buffer`] | The buffer pool, LRU policy, and per-frame latch |
//! | [`space`] | FSP/XDES/INODE-backed free space management |
//! | [`tablespace`] | The service-facing facade tying I/O, buffer pool, and space manager together |
//! | [`util`] | Hashing and byte-packing helpers |
//!
//! ## Quick example
//!
//! ```no_run
//! use innodb_core::tablespace::Tablespace;
//!
//! let ts = Tablespace::open("table.ibd", 64).unwrap();
//! let segment_id = ts.create_segment().unwrap();
//! let page_no = ts.alloc_page_in_segment(segment_id).unwrap();
//! let guard = ts.get_page(page_no, innodb_core::tablespace::LatchMode::Exclusive).unwrap();
//! drop(guard);
//! ts.flush_space().unwrap();
//! ```

pub mod buffer;
pub mod error;
pub mod innodb;
pub mod space;
pub mod tablespace;
pub mod util;

pub use error::{Error, Result};
