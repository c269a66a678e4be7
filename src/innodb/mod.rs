//! The page codec: fixed 16 KiB pages with a typed header/trailer and
//! type-specific body layouts.
//!
//! Start with [`page::Page`] for the tagged union over every page variant,
//! and [`page::FilHeader`]/[`page::FilTrailer`] for the shared framing every
//! page carries regardless of body type.

pub mod checksum;
pub mod constants;
pub mod io;
pub mod page;
pub mod page_types;
pub mod record;
