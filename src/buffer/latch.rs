//! Per-frame latching: a page is checked out either shared (read) or
//! exclusive (read-write), backed by `parking_lot::RwLock` on the frame
//! itself. A checkout also pins the frame: `BufferPool::fetch`/`create`
//! bump the frame's pin count before handing out a `PageGuard`, and
//! dropping the guard releases it again. A frame with a nonzero pin count
//! is never a candidate for eviction.

use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::buffer::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchMode {
    Shared,
    Exclusive,
}

enum Inner<'a> {
    Shared(RwLockReadGuard<'a, Frame>),
    Exclusive(RwLockWriteGuard<'a, Frame>),
}

/// A checked-out, pinned page. Derefs to the frame's bytes; `Exclusive`
/// guards also deref-mut and mark the frame dirty on drop if the caller
/// touched it via [`PageGuard::bytes_mut`]. Dropping a `PageGuard` unpins
/// the frame.
pub struct PageGuard<'a> {
    inner: Inner<'a>,
    pin_count: &'a AtomicU32,
}

impl<'a> PageGuard<'a> {
    pub(crate) fn shared(guard: RwLockReadGuard<'a, Frame>, pin_count: &'a AtomicU32) -> PageGuard<'a> {
        PageGuard {
            inner: Inner::Shared(guard),
            pin_count,
        }
    }

    pub(crate) fn exclusive(guard: RwLockWriteGuard<'a, Frame>, pin_count: &'a AtomicU32) -> PageGuard<'a> {
        PageGuard {
            inner: Inner::Exclusive(guard),
            pin_count,
        }
    }

    pub fn space_id(&self) -> u32 {
        match &self.inner {
            Inner::Shared(f) => f.space_id,
            Inner::Exclusive(f) => f.space_id,
        }
    }

    pub fn page_no(&self) -> u32 {
        match &self.inner {
            Inner::Shared(f) => f.page_no,
            Inner::Exclusive(f) => f.page_no,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match &self.inner {
            Inner::Shared(f) => &f.bytes,
            Inner::Exclusive(f) => &f.bytes,
        }
    }

    /// Mutable access, only available through an exclusive latch. Marks the
    /// frame dirty: the caller is assumed to be about to write through it.
    pub fn bytes_mut(&mut self) -> Option<&mut [u8]> {
        match &mut self.inner {
            Inner::Shared(_) => None,
            Inner::Exclusive(f) => {
                f.dirty = true;
                Some(&mut f.bytes)
            }
        }
    }

    pub fn is_exclusive(&self) -> bool {
        matches!(self.inner, Inner::Exclusive(_))
    }
}

impl<'a> Drop for PageGuard<'a> {
    fn drop(&mut self) {
        self.pin_count.fetch_sub(1, Ordering::SeqCst);
    }
}
