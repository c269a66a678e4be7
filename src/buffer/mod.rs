//! The buffer pool: a fixed-capacity arena of page frames, hash-indexed by
//! `(space_id, page_no)`, evicted via a midpoint-insertion LRU, with a
//! flush list tracking dirty frames by oldest-modification LSN.
//!
//! Frame storage is a `Vec<RwLock<Frame>>` sized once at construction, so a
//! returned [`PageGuard`] can borrow directly from `&self` without an extra
//! indirection; slot bookkeeping (the hash index, free list, LRU, and flush
//! list) lives behind one `Mutex` guarding everything that isn't page
//! content, mirroring the source tool's preference for a small number of
//! coarse locks over a sharded design this core has no need of yet.

pub mod latch;
pub mod lru;

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::error::{Error, Result};
use crate::innodb::constants::PAGE_SIZE;
use crate::util::hash::hash_page_id;
use latch::{LatchMode, PageGuard};
use lru::{Lru, DEFAULT_OLD_REGION_DWELL, DEFAULT_YOUNG_RATIO};

pub(crate) struct Frame {
    pub(crate) space_id: u32,
    pub(crate) page_no: u32,
    pub(crate) bytes: Box<[u8]>,
    pub(crate) dirty: bool,
    pub(crate) oldest_modification_lsn: Option<u64>,
}

impl Frame {
    fn empty() -> Frame {
        Frame {
            space_id: 0,
            page_no: 0,
            bytes: vec![0u8; PAGE_SIZE].into_boxed_slice(),
            dirty: false,
            oldest_modification_lsn: None,
        }
    }
}

struct SlotState {
    hash_index: std::collections::HashMap<u64, usize>,
    free_list: Vec<usize>,
    lru: Lru,
}

pub struct BufferPool {
    frames: Vec<RwLock<Frame>>,
    // One counter per frame, indexed in lockstep with `frames` but outside
    // its `RwLock` so a pin check never has to wait on a frame's latch.
    pin_counts: Vec<AtomicU32>,
    state: Mutex<SlotState>,
}

/// The handful of tunables this core exposes as plain constructor
/// parameters rather than a configuration-file format (no config loader
/// is part of this crate's surface; see `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferPoolConfig {
    pub capacity: usize,
    pub young_ratio: f64,
    pub old_region_dwell_ms: u64,
}

impl Default for BufferPoolConfig {
    fn default() -> BufferPoolConfig {
        BufferPoolConfig {
            capacity: DEFAULT_POOL_CAPACITY,
            young_ratio: DEFAULT_YOUNG_RATIO,
            old_region_dwell_ms: DEFAULT_OLD_REGION_DWELL.as_millis() as u64,
        }
    }
}

/// Default buffer pool capacity, in frames, when a caller picks no other
/// value.
pub const DEFAULT_POOL_CAPACITY: usize = 256;

/// A snapshot of pool occupancy, for diagnostics and the tablespace facade's
/// `space_stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PoolStats {
    pub capacity: usize,
    pub resident: usize,
    pub dirty: usize,
}

impl BufferPool {
    pub fn new(capacity: usize) -> BufferPool {
        Self::with_lru_params(capacity, DEFAULT_YOUNG_RATIO, DEFAULT_OLD_REGION_DWELL)
    }

    pub fn with_config(config: BufferPoolConfig) -> BufferPool {
        Self::with_lru_params(
            config.capacity,
            config.young_ratio,
            Duration::from_millis(config.old_region_dwell_ms),
        )
    }

    pub fn with_lru_params(capacity: usize, young_ratio: f64, old_region_dwell: Duration) -> BufferPool {
        let frames = (0..capacity).map(|_| RwLock::new(Frame::empty())).collect();
        let pin_counts = (0..capacity).map(|_| AtomicU32::new(0)).collect();
        let state = SlotState {
            hash_index: std::collections::HashMap::new(),
            free_list: (0..capacity).collect(),
            lru: Lru::new(young_ratio, old_region_dwell),
        };
        BufferPool {
            frames,
            pin_counts,
            state: Mutex::new(state),
        }
    }

    pub fn capacity(&self) -> usize {
        self.frames.len()
    }

    /// Fetch `(space_id, page_no)`, calling `load` to read it from disk on a
    /// miss. `load` receives no arguments and must return exactly
    /// `PAGE_SIZE` bytes; it is only invoked when the page is not resident.
    pub fn fetch<F>(&self, space_id: u32, page_no: u32, latch: LatchMode, load: F) -> Result<PageGuard<'_>>
    where
        F: FnOnce() -> Result<[u8; PAGE_SIZE]>,
    {
        let key = hash_page_id(space_id, page_no);
        let frame_idx = {
            let mut state = self.state.lock();
            if let Some(&idx) = state.hash_index.get(&key) {
                state.lru.touch(idx);
                self.pin_counts[idx].fetch_add(1, Ordering::SeqCst);
                idx
            } else {
                let idx = self.evict_or_take_free(&mut state)?;
                let bytes = load()?;
                {
                    let mut frame = self.frames[idx].write();
                    frame.space_id = space_id;
                    frame.page_no = page_no;
                    frame.bytes.copy_from_slice(&bytes);
                    frame.dirty = false;
                    frame.oldest_modification_lsn = None;
                }
                state.hash_index.insert(key, idx);
                state.lru.insert(idx);
                self.pin_counts[idx].fetch_add(1, Ordering::SeqCst);
                idx
            }
        };
        Ok(match latch {
            LatchMode::Shared => PageGuard::shared(self.frames[frame_idx].read(), &self.pin_counts[frame_idx]),
            LatchMode::Exclusive => PageGuard::exclusive(self.frames[frame_idx].write(), &self.pin_counts[frame_idx]),
        })
    }

    /// Non-blocking variant of [`BufferPool::fetch`]: returns `Ok(None)`
    /// instead of blocking if the frame's latch is already held in a
    /// conflicting mode. Still blocks on the bookkeeping mutex itself,
    /// which is held only briefly.
    pub fn try_fetch<F>(&self, space_id: u32, page_no: u32, latch: LatchMode, load: F) -> Result<Option<PageGuard<'_>>>
    where
        F: FnOnce() -> Result<[u8; PAGE_SIZE]>,
    {
        let key = hash_page_id(space_id, page_no);
        let frame_idx = {
            let mut state = self.state.lock();
            if let Some(&idx) = state.hash_index.get(&key) {
                state.lru.touch(idx);
                self.pin_counts[idx].fetch_add(1, Ordering::SeqCst);
                idx
            } else {
                let idx = self.evict_or_take_free(&mut state)?;
                let bytes = load()?;
                {
                    let mut frame = self.frames[idx].write();
                    frame.space_id = space_id;
                    frame.page_no = page_no;
                    frame.bytes.copy_from_slice(&bytes);
                    frame.dirty = false;
                    frame.oldest_modification_lsn = None;
                }
                state.hash_index.insert(key, idx);
                state.lru.insert(idx);
                self.pin_counts[idx].fetch_add(1, Ordering::SeqCst);
                idx
            }
        };
        let guard = match latch {
            LatchMode::Shared => self.frames[frame_idx]
                .try_read()
                .map(|g| PageGuard::shared(g, &self.pin_counts[frame_idx])),
            LatchMode::Exclusive => self.frames[frame_idx]
                .try_write()
                .map(|g| PageGuard::exclusive(g, &self.pin_counts[frame_idx])),
        };
        // A failed try_read/try_write means no PageGuard exists to release
        // this pin on drop, so it has to be undone here.
        if guard.is_none() {
            self.pin_counts[frame_idx].fetch_sub(1, Ordering::SeqCst);
        }
        Ok(guard)
    }

    /// Allocate a fresh, zero-initialized frame for `(space_id, page_no)`
    /// without reading it from disk — for a page the caller is about to
    /// format, not one that already has contents worth loading.
    pub fn create(&self, space_id: u32, page_no: u32, latch: LatchMode) -> Result<PageGuard<'_>> {
        self.fetch(space_id, page_no, latch, || Ok([0u8; PAGE_SIZE]))
    }

    /// Find a free slot, evicting an unpinned, clean victim if the pool is
    /// full. Returns `NoEvictableFrame` if every resident frame is pinned or
    /// dirty (the caller must flush before more pages can be cached).
    fn evict_or_take_free(&self, state: &mut SlotState) -> Result<usize> {
        if let Some(idx) = state.free_list.pop() {
            return Ok(idx);
        }
        let mut candidate = state.lru.victim();
        let mut checked = 0usize;
        while let Some(idx) = candidate {
            // Check the pin count first: it costs no lock at all, so a
            // pinned frame never forces us to wait on its latch.
            if self.pin_counts[idx].load(Ordering::SeqCst) == 0 {
                let frame = self.frames[idx].read();
                let clean = !frame.dirty;
                drop(frame);
                if clean {
                    let evicted_key = {
                        let evicted = self.frames[idx].read();
                        hash_page_id(evicted.space_id, evicted.page_no)
                    };
                    state.hash_index.remove(&evicted_key);
                    state.lru.remove(idx);
                    return Ok(idx);
                }
            }
            checked += 1;
            if checked > state.lru.len() {
                break;
            }
            candidate = state.lru.victim();
        }
        Err(Error::NoEvictableFrame)
    }

    /// Mark the frame for `(space_id, page_no)` dirty as of `lsn`, if it is
    /// resident. A no-op otherwise (the caller raced an eviction).
    pub fn mark_dirty(&self, space_id: u32, page_no: u32, lsn: u64) {
        let key = hash_page_id(space_id, page_no);
        let state = self.state.lock();
        if let Some(&idx) = state.hash_index.get(&key) {
            let mut frame = self.frames[idx].write();
            frame.dirty = true;
            frame.oldest_modification_lsn.get_or_insert(lsn);
        }
    }

    /// Flush every dirty frame belonging to `space_id`, oldest modification
    /// first, via `write_back`. Frames are marked clean only after
    /// `write_back` succeeds for them.
    pub fn flush_space<F>(&self, space_id: u32, mut write_back: F) -> Result<()>
    where
        F: FnMut(u32, &[u8]) -> Result<()>,
    {
        let mut dirty: Vec<usize> = {
            let state = self.state.lock();
            state
                .hash_index
                .values()
                .copied()
                .filter(|&idx| {
                    let frame = self.frames[idx].read();
                    frame.space_id == space_id && frame.dirty
                })
                .collect()
        };
        dirty.sort_by_key(|&idx| {
            self.frames[idx]
                .read()
                .oldest_modification_lsn
                .unwrap_or(0)
        });
        for idx in dirty {
            let page_no = self.frames[idx].read().page_no;
            let bytes = self.frames[idx].read().bytes.clone();
            write_back(page_no, &bytes)?;
            let mut frame = self.frames[idx].write();
            frame.dirty = false;
            frame.oldest_modification_lsn = None;
        }
        Ok(())
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        let resident = state.hash_index.len();
        let dirty = state
            .hash_index
            .values()
            .filter(|&&idx| self.frames[idx].read().dirty)
            .count();
        PoolStats {
            capacity: self.frames.len(),
            resident,
            dirty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_page(fill: u8) -> [u8; PAGE_SIZE] {
        [fill; PAGE_SIZE]
    }

    #[test]
    fn miss_then_hit_does_not_reload() {
        let pool = BufferPool::new(4);
        let mut loads = 0;
        let _ = pool
            .fetch(1, 1, LatchMode::Shared, || {
                loads += 1;
                Ok(blank_page(1))
            })
            .unwrap();
        let _ = pool
            .fetch(1, 1, LatchMode::Shared, || {
                loads += 1;
                Ok(blank_page(1))
            })
            .unwrap();
        assert_eq!(loads, 1);
        assert_eq!(pool.stats().resident, 1);
    }

    #[test]
    fn eviction_reuses_slots_once_full() {
        let pool = BufferPool::new(2);
        for page_no in 0..2u32 {
            let guard = pool.fetch(1, page_no, LatchMode::Shared, || Ok(blank_page(0))).unwrap();
            drop(guard);
        }
        // Pool at capacity, but no frame is pinned, so a third page evicts one.
        let guard = pool.fetch(1, 2, LatchMode::Shared, || Ok(blank_page(0))).unwrap();
        drop(guard);
        assert_eq!(pool.stats().resident, 2);
    }

    #[test]
    fn dirty_frame_flushes_in_lsn_order() {
        let pool = BufferPool::new(4);
        drop(pool.fetch(1, 0, LatchMode::Shared, || Ok(blank_page(0))).unwrap());
        drop(pool.fetch(1, 1, LatchMode::Shared, || Ok(blank_page(0))).unwrap());
        pool.mark_dirty(1, 1, 100);
        pool.mark_dirty(1, 0, 50);

        let mut flushed = Vec::new();
        pool.flush_space(1, |page_no, _bytes| {
            flushed.push(page_no);
            Ok(())
        })
        .unwrap();
        assert_eq!(flushed, vec![0, 1]);
        assert_eq!(pool.stats().dirty, 0);
    }

    #[test]
    fn exclusive_latch_allows_mutation_and_marks_dirty() {
        let pool = BufferPool::new(1);
        {
            let mut guard = pool
                .fetch(1, 0, LatchMode::Exclusive, || Ok(blank_page(0)))
                .unwrap();
            guard.bytes_mut().unwrap()[0] = 0xFF;
        }
        let guard = pool.fetch(1, 0, LatchMode::Shared, || Ok(blank_page(0))).unwrap();
        assert_eq!(guard.bytes()[0], 0xFF);
    }

    #[test]
    fn create_does_not_invoke_load() {
        let pool = BufferPool::new(2);
        let guard = pool.create(1, 0, LatchMode::Shared).unwrap();
        assert_eq!(guard.bytes(), &blank_page(0)[..]);
    }

    #[test]
    fn try_fetch_returns_none_on_latch_conflict() {
        let pool = BufferPool::new(2);
        let _held = pool.fetch(1, 0, LatchMode::Exclusive, || Ok(blank_page(0))).unwrap();
        let contended = pool.try_fetch(1, 0, LatchMode::Shared, || Ok(blank_page(0))).unwrap();
        assert!(contended.is_none());
    }

    #[test]
    fn pinned_frame_is_not_evicted() {
        let pool = BufferPool::new(1);
        let held = pool.fetch(1, 0, LatchMode::Shared, || Ok(blank_page(0))).unwrap();
        // The only frame is pinned by `held`; a second page has nowhere to go.
        let err = pool.fetch(1, 1, LatchMode::Shared, || Ok(blank_page(0))).unwrap_err();
        assert!(matches!(err, Error::NoEvictableFrame));
        drop(held);
        // Dropping the guard unpins the frame, so the same fetch now succeeds.
        let guard = pool.fetch(1, 1, LatchMode::Shared, || Ok(blank_page(0))).unwrap();
        assert_eq!(guard.page_no(), 1);
    }

    #[test]
    fn with_config_applies_requested_capacity() {
        let pool = BufferPool::with_config(BufferPoolConfig {
            capacity: 3,
            ..BufferPoolConfig::default()
        });
        assert_eq!(pool.capacity(), 3);
    }
}
