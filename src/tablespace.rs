//! The service-facing facade: one open `.ibd`-style file, the buffer pool
//! in front of it, and the space manager tracking what's allocated in it.
//!
//! This is the entry point external collaborators (a query executor, a
//! recovery tool) are expected to use; [`crate::buffer`], [`crate::space`],
//! and [`crate::innodb::io`] are the pieces it wires together.

use parking_lot::Mutex;

use crate::buffer::{BufferPool, BufferPoolConfig, PoolStats};
use crate::error::Result;
use crate::innodb::constants::PAGE_SIZE;
use crate::innodb::io::BlockIo;
use crate::space::SpaceManager;

pub use crate::buffer::latch::{LatchMode, PageGuard};
pub use crate::buffer::DEFAULT_POOL_CAPACITY;

pub struct Tablespace {
    space_id: u32,
    io: BlockIo,
    pool: BufferPool,
    space: Mutex<SpaceManager>,
}

/// A point-in-time view of allocation-side and pool-side occupancy, for
/// diagnostics.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct SpaceStats {
    pub total_pages: u32,
    pub free_pages: u32,
    pub free_extents: u32,
    pub dirty_pages: usize,
    pub pool: PoolStats,
}

impl Tablespace {
    /// Open (creating if absent) the tablespace file at `path`, sized to at
    /// least `n_pages` pages, with the default buffer pool capacity.
    pub fn open<P: AsRef<std::path::Path>>(path: P, n_pages: u32) -> Result<Tablespace> {
        Self::open_with_pool_capacity(path, n_pages, DEFAULT_POOL_CAPACITY)
    }

    pub fn open_with_pool_capacity<P: AsRef<std::path::Path>>(
        path: P,
        n_pages: u32,
        pool_capacity: usize,
    ) -> Result<Tablespace> {
        Self::open_with_pool_config(
            path,
            n_pages,
            BufferPoolConfig {
                capacity: pool_capacity,
                ..BufferPoolConfig::default()
            },
        )
    }

    pub fn open_with_pool_config<P: AsRef<std::path::Path>>(
        path: P,
        n_pages: u32,
        pool_config: BufferPoolConfig,
    ) -> Result<Tablespace> {
        let io = BlockIo::open(path, n_pages as u64 * PAGE_SIZE as u64)?;
        let space_id = 0;
        Ok(Tablespace {
            space_id,
            io,
            pool: BufferPool::with_config(pool_config),
            space: Mutex::new(SpaceManager::new(space_id)),
        })
    }

    pub fn space_id(&self) -> u32 {
        self.space_id
    }

    /// Create a new segment, returning its id. Pages are claimed from it
    /// one at a time via [`Tablespace::alloc_page_in_segment`].
    pub fn create_segment(&self) -> Result<u64> {
        self.space.lock().create_segment()
    }

    /// Reclaim a segment's INode descriptor. Fails with
    /// [`crate::Error::SegmentNotEmpty`] until every page allocated from it
    /// has been freed.
    pub fn drop_segment(&self, segment_id: u64) -> Result<()> {
        self.space.lock().drop_segment(segment_id)
    }

    /// Claim the next page for `segment_id`. The page is not brought into
    /// the buffer pool by this call; fetch it with [`Tablespace::get_page`]
    /// once the caller is ready to write its contents.
    pub fn alloc_page_in_segment(&self, segment_id: u64) -> Result<u32> {
        let mut space = self.space.lock();
        let page_no = space.allocate_page_in_segment(segment_id)?;
        let needed = page_no + 1;
        let current = self.io.page_count()?;
        if current < needed {
            self.io.extend_by_pages(needed - current)?;
        }
        Ok(page_no)
    }

    pub fn free_page(&self, page_no: u32) -> Result<()> {
        self.space.lock().free_page(page_no)
    }

    /// Fetch `page_no`, reading it from disk through the buffer pool on a
    /// miss, and latch it as requested.
    pub fn get_page(&self, page_no: u32, latch: LatchMode) -> Result<PageGuard<'_>> {
        let space_id = self.space_id;
        self.pool.fetch(space_id, page_no, latch, || {
            let bytes = self.io.read_page(page_no)?;
            let mut buf = [0u8; PAGE_SIZE];
            buf.copy_from_slice(&bytes);
            Ok(buf)
        })
    }

    /// Write every dirty frame belonging to this tablespace back to disk.
    /// Does not fsync; pair with [`Tablespace::fsync_space`] when durability
    /// is required.
    pub fn flush_space(&self) -> Result<()> {
        let space_id = self.space_id;
        self.pool.flush_space(space_id, |page_no, bytes| self.io.write_page(page_no, bytes))
    }

    pub fn fsync_space(&self) -> Result<()> {
        self.io.sync()
    }

    pub fn space_stats(&self) -> SpaceStats {
        let occupancy = self.space.lock().occupancy();
        let pool = self.pool.stats();
        SpaceStats {
            total_pages: occupancy.total_pages,
            free_pages: occupancy.free_pages,
            free_extents: occupancy.free_extents,
            dirty_pages: pool.dirty,
            pool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn create_alloc_write_flush_round_trips() {
        let tmp = NamedTempFile::new().unwrap();
        let ts = Tablespace::open(tmp.path(), 8).unwrap();
        let segment_id = ts.create_segment().unwrap();
        let page_no = ts.alloc_page_in_segment(segment_id).unwrap();

        {
            let mut guard = ts.get_page(page_no, LatchMode::Exclusive).unwrap();
            guard.bytes_mut().unwrap()[0] = 0x42;
        }
        ts.flush_space().unwrap();
        ts.fsync_space().unwrap();

        // Reopen against the same file to verify the write landed on disk.
        drop(ts);
        let ts2 = Tablespace::open(tmp.path(), 8).unwrap();
        let guard = ts2.get_page(page_no, LatchMode::Shared).unwrap();
        assert_eq!(guard.bytes()[0], 0x42);
    }

    #[test]
    fn alloc_extends_file_when_page_falls_past_initial_size() {
        let tmp = NamedTempFile::new().unwrap();
        let ts = Tablespace::open(tmp.path(), 1).unwrap();
        let segment_id = ts.create_segment().unwrap();
        let mut last_page = 0;
        for _ in 0..40 {
            last_page = ts.alloc_page_in_segment(segment_id).unwrap();
        }
        let guard = ts.get_page(last_page, LatchMode::Shared).unwrap();
        assert_eq!(guard.bytes().len(), PAGE_SIZE);
    }

    #[test]
    fn space_stats_reports_pool_occupancy() {
        let tmp = NamedTempFile::new().unwrap();
        let ts = Tablespace::open(tmp.path(), 4).unwrap();
        let segment_id = ts.create_segment().unwrap();
        let page_no = ts.alloc_page_in_segment(segment_id).unwrap();
        drop(ts.get_page(page_no, LatchMode::Shared).unwrap());
        assert_eq!(ts.space_stats().pool.resident, 1);
    }
}
