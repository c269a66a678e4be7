//! IBUF_BITMAP and IBUF_FREE_LIST bodies.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::innodb::constants::*;

/// IBUF_BITMAP: a flat bitmap (4 bits per covered page), zero-padded to the
/// body size. This core round-trips the bitmap bytes; it does not interpret
/// the 4-bit-per-page encoding (insert-buffer semantics are a collaborator's
/// concern).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IbufBitmapBody {
    pub bitmap: Vec<u8>,
}

impl IbufBitmapBody {
    pub fn new_empty() -> IbufBitmapBody {
        IbufBitmapBody {
            bitmap: vec![0u8; IBUF_BITMAP_BYTES],
        }
    }

    pub fn decode(body: &[u8]) -> Result<IbufBitmapBody> {
        if body.len() < IBUF_BITMAP_BYTES {
            return Err(Error::InvalidBody("IBUF_BITMAP body too short".into()));
        }
        Ok(IbufBitmapBody {
            bitmap: body[..IBUF_BITMAP_BYTES].to_vec(),
        })
    }

    pub fn encode(&self, out: &mut [u8]) -> Result<()> {
        if self.bitmap.len() != IBUF_BITMAP_BYTES {
            return Err(Error::InvalidBody(format!(
                "IBUF_BITMAP must be exactly {IBUF_BITMAP_BYTES} bytes, got {}",
                self.bitmap.len()
            )));
        }
        out[..IBUF_BITMAP_BYTES].copy_from_slice(&self.bitmap);
        Ok(())
    }
}

/// An insert-buffer free-list page status for one tracked page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IbufPageStatus {
    Free,
    Allocated,
    InUse,
    Corrupted,
}

impl IbufPageStatus {
    fn from_u32(val: u32) -> IbufPageStatus {
        match val {
            1 => IbufPageStatus::Allocated,
            2 => IbufPageStatus::InUse,
            3 => IbufPageStatus::Corrupted,
            _ => IbufPageStatus::Free,
        }
    }

    fn as_u32(self) -> u32 {
        match self {
            IbufPageStatus::Free => 0,
            IbufPageStatus::Allocated => 1,
            IbufPageStatus::InUse => 2,
            IbufPageStatus::Corrupted => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IbufFreeListEntry {
    pub page_no: u32,
    pub status: IbufPageStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IbufFreeListBody {
    pub free_count: u32,
    pub used_count: u32,
    pub total_count: u32,
    pub first_free_page: u32,
    pub last_free_page: u32,
    pub next_list_page: u32,
    pub entries: Vec<IbufFreeListEntry>,
}

impl IbufFreeListBody {
    pub fn new_empty() -> IbufFreeListBody {
        IbufFreeListBody {
            free_count: 0,
            used_count: 0,
            total_count: 0,
            first_free_page: FIL_NULL,
            last_free_page: FIL_NULL,
            next_list_page: FIL_NULL,
            entries: Vec::new(),
        }
    }

    pub fn decode(body: &[u8]) -> Result<IbufFreeListBody> {
        if body.len() < IBUF_FREE_LIST_HEADER_SIZE {
            return Err(Error::InvalidBody("IBUF_FREE_LIST header too short".into()));
        }
        let free_count = LittleEndian::read_u32(&body[0..4]);
        let used_count = LittleEndian::read_u32(&body[4..8]);
        let total_count = LittleEndian::read_u32(&body[8..12]);
        let first_free_page = LittleEndian::read_u32(&body[12..16]);
        let last_free_page = LittleEndian::read_u32(&body[16..20]);
        let next_list_page = LittleEndian::read_u32(&body[20..24]);
        // bytes [24..32) reserved.

        let used = used_count as usize;
        if used > IBUF_FREE_LIST_MAX_ENTRIES {
            return Err(Error::InvalidBody(format!(
                "IBUF_FREE_LIST used_count {used} exceeds capacity {IBUF_FREE_LIST_MAX_ENTRIES}"
            )));
        }
        let mut entries = Vec::with_capacity(used);
        for i in 0..used {
            let start = IBUF_FREE_LIST_HEADER_SIZE + i * IBUF_FREE_LIST_ENTRY_SIZE;
            if start + IBUF_FREE_LIST_ENTRY_SIZE > body.len() {
                return Err(Error::InvalidBody(
                    "IBUF_FREE_LIST entry count exceeds the page's data area".into(),
                ));
            }
            let page_no = LittleEndian::read_u32(&body[start..start + 4]);
            let status = IbufPageStatus::from_u32(LittleEndian::read_u32(&body[start + 4..start + 8]));
            entries.push(IbufFreeListEntry { page_no, status });
        }

        Ok(IbufFreeListBody {
            free_count,
            used_count,
            total_count,
            first_free_page,
            last_free_page,
            next_list_page,
            entries,
        })
    }

    pub fn encode(&self, out: &mut [u8]) -> Result<()> {
        if self.entries.len() > IBUF_FREE_LIST_MAX_ENTRIES {
            return Err(Error::InvalidBody(format!(
                "IBUF_FREE_LIST entries {} exceed capacity {IBUF_FREE_LIST_MAX_ENTRIES}",
                self.entries.len()
            )));
        }
        LittleEndian::write_u32(&mut out[0..4], self.free_count);
        LittleEndian::write_u32(&mut out[4..8], self.used_count);
        LittleEndian::write_u32(&mut out[8..12], self.total_count);
        LittleEndian::write_u32(&mut out[12..16], self.first_free_page);
        LittleEndian::write_u32(&mut out[16..20], self.last_free_page);
        LittleEndian::write_u32(&mut out[20..24], self.next_list_page);
        for (i, entry) in self.entries.iter().enumerate() {
            let start = IBUF_FREE_LIST_HEADER_SIZE + i * IBUF_FREE_LIST_ENTRY_SIZE;
            LittleEndian::write_u32(&mut out[start..start + 4], entry.page_no);
            LittleEndian::write_u32(&mut out[start + 4..start + 8], entry.status.as_u32());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innodb::constants::BODY_SIZE;

    #[test]
    fn ibuf_bitmap_round_trips() {
        let mut body = IbufBitmapBody::new_empty();
        body.bitmap[10] = 0xAB;
        let mut buf = vec![0u8; BODY_SIZE];
        body.encode(&mut buf).unwrap();
        assert_eq!(IbufBitmapBody::decode(&buf).unwrap(), body);
    }

    #[test]
    fn ibuf_free_list_round_trips() {
        let mut body = IbufFreeListBody::new_empty();
        body.entries.push(IbufFreeListEntry {
            page_no: 77,
            status: IbufPageStatus::Allocated,
        });
        body.used_count = 1;
        body.total_count = 1;
        let mut buf = vec![0u8; BODY_SIZE];
        body.encode(&mut buf).unwrap();
        let decoded = IbufFreeListBody::decode(&buf).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn used_count_beyond_capacity_rejected() {
        let mut buf = vec![0u8; BODY_SIZE];
        LittleEndian::write_u32(&mut buf[4..8], (IBUF_FREE_LIST_MAX_ENTRIES + 1) as u32);
        assert!(IbufFreeListBody::decode(&buf).is_err());
    }
}
