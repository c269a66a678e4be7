//! BLOB body: an off-page overflow page for externally-stored column data.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::innodb::constants::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobBody {
    /// Total length of the value this overflow chain stores, as recorded on
    /// the first page of the chain.
    pub total_length: u32,
    /// Next page in the overflow chain, or `FIL_NULL` if this is the last.
    pub next_page: u32,
    /// Byte offset within this page where the chunk's data begins.
    pub offset: u32,
    pub segment_id: u64,
    pub data: Vec<u8>,
}

impl BlobBody {
    pub fn new_empty() -> BlobBody {
        BlobBody {
            total_length: 0,
            next_page: FIL_NULL,
            offset: BLOB_HEADER_SIZE as u32,
            segment_id: 0,
            data: vec![0u8; BODY_SIZE - BLOB_HEADER_SIZE],
        }
    }

    pub fn decode(body: &[u8]) -> Result<BlobBody> {
        if body.len() < BLOB_HEADER_SIZE {
            return Err(Error::InvalidBody("BLOB header too short".into()));
        }
        let total_length = LittleEndian::read_u32(&body[0..4]);
        let next_page = LittleEndian::read_u32(&body[4..8]);
        let offset = LittleEndian::read_u32(&body[8..12]);
        let segment_id = LittleEndian::read_u64(&body[12..20]);
        let data = body[BLOB_HEADER_SIZE..].to_vec();
        Ok(BlobBody {
            total_length,
            next_page,
            offset,
            segment_id,
            data,
        })
    }

    pub fn encode(&self, out: &mut [u8]) -> Result<()> {
        let expected = out.len() - BLOB_HEADER_SIZE;
        if self.data.len() != expected {
            return Err(Error::InvalidBody(format!(
                "BLOB data must be {expected} bytes, got {}",
                self.data.len()
            )));
        }
        LittleEndian::write_u32(&mut out[0..4], self.total_length);
        LittleEndian::write_u32(&mut out[4..8], self.next_page);
        LittleEndian::write_u32(&mut out[8..12], self.offset);
        LittleEndian::write_u64(&mut out[12..20], self.segment_id);
        out[BLOB_HEADER_SIZE..].copy_from_slice(&self.data);
        Ok(())
    }

    pub fn is_chain_end(&self) -> bool {
        self.next_page == FIL_NULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_body_round_trips() {
        let mut body = BlobBody::new_empty();
        body.total_length = 40000;
        body.next_page = 9;
        body.data[0] = 0xFF;
        let mut buf = vec![0u8; BODY_SIZE];
        body.encode(&mut buf).unwrap();
        let decoded = BlobBody::decode(&buf).unwrap();
        assert_eq!(decoded, body);
        assert!(!decoded.is_chain_end());
    }

    #[test]
    fn chain_end_detected_via_fil_null() {
        let body = BlobBody::new_empty();
        assert!(body.is_chain_end());
    }
}
