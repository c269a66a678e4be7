//! UNDO_LOG body: an 18-byte page header followed by raw undo-record
//! payload. This core round-trips the payload bytes; it does not parse
//! individual undo records or segment headers (transaction-manager scope).

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::innodb::constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoPageType {
    Insert,
    Update,
    Other(u16),
}

impl UndoPageType {
    fn from_u16(val: u16) -> UndoPageType {
        match val {
            1 => UndoPageType::Insert,
            2 => UndoPageType::Update,
            other => UndoPageType::Other(other),
        }
    }

    fn as_u16(self) -> u16 {
        match self {
            UndoPageType::Insert => 1,
            UndoPageType::Update => 2,
            UndoPageType::Other(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoLogBody {
    pub page_type: UndoPageType,
    pub data_start_offset: u16,
    pub free_offset: u16,
    pub payload: Vec<u8>,
}

impl UndoLogBody {
    pub fn new_empty() -> UndoLogBody {
        UndoLogBody {
            page_type: UndoPageType::Insert,
            data_start_offset: UNDO_PAGE_HEADER_SIZE as u16,
            free_offset: UNDO_PAGE_HEADER_SIZE as u16,
            payload: vec![0u8; BODY_SIZE - UNDO_PAGE_HEADER_SIZE],
        }
    }

    pub fn decode(body: &[u8]) -> Result<UndoLogBody> {
        if body.len() < UNDO_PAGE_HEADER_SIZE {
            return Err(Error::InvalidBody("UNDO_LOG header too short".into()));
        }
        let page_type = UndoPageType::from_u16(LittleEndian::read_u16(&body[0..2]));
        let data_start_offset = LittleEndian::read_u16(&body[2..4]);
        let free_offset = LittleEndian::read_u16(&body[4..6]);
        // bytes [6..18) reserved.
        let payload = body[UNDO_PAGE_HEADER_SIZE..].to_vec();
        Ok(UndoLogBody {
            page_type,
            data_start_offset,
            free_offset,
            payload,
        })
    }

    pub fn encode(&self, out: &mut [u8]) -> Result<()> {
        let expected = out.len() - UNDO_PAGE_HEADER_SIZE;
        if self.payload.len() != expected {
            return Err(Error::InvalidBody(format!(
                "UNDO_LOG payload must be {expected} bytes, got {}",
                self.payload.len()
            )));
        }
        LittleEndian::write_u16(&mut out[0..2], self.page_type.as_u16());
        LittleEndian::write_u16(&mut out[2..4], self.data_start_offset);
        LittleEndian::write_u16(&mut out[4..6], self.free_offset);
        out[UNDO_PAGE_HEADER_SIZE..].copy_from_slice(&self.payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undo_log_body_round_trips() {
        let mut body = UndoLogBody::new_empty();
        body.page_type = UndoPageType::Update;
        body.payload[0] = 0x7F;
        let mut buf = vec![0u8; BODY_SIZE];
        body.encode(&mut buf).unwrap();
        assert_eq!(UndoLogBody::decode(&buf).unwrap(), body);
    }

    #[test]
    fn wrong_payload_length_rejected_on_encode() {
        let mut body = UndoLogBody::new_empty();
        body.payload.pop();
        let mut buf = vec![0u8; BODY_SIZE];
        assert!(body.encode(&mut buf).is_err());
    }
}
