//! FSP_HDR body: the per-tablespace control page at page 0, plus the
//! shared list base-node / list-node layouts used by FSP, XDES, and INODE
//! pages.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::innodb::constants::*;

/// The base node of a doubly-linked list of extents or INode pages: its
/// length plus (page, offset) pointers to the first and last member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListBaseNode {
    pub length: u32,
    pub first_page: u32,
    pub first_offset: u16,
    pub last_page: u32,
    pub last_offset: u16,
}

impl ListBaseNode {
    pub const SIZE: usize = LIST_BASE_NODE_SIZE;

    pub fn decode(buf: &[u8]) -> ListBaseNode {
        ListBaseNode {
            length: LittleEndian::read_u32(&buf[0..4]),
            first_page: LittleEndian::read_u32(&buf[4..8]),
            first_offset: LittleEndian::read_u16(&buf[8..10]),
            last_page: LittleEndian::read_u32(&buf[10..14]),
            last_offset: LittleEndian::read_u16(&buf[14..16]),
        }
    }

    pub fn encode(&self, out: &mut [u8]) {
        LittleEndian::write_u32(&mut out[0..4], self.length);
        LittleEndian::write_u32(&mut out[4..8], self.first_page);
        LittleEndian::write_u16(&mut out[8..10], self.first_offset);
        LittleEndian::write_u32(&mut out[10..14], self.last_page);
        LittleEndian::write_u16(&mut out[14..16], self.last_offset);
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// The list node embedded in each list member: (page, offset) pointers to
/// the previous and next member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListNode {
    pub prev_page: u32,
    pub prev_offset: u16,
    pub next_page: u32,
    pub next_offset: u16,
}

impl ListNode {
    pub const SIZE: usize = LIST_NODE_SIZE;

    pub fn decode(buf: &[u8]) -> ListNode {
        ListNode {
            prev_page: LittleEndian::read_u32(&buf[0..4]),
            prev_offset: LittleEndian::read_u16(&buf[4..6]),
            next_page: LittleEndian::read_u32(&buf[6..10]),
            next_offset: LittleEndian::read_u16(&buf[10..12]),
        }
    }

    pub fn encode(&self, out: &mut [u8]) {
        LittleEndian::write_u32(&mut out[0..4], self.prev_page);
        LittleEndian::write_u16(&mut out[4..6], self.prev_offset);
        LittleEndian::write_u32(&mut out[6..10], self.next_page);
        LittleEndian::write_u16(&mut out[10..12], self.next_offset);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FspHeaderBody {
    pub space_id: u32,
    pub size: u32,
    pub free_limit: u32,
    pub flags: u32,
    pub frag_n_used: u32,
    pub next_segment_id: u64,
    pub free_list: ListBaseNode,
    pub free_frag_list: ListBaseNode,
    pub full_frag_list: ListBaseNode,
    pub inode_list: ListBaseNode,
}

impl FspHeaderBody {
    pub fn decode(body: &[u8]) -> Result<FspHeaderBody> {
        if body.len() < FSP_HEADER_SIZE {
            return Err(Error::InvalidBody(format!(
                "FSP_HDR body too short: {} < {}",
                body.len(),
                FSP_HEADER_SIZE
            )));
        }
        Ok(FspHeaderBody {
            space_id: LittleEndian::read_u32(&body[FSP_SPACE_ID..]),
            size: LittleEndian::read_u32(&body[FSP_SIZE..]),
            free_limit: LittleEndian::read_u32(&body[FSP_FREE_LIMIT..]),
            flags: LittleEndian::read_u32(&body[FSP_SPACE_FLAGS..]),
            frag_n_used: LittleEndian::read_u32(&body[FSP_FRAG_N_USED..]),
            next_segment_id: LittleEndian::read_u64(&body[FSP_NEXT_SEGMENT_ID..]),
            free_list: ListBaseNode::decode(
                &body[FSP_FREE_LIST..FSP_FREE_LIST + ListBaseNode::SIZE],
            ),
            free_frag_list: ListBaseNode::decode(
                &body[FSP_FREE_FRAG_LIST..FSP_FREE_FRAG_LIST + ListBaseNode::SIZE],
            ),
            full_frag_list: ListBaseNode::decode(
                &body[FSP_FULL_FRAG_LIST..FSP_FULL_FRAG_LIST + ListBaseNode::SIZE],
            ),
            inode_list: ListBaseNode::decode(
                &body[FSP_INODE_LIST..FSP_INODE_LIST + ListBaseNode::SIZE],
            ),
        })
    }

    pub fn encode(&self, out: &mut [u8]) -> Result<()> {
        LittleEndian::write_u32(&mut out[FSP_SPACE_ID..], self.space_id);
        LittleEndian::write_u32(&mut out[FSP_SIZE..], self.size);
        LittleEndian::write_u32(&mut out[FSP_FREE_LIMIT..], self.free_limit);
        LittleEndian::write_u32(&mut out[FSP_SPACE_FLAGS..], self.flags);
        LittleEndian::write_u32(&mut out[FSP_FRAG_N_USED..], self.frag_n_used);
        LittleEndian::write_u64(&mut out[FSP_NEXT_SEGMENT_ID..], self.next_segment_id);
        self.free_list
            .encode(&mut out[FSP_FREE_LIST..FSP_FREE_LIST + ListBaseNode::SIZE]);
        self.free_frag_list
            .encode(&mut out[FSP_FREE_FRAG_LIST..FSP_FREE_FRAG_LIST + ListBaseNode::SIZE]);
        self.full_frag_list
            .encode(&mut out[FSP_FULL_FRAG_LIST..FSP_FULL_FRAG_LIST + ListBaseNode::SIZE]);
        self.inode_list
            .encode(&mut out[FSP_INODE_LIST..FSP_INODE_LIST + ListBaseNode::SIZE]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innodb::constants::BODY_SIZE;

    #[test]
    fn fsp_header_round_trips() {
        let hdr = FspHeaderBody {
            space_id: 3,
            size: 128,
            free_limit: 64,
            flags: 0,
            frag_n_used: 2,
            next_segment_id: 9,
            free_list: ListBaseNode {
                length: 1,
                first_page: 64,
                first_offset: 38,
                last_page: 64,
                last_offset: 38,
            },
            free_frag_list: ListBaseNode::default(),
            full_frag_list: ListBaseNode::default(),
            inode_list: ListBaseNode {
                length: 1,
                first_page: 3,
                first_offset: 38,
                last_page: 3,
                last_offset: 38,
            },
        };
        let mut buf = vec![0u8; BODY_SIZE];
        hdr.encode(&mut buf).unwrap();
        let decoded = FspHeaderBody::decode(&buf).unwrap();
        assert_eq!(hdr, decoded);
    }

    #[test]
    fn size_ge_free_limit_invariant_holds_after_round_trip() {
        let hdr = FspHeaderBody {
            space_id: 1,
            size: 640,
            free_limit: 128,
            ..Default::default()
        };
        let mut buf = vec![0u8; BODY_SIZE];
        hdr.encode(&mut buf).unwrap();
        let decoded = FspHeaderBody::decode(&buf).unwrap();
        assert!(decoded.size >= decoded.free_limit);
    }
}
