//! INODE body: a list node linking INode pages together, followed by 85
//! segment descriptors (INodeEntry).

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::innodb::constants::*;
use crate::innodb::page::fsp::{ListBaseNode, ListNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InodeEntry {
    pub segment_id: u64,
    pub not_full_n_used: u32,
    pub free_list: ListBaseNode,
    pub not_full_list: ListBaseNode,
    pub full_list: ListBaseNode,
    pub magic: u32,
    pub frag_array: [u32; FRAG_ARRAY_SIZE],
}

impl InodeEntry {
    pub const SIZE: usize = INODE_ENTRY_SIZE;

    pub fn empty() -> InodeEntry {
        InodeEntry {
            segment_id: 0,
            not_full_n_used: 0,
            free_list: ListBaseNode::default(),
            not_full_list: ListBaseNode::default(),
            full_list: ListBaseNode::default(),
            magic: 0,
            frag_array: [0u32; FRAG_ARRAY_SIZE],
        }
    }

    /// A freshly created, live segment descriptor: stamped with the magic
    /// number, empty lists, zeroed fragment array (§4.5 `create_segment`).
    pub fn new_live(segment_id: u64) -> InodeEntry {
        InodeEntry {
            segment_id,
            magic: INODE_MAGIC,
            ..InodeEntry::empty()
        }
    }

    pub fn is_live(&self) -> bool {
        self.magic == INODE_MAGIC
    }

    /// True if this descriptor's own bookkeeping — its three lists and
    /// fragment array — holds no pages. This does NOT see pages the
    /// segment owns through a whole extent, since extent ownership lives
    /// in the XDES entries, not here; callers that can reach the space
    /// manager's XDES pages (see `SpaceManager::drop_segment`) must check
    /// those too before treating a segment as empty.
    pub fn is_empty_segment(&self) -> bool {
        self.free_list.is_empty()
            && self.not_full_list.is_empty()
            && self.full_list.is_empty()
            && self.frag_array.iter().all(|&e| e == 0)
    }

    fn decode(buf: &[u8]) -> InodeEntry {
        let segment_id = LittleEndian::read_u64(&buf[0..8]);
        let not_full_n_used = LittleEndian::read_u32(&buf[8..12]);
        let free_list = ListBaseNode::decode(&buf[12..28]);
        let not_full_list = ListBaseNode::decode(&buf[28..44]);
        let full_list = ListBaseNode::decode(&buf[44..60]);
        let magic = LittleEndian::read_u32(&buf[60..64]);
        let mut frag_array = [0u32; FRAG_ARRAY_SIZE];
        for (i, slot) in frag_array.iter_mut().enumerate() {
            let start = 64 + i * FRAG_ARRAY_ENTRY_SIZE;
            *slot = LittleEndian::read_u32(&buf[start..start + 4]);
        }
        InodeEntry {
            segment_id,
            not_full_n_used,
            free_list,
            not_full_list,
            full_list,
            magic,
            frag_array,
        }
    }

    fn encode(&self, out: &mut [u8]) {
        LittleEndian::write_u64(&mut out[0..8], self.segment_id);
        LittleEndian::write_u32(&mut out[8..12], self.not_full_n_used);
        self.free_list.encode(&mut out[12..28]);
        self.not_full_list.encode(&mut out[28..44]);
        self.full_list.encode(&mut out[44..60]);
        LittleEndian::write_u32(&mut out[60..64], self.magic);
        for (i, &slot) in self.frag_array.iter().enumerate() {
            let start = 64 + i * FRAG_ARRAY_ENTRY_SIZE;
            LittleEndian::write_u32(&mut out[start..start + 4], slot);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeBody {
    pub list_node: ListNode,
    pub entries: Vec<InodeEntry>,
}

impl InodeBody {
    pub fn new_empty() -> InodeBody {
        InodeBody {
            list_node: ListNode::default(),
            entries: (0..INODE_ENTRIES_PER_PAGE).map(|_| InodeEntry::empty()).collect(),
        }
    }

    pub fn decode(body: &[u8]) -> Result<InodeBody> {
        let needed = ListNode::SIZE + INODE_ENTRIES_PER_PAGE * InodeEntry::SIZE;
        if body.len() < needed {
            return Err(Error::InvalidBody(format!(
                "INODE body too short: {} < {needed}",
                body.len()
            )));
        }
        let list_node = ListNode::decode(&body[0..ListNode::SIZE]);
        let mut entries = Vec::with_capacity(INODE_ENTRIES_PER_PAGE);
        for i in 0..INODE_ENTRIES_PER_PAGE {
            let start = ListNode::SIZE + i * InodeEntry::SIZE;
            entries.push(InodeEntry::decode(&body[start..start + InodeEntry::SIZE]));
        }
        Ok(InodeBody { list_node, entries })
    }

    pub fn encode(&self, out: &mut [u8]) -> Result<()> {
        if self.entries.len() != INODE_ENTRIES_PER_PAGE {
            return Err(Error::InvalidBody(format!(
                "expected {INODE_ENTRIES_PER_PAGE} INode entries, got {}",
                self.entries.len()
            )));
        }
        self.list_node.encode(&mut out[0..ListNode::SIZE]);
        for (i, entry) in self.entries.iter().enumerate() {
            let start = ListNode::SIZE + i * InodeEntry::SIZE;
            entry.encode(&mut out[start..start + InodeEntry::SIZE]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innodb::constants::BODY_SIZE;

    #[test]
    fn inode_body_round_trips() {
        let mut body = InodeBody::new_empty();
        body.entries[0] = InodeEntry::new_live(17);
        body.entries[0].frag_array[0] = 99;
        let mut buf = vec![0u8; BODY_SIZE];
        body.encode(&mut buf).unwrap();
        let decoded = InodeBody::decode(&buf).unwrap();
        assert_eq!(body, decoded);
        assert!(decoded.entries[0].is_live());
        assert!(!decoded.entries[0].is_empty_segment());
        assert!(decoded.entries[1].is_empty_segment());
    }

    #[test]
    fn wrong_entry_count_rejected_on_encode() {
        let mut body = InodeBody::new_empty();
        body.entries.pop();
        let mut buf = vec![0u8; BODY_SIZE];
        assert!(body.encode(&mut buf).is_err());
    }
}
