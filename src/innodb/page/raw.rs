//! Opaque-body pages: SYS, TRX_SYS, ALLOCATED, ENCRYPTED_RTREE, and any
//! unrecognized page type. This core has no collaborator that interprets
//! these bodies, so it preserves whatever bytes occupy them verbatim
//! (per SPEC_FULL §4.1's supplement for page types the distilled layout
//! table doesn't cover).

use crate::error::Result;
use crate::innodb::constants::BODY_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBody {
    bytes: Vec<u8>,
}

impl RawBody {
    /// Build a raw body from exactly `BODY_SIZE` bytes. Shorter input is
    /// zero-padded, longer input is truncated, so callers in tests can pass
    /// convenient fill patterns.
    pub fn new(mut bytes: Vec<u8>) -> RawBody {
        bytes.resize(BODY_SIZE, 0);
        RawBody { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn decode(body: &[u8]) -> RawBody {
        RawBody {
            bytes: body.to_vec(),
        }
    }

    pub fn encode(&self, out: &mut [u8]) -> Result<()> {
        out.copy_from_slice(&self.bytes);
        Ok(())
    }
}
