//! COMPRESSED and ENCRYPTED bodies.
//!
//! `CompressedBody` stores the decompressed payload plus the algorithm it
//! was compressed with; `encode` recompresses it, mirroring the way the
//! source tool's `compression` module pairs a detected algorithm with
//! `decompress_zlib`/`decompress_lz4`. `EncryptedBody` does not itself hold
//! a key — it round-trips ciphertext opaquely like any other raw body, and
//! exposes `encrypt`/`decrypt` as explicit operations a caller supplies a
//! key to, since key management is a tablespace-level concern, not a page
//! codec one.

use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, StreamCipher};
use aes::{Aes128, Aes256};
use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::innodb::constants::*;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type Aes128Ctr = ctr::Ctr128BE<Aes128>;
type Aes256Ctr = ctr::Ctr128BE<Aes256>;

// ── COMPRESSED ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionAlgorithm {
    None,
    Zlib,
    Lz4,
    /// Accepted as a tag value but never produced or consumed: decoding a
    /// page tagged Snappy always fails with `UnsupportedAlgorithm`.
    Snappy,
}

impl CompressionAlgorithm {
    fn from_u8(val: u8) -> Result<CompressionAlgorithm> {
        match val {
            0 => Ok(CompressionAlgorithm::None),
            1 => Ok(CompressionAlgorithm::Zlib),
            2 => Ok(CompressionAlgorithm::Lz4),
            3 => Ok(CompressionAlgorithm::Snappy),
            other => Err(Error::UnsupportedAlgorithm(format!(
                "unknown compression algorithm tag {other}"
            ))),
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            CompressionAlgorithm::None => 0,
            CompressionAlgorithm::Zlib => 1,
            CompressionAlgorithm::Lz4 => 2,
            CompressionAlgorithm::Snappy => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedBody {
    pub algorithm: CompressionAlgorithm,
    /// The decompressed payload. `encode` recompresses this with
    /// `algorithm` every time, so this is the authoritative, mutable state.
    pub data: Vec<u8>,
}

impl CompressedBody {
    pub fn decode(body: &[u8]) -> Result<CompressedBody> {
        if body.len() < COMPRESSED_HEADER_SIZE {
            return Err(Error::InvalidBody("COMPRESSED header too short".into()));
        }
        let algorithm = CompressionAlgorithm::from_u8(body[0])?;
        let original_len = LittleEndian::read_u32(&body[4..8]) as usize;
        let compressed_len = LittleEndian::read_u32(&body[8..12]) as usize;
        let payload_start = COMPRESSED_HEADER_SIZE;
        let payload_end = payload_start + compressed_len;
        if payload_end > body.len() {
            return Err(Error::InvalidBody(
                "COMPRESSED payload length exceeds body size".into(),
            ));
        }
        let compressed = &body[payload_start..payload_end];
        let data = match algorithm {
            CompressionAlgorithm::None => compressed.to_vec(),
            CompressionAlgorithm::Zlib => decompress_zlib(compressed)
                .ok_or_else(|| Error::InvalidBody("zlib decompression failed".into()))?,
            CompressionAlgorithm::Lz4 => lz4_flex::decompress(compressed, original_len)
                .map_err(|e| Error::InvalidBody(format!("lz4 decompression failed: {e}")))?,
            CompressionAlgorithm::Snappy => {
                return Err(Error::UnsupportedAlgorithm("Snappy".into()))
            }
        };
        if data.len() != original_len {
            return Err(Error::InvalidBody(format!(
                "decompressed length {} does not match recorded original_len {original_len}",
                data.len()
            )));
        }
        Ok(CompressedBody { algorithm, data })
    }

    pub fn encode(&self, out: &mut [u8]) -> Result<()> {
        let compressed = match self.algorithm {
            CompressionAlgorithm::None => self.data.clone(),
            CompressionAlgorithm::Zlib => compress_zlib(&self.data),
            CompressionAlgorithm::Lz4 => lz4_flex::compress(&self.data),
            CompressionAlgorithm::Snappy => {
                return Err(Error::UnsupportedAlgorithm("Snappy".into()))
            }
        };
        if COMPRESSED_HEADER_SIZE + compressed.len() > out.len() {
            return Err(Error::InvalidBody(
                "compressed payload does not fit in a page body".into(),
            ));
        }
        out[0] = self.algorithm.as_u8();
        LittleEndian::write_u32(&mut out[4..8], self.data.len() as u32);
        LittleEndian::write_u32(&mut out[8..12], compressed.len() as u32);
        let start = COMPRESSED_HEADER_SIZE;
        out[start..start + compressed.len()].copy_from_slice(&compressed);
        for b in &mut out[start + compressed.len()..] {
            *b = 0;
        }
        Ok(())
    }
}

fn compress_zlib(data: &[u8]) -> Vec<u8> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("writing to an in-memory encoder cannot fail");
    encoder.finish().expect("finishing an in-memory encoder cannot fail")
}

fn decompress_zlib(compressed: &[u8]) -> Option<Vec<u8>> {
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    let mut decoder = ZlibDecoder::new(compressed);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).ok()?;
    Some(out)
}

// ── ENCRYPTED ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionAlgorithm {
    Aes128Cbc,
    Aes256Cbc,
    Aes128Ctr,
    Aes256Ctr,
}

impl EncryptionAlgorithm {
    fn from_u8(val: u8) -> Result<EncryptionAlgorithm> {
        match val {
            1 => Ok(EncryptionAlgorithm::Aes128Cbc),
            2 => Ok(EncryptionAlgorithm::Aes256Cbc),
            3 => Ok(EncryptionAlgorithm::Aes128Ctr),
            4 => Ok(EncryptionAlgorithm::Aes256Ctr),
            other => Err(Error::UnsupportedAlgorithm(format!(
                "unknown encryption algorithm tag {other}"
            ))),
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            EncryptionAlgorithm::Aes128Cbc => 1,
            EncryptionAlgorithm::Aes256Cbc => 2,
            EncryptionAlgorithm::Aes128Ctr => 3,
            EncryptionAlgorithm::Aes256Ctr => 4,
        }
    }
}

/// An ENCRYPTED page body. Decoding/encoding round-trips the ciphertext
/// opaquely; `decrypt`/`encrypt` are separate, explicit operations since
/// this core does not own key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBody {
    pub algorithm: EncryptionAlgorithm,
    pub key_version: u32,
    pub iv: [u8; ENCRYPTED_IV_LEN],
    pub original_len: u32,
    pub ciphertext: Vec<u8>,
}

impl EncryptedBody {
    pub fn decode(body: &[u8]) -> Result<EncryptedBody> {
        if body.len() < ENCRYPTED_HEADER_SIZE {
            return Err(Error::InvalidBody("ENCRYPTED header too short".into()));
        }
        let algorithm = EncryptionAlgorithm::from_u8(body[0])?;
        let key_version = LittleEndian::read_u32(&body[4..8]);
        let mut iv = [0u8; ENCRYPTED_IV_LEN];
        iv.copy_from_slice(&body[8..8 + ENCRYPTED_IV_LEN]);
        let original_len = LittleEndian::read_u32(&body[24..28]);
        let ciphertext = body[ENCRYPTED_HEADER_SIZE..].to_vec();
        Ok(EncryptedBody {
            algorithm,
            key_version,
            iv,
            original_len,
            ciphertext,
        })
    }

    pub fn encode(&self, out: &mut [u8]) -> Result<()> {
        let expected = out.len() - ENCRYPTED_HEADER_SIZE;
        if self.ciphertext.len() != expected {
            return Err(Error::InvalidBody(format!(
                "ENCRYPTED ciphertext must be {expected} bytes, got {}",
                self.ciphertext.len()
            )));
        }
        out[0] = self.algorithm.as_u8();
        LittleEndian::write_u32(&mut out[4..8], self.key_version);
        out[8..8 + ENCRYPTED_IV_LEN].copy_from_slice(&self.iv);
        LittleEndian::write_u32(&mut out[24..28], self.original_len);
        out[ENCRYPTED_HEADER_SIZE..].copy_from_slice(&self.ciphertext);
        Ok(())
    }

    /// Decrypt the ciphertext with `key`, returning the plaintext with
    /// PKCS#7 padding stripped for CBC modes.
    pub fn decrypt(&self, key: &[u8]) -> Result<Vec<u8>> {
        match self.algorithm {
            EncryptionAlgorithm::Aes128Cbc => {
                let dec = Aes128CbcDec::new_from_slices(key, &self.iv)
                    .map_err(|e| Error::InvalidBody(format!("bad AES-128 key/iv: {e}")))?;
                let mut buf = self.ciphertext.clone();
                let pt = dec
                    .decrypt_padded_mut::<aes::cipher::block_padding::Pkcs7>(&mut buf)
                    .map_err(|e| Error::InvalidBody(format!("AES-128-CBC decrypt failed: {e}")))?;
                Ok(pt.to_vec())
            }
            EncryptionAlgorithm::Aes256Cbc => {
                let dec = Aes256CbcDec::new_from_slices(key, &self.iv)
                    .map_err(|e| Error::InvalidBody(format!("bad AES-256 key/iv: {e}")))?;
                let mut buf = self.ciphertext.clone();
                let pt = dec
                    .decrypt_padded_mut::<aes::cipher::block_padding::Pkcs7>(&mut buf)
                    .map_err(|e| Error::InvalidBody(format!("AES-256-CBC decrypt failed: {e}")))?;
                Ok(pt.to_vec())
            }
            EncryptionAlgorithm::Aes128Ctr => {
                let mut cipher = Aes128Ctr::new_from_slices(key, &self.iv)
                    .map_err(|e| Error::InvalidBody(format!("bad AES-128 key/iv: {e}")))?;
                let mut buf = self.ciphertext.clone();
                cipher.apply_keystream(&mut buf);
                buf.truncate(self.original_len as usize);
                Ok(buf)
            }
            EncryptionAlgorithm::Aes256Ctr => {
                let mut cipher = Aes256Ctr::new_from_slices(key, &self.iv)
                    .map_err(|e| Error::InvalidBody(format!("bad AES-256 key/iv: {e}")))?;
                let mut buf = self.ciphertext.clone();
                cipher.apply_keystream(&mut buf);
                buf.truncate(self.original_len as usize);
                Ok(buf)
            }
        }
    }

    /// Encrypt `plaintext` with `key`/`iv` under `algorithm`, producing an
    /// `EncryptedBody` ready to be encoded into a page of `capacity` bytes
    /// (the ciphertext, padded for CBC, must fit within `capacity`).
    pub fn encrypt(
        algorithm: EncryptionAlgorithm,
        key_version: u32,
        iv: [u8; ENCRYPTED_IV_LEN],
        key: &[u8],
        plaintext: &[u8],
    ) -> Result<EncryptedBody> {
        let original_len = plaintext.len() as u32;
        let ciphertext = match algorithm {
            EncryptionAlgorithm::Aes128Cbc => {
                let enc = Aes128CbcEnc::new_from_slices(key, &iv)
                    .map_err(|e| Error::InvalidBody(format!("bad AES-128 key/iv: {e}")))?;
                enc.encrypt_padded_vec_mut::<aes::cipher::block_padding::Pkcs7>(plaintext)
            }
            EncryptionAlgorithm::Aes256Cbc => {
                let enc = Aes256CbcEnc::new_from_slices(key, &iv)
                    .map_err(|e| Error::InvalidBody(format!("bad AES-256 key/iv: {e}")))?;
                enc.encrypt_padded_vec_mut::<aes::cipher::block_padding::Pkcs7>(plaintext)
            }
            EncryptionAlgorithm::Aes128Ctr => {
                let mut cipher = Aes128Ctr::new_from_slices(key, &iv)
                    .map_err(|e| Error::InvalidBody(format!("bad AES-128 key/iv: {e}")))?;
                let mut buf = plaintext.to_vec();
                cipher.apply_keystream(&mut buf);
                buf
            }
            EncryptionAlgorithm::Aes256Ctr => {
                let mut cipher = Aes256Ctr::new_from_slices(key, &iv)
                    .map_err(|e| Error::InvalidBody(format!("bad AES-256 key/iv: {e}")))?;
                let mut buf = plaintext.to_vec();
                cipher.apply_keystream(&mut buf);
                buf
            }
        };
        Ok(EncryptedBody {
            algorithm,
            key_version,
            iv,
            original_len,
            ciphertext,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innodb::constants::BODY_SIZE;

    #[test]
    fn compressed_body_round_trips_zlib() {
        let body = CompressedBody {
            algorithm: CompressionAlgorithm::Zlib,
            data: b"repeated repeated repeated repeated data".to_vec(),
        };
        let mut buf = vec![0u8; BODY_SIZE];
        body.encode(&mut buf).unwrap();
        let decoded = CompressedBody::decode(&buf).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn compressed_body_round_trips_lz4() {
        let body = CompressedBody {
            algorithm: CompressionAlgorithm::Lz4,
            data: b"some page payload bytes to round trip via lz4".to_vec(),
        };
        let mut buf = vec![0u8; BODY_SIZE];
        body.encode(&mut buf).unwrap();
        let decoded = CompressedBody::decode(&buf).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn snappy_tag_is_unsupported() {
        let mut buf = vec![0u8; BODY_SIZE];
        buf[0] = 3; // Snappy
        let err = CompressedBody::decode(&buf).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn encrypted_body_round_trips_ciphertext_opaquely() {
        let body = EncryptedBody {
            algorithm: EncryptionAlgorithm::Aes256Cbc,
            key_version: 4,
            iv: [7u8; ENCRYPTED_IV_LEN],
            original_len: 32,
            ciphertext: vec![0x55; BODY_SIZE - ENCRYPTED_HEADER_SIZE],
        };
        let mut buf = vec![0u8; BODY_SIZE];
        body.encode(&mut buf).unwrap();
        let decoded = EncryptedBody::decode(&buf).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn aes_128_cbc_encrypt_then_decrypt_recovers_plaintext() {
        let key = [0x42u8; 16];
        let iv = [0x24u8; ENCRYPTED_IV_LEN];
        let plaintext = b"sixteen byte blk";
        let encrypted =
            EncryptedBody::encrypt(EncryptionAlgorithm::Aes128Cbc, 1, iv, &key, plaintext)
                .unwrap();
        let recovered = encrypted.decrypt(&key).unwrap();
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn aes_256_ctr_encrypt_then_decrypt_recovers_plaintext() {
        let key = [0x11u8; 32];
        let iv = [0x22u8; ENCRYPTED_IV_LEN];
        let plaintext = b"not a block multiple length";
        let encrypted =
            EncryptedBody::encrypt(EncryptionAlgorithm::Aes256Ctr, 2, iv, &key, plaintext)
                .unwrap();
        let recovered = encrypted.decrypt(&key).unwrap();
        assert_eq!(recovered, plaintext);
    }
}
