//! Byte-level helpers for the history cache blob.
//!
//! Integers are LEB128 varints, id sets are sorted and delta-encoded, and
//! strings are length-prefixed UTF-8. Decoding goes through [`BlobCursor`],
//! which reports the failing byte offset instead of panicking on bad input.

use crate::error::CacheError;
use roaring::RoaringBitmap;
use std::io::{self, Write};

/// Encode a u32 as a variable-length integer
pub fn encode_varint(mut value: u32, buf: &mut Vec<u8>) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Encode a u64 as a variable-length integer
pub fn encode_varint_u64(mut value: u64, buf: &mut Vec<u8>) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Decode a variable-length integer from a slice
/// Returns (value, bytes_consumed)
pub fn decode_varint(buf: &[u8]) -> Option<(u32, usize)> {
    decode_varint_u64(buf)
        .filter(|&(value, _)| value <= u32::MAX as u64)
        .map(|(value, consumed)| (value as u32, consumed))
}

/// Decode a u64 variable-length integer
pub fn decode_varint_u64(buf: &[u8]) -> Option<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0;

    for (i, &byte) in buf.iter().enumerate() {
        if shift >= 64 {
            return None;
        }
        result |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Some((result, i + 1));
        }
        shift += 7;
    }

    None
}

/// Delta-encode a sorted sequence of ids, prefixed by its length
pub fn encode_id_set(ids: &RoaringBitmap, buf: &mut Vec<u8>) {
    encode_varint(ids.len() as u32, buf);
    let mut prev = 0u32;
    for id in ids.iter() {
        encode_varint(id - prev, buf);
        prev = id;
    }
}

/// Length-prefixed UTF-8 string
pub fn encode_str(value: &str, buf: &mut Vec<u8>) {
    encode_varint(value.len() as u32, buf);
    buf.extend_from_slice(value.as_bytes());
}

/// Write a u32 in little-endian format
pub fn write_u32_le<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Write a u64 in little-endian format
pub fn write_u64_le<W: Write>(writer: &mut W, value: u64) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Forward-only reader over an encoded blob
pub struct BlobCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BlobCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8], CacheError> {
        if self.remaining() < len {
            return Err(CacheError::Truncated(self.pos));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn u32_le(&mut self) -> Result<u32, CacheError> {
        let bytes = self.bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn u64_le(&mut self) -> Result<u64, CacheError> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.bytes(8)?);
        Ok(u64::from_le_bytes(raw))
    }

    pub fn varint(&mut self) -> Result<u32, CacheError> {
        let (value, consumed) =
            decode_varint(&self.buf[self.pos..]).ok_or(CacheError::Truncated(self.pos))?;
        self.pos += consumed;
        Ok(value)
    }

    pub fn varint_u64(&mut self) -> Result<u64, CacheError> {
        let (value, consumed) =
            decode_varint_u64(&self.buf[self.pos..]).ok_or(CacheError::Truncated(self.pos))?;
        self.pos += consumed;
        Ok(value)
    }

    /// A count that must be satisfiable by the bytes left (each item is at
    /// least one byte), so corrupt lengths fail fast instead of allocating.
    pub fn count(&mut self) -> Result<usize, CacheError> {
        let at = self.pos;
        let count = self.varint()? as usize;
        if count > self.remaining() {
            return Err(CacheError::Truncated(at));
        }
        Ok(count)
    }

    pub fn string(&mut self) -> Result<String, CacheError> {
        let len = self.varint()? as usize;
        let at = self.pos;
        let bytes = self.bytes(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| CacheError::InvalidString(at))
    }

    pub fn id_set(&mut self) -> Result<RoaringBitmap, CacheError> {
        let count = self.count()?;
        let mut ids = RoaringBitmap::new();
        let mut prev: Option<u32> = None;
        for _ in 0..count {
            let at = self.pos;
            let delta = self.varint()?;
            let id = match prev {
                None => delta,
                Some(_) if delta == 0 => return Err(CacheError::UnsortedIds(at)),
                Some(p) => p.checked_add(delta).ok_or(CacheError::UnsortedIds(at))?,
            };
            ids.insert(id);
            prev = Some(id);
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_boundaries() {
        for value in [0, 1, 127, 128, 16383, 16384, u32::MAX] {
            let mut buf = Vec::new();
            encode_varint(value, &mut buf);
            assert_eq!(decode_varint(&buf), Some((value, buf.len())));
        }
        let mut buf = Vec::new();
        encode_varint_u64(u64::MAX, &mut buf);
        assert_eq!(decode_varint_u64(&buf), Some((u64::MAX, 10)));
        // Too wide for a u32
        assert_eq!(decode_varint(&buf), None);
    }

    #[test]
    fn test_incomplete_varint() {
        assert_eq!(decode_varint(&[0x80, 0x80]), None);
        let mut cursor = BlobCursor::new(&[0xFF]);
        assert_eq!(cursor.varint(), Err(CacheError::Truncated(0)));
    }

    #[test]
    fn test_id_set_is_delta_encoded() {
        let ids: RoaringBitmap = [1u32, 5, 10, 1000].into_iter().collect();
        let mut buf = Vec::new();
        encode_id_set(&ids, &mut buf);
        // count, then deltas 1, 4, 5, 990 (two bytes)
        assert_eq!(buf.len(), 6);

        let mut cursor = BlobCursor::new(&buf);
        assert_eq!(cursor.id_set().unwrap(), ids);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_id_set_rejects_repeated_ids() {
        // count 2, ids 3 then 3 again
        let mut cursor = BlobCursor::new(&[2, 3, 0]);
        assert_eq!(cursor.id_set(), Err(CacheError::UnsortedIds(2)));
    }

    #[test]
    fn test_count_larger_than_buffer() {
        let mut buf = Vec::new();
        encode_varint(1_000_000, &mut buf);
        let mut cursor = BlobCursor::new(&buf);
        assert_eq!(cursor.count(), Err(CacheError::Truncated(0)));
    }

    #[test]
    fn test_strings_and_fixed_width() {
        let mut buf = Vec::new();
        write_u32_le(&mut buf, 0xDEAD_BEEF).unwrap();
        write_u64_le(&mut buf, 42).unwrap();
        encode_str("héllo", &mut buf);
        buf.extend_from_slice(&[1, 0xFF]);

        let mut cursor = BlobCursor::new(&buf);
        assert_eq!(cursor.u32_le().unwrap(), 0xDEAD_BEEF);
        assert_eq!(cursor.u64_le().unwrap(), 42);
        assert_eq!(cursor.string().unwrap(), "héllo");
        let at = cursor.position();
        assert_eq!(cursor.string(), Err(CacheError::InvalidString(at + 1)));
    }
}
