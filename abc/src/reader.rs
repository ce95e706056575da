//! Primitive decoding over a byte slice.
//!
//! Every read is all-or-nothing: on failure the cursor stays where it was,
//! so a caller can report the offset of the field that failed.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::DecodeError;

/// Maximum number of bytes in a `u30`/`u32`/`s32` varint.
pub const MAX_VARINT_LEN: usize = 5;

/// A bounds-checked cursor over ABC bytes.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Creates a reader positioned at `offset`.
    pub fn at(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .offset
            .checked_add(len)
            .ok_or(DecodeError::UnexpectedEndOfInput { offset: self.offset })?;
        let slice = self
            .bytes
            .get(self.offset..end)
            .ok_or(DecodeError::UnexpectedEndOfInput { offset: self.offset })?;
        self.offset = end;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    /// Reads a little-endian, sign-extended 24-bit integer (branch offsets).
    pub fn read_s24(&mut self) -> Result<i32, DecodeError> {
        Ok(LittleEndian::read_i24(self.take(3)?))
    }

    pub fn read_d64(&mut self) -> Result<f64, DecodeError> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    /// Reads a variable-length unsigned integer.
    ///
    /// Seven bits per byte, least-significant group first. The fifth byte
    /// only contributes its low bits; anything above bit 31 is dropped.
    pub fn read_u30(&mut self) -> Result<u32, DecodeError> {
        let start = self.offset;
        let mut result: u64 = 0;
        for i in 0..MAX_VARINT_LEN {
            let byte = *self
                .bytes
                .get(start + i)
                .ok_or(DecodeError::UnexpectedEndOfInput { offset: start })?;
            result |= u64::from(byte & 0x7F) << (7 * i);
            if byte & 0x80 == 0 {
                self.offset = start + i + 1;
                return Ok(result as u32);
            }
        }
        Err(DecodeError::MalformedVarint { offset: start })
    }

    /// Same encoding as [`read_u30`](Self::read_u30), reinterpreted as two's complement.
    pub fn read_s32(&mut self) -> Result<i32, DecodeError> {
        self.read_u30().map(|v| v as i32)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        self.take(len)
    }

    /// Reads a varint length followed by that many raw bytes.
    pub fn read_len_prefixed(&mut self) -> Result<&'a [u8], DecodeError> {
        let start = self.offset;
        let len = self.read_u30()? as usize;
        self.take(len).map_err(|e| {
            self.offset = start;
            e
        })
    }

    /// Reads a length-prefixed string. Invalid UTF-8 is replaced, not rejected.
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        self.read_len_prefixed()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_byte_varint() {
        let mut r = Reader::new(&[0x05]);
        assert_eq!(r.read_u30().unwrap(), 5);
        assert_eq!(r.offset(), 1);
        assert!(r.is_empty());
    }

    #[test]
    fn multi_byte_varint() {
        // 300 = 0b1_0010_1100
        let mut r = Reader::new(&[0xAC, 0x02]);
        assert_eq!(r.read_u30().unwrap(), 300);
        assert_eq!(r.offset(), 2);
    }

    #[test]
    fn fifth_byte_is_truncated_to_32_bits() {
        let mut r = Reader::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0x7F]);
        assert_eq!(r.read_u30().unwrap(), u32::MAX);
    }

    #[test]
    fn six_byte_varint_is_malformed() {
        let mut r = Reader::new(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01]);
        assert_eq!(
            r.read_u30(),
            Err(DecodeError::MalformedVarint { offset: 0 })
        );
        assert_eq!(r.offset(), 0);
    }

    #[test]
    fn truncated_varint_leaves_cursor_untouched() {
        let mut r = Reader::new(&[0x01, 0x80, 0x80]);
        assert_eq!(r.read_u8().unwrap(), 1);
        assert_eq!(
            r.read_u30(),
            Err(DecodeError::UnexpectedEndOfInput { offset: 1 })
        );
        assert_eq!(r.offset(), 1);
    }

    #[test]
    fn s32_reinterprets_high_bit() {
        let mut r = Reader::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        assert_eq!(r.read_s32().unwrap(), -1);
    }

    #[test]
    fn fixed_width_reads_are_little_endian() {
        let mut bytes = vec![0x34, 0x12, 0xFE, 0xFF, 0xFF];
        bytes.extend_from_slice(&1.5f64.to_le_bytes());
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_u16().unwrap(), 0x1234);
        assert_eq!(r.read_s24().unwrap(), -2);
        assert_eq!(r.read_d64().unwrap(), 1.5);
    }

    #[test]
    fn short_string_body_rewinds_length() {
        let mut r = Reader::new(&[0x05, b'a', b'b']);
        assert_eq!(
            r.read_string(),
            Err(DecodeError::UnexpectedEndOfInput { offset: 1 })
        );
        assert_eq!(r.offset(), 0);
    }

    #[test]
    fn reads_string() {
        let mut r = Reader::new(&[0x02, b'h', b'i', 0x00]);
        assert_eq!(r.read_string().unwrap(), "hi");
        assert_eq!(r.read_string().unwrap(), "");
    }
}
