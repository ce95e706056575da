//! Primitive encoding, the inverse of [`Reader`](crate::Reader).

use byteorder::{ByteOrder, LittleEndian};

/// An append-only byte buffer using the ABC primitive encodings.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.bytes.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, v);
        self.bytes.extend_from_slice(&buf);
    }

    /// Writes the low 24 bits of `v`, little-endian.
    pub fn write_s24(&mut self, v: i32) {
        let mut buf = [0u8; 3];
        LittleEndian::write_i24(&mut buf, v);
        self.bytes.extend_from_slice(&buf);
    }

    pub fn write_d64(&mut self, v: f64) {
        let mut buf = [0u8; 8];
        LittleEndian::write_f64(&mut buf, v);
        self.bytes.extend_from_slice(&buf);
    }

    pub fn write_u30(&mut self, mut v: u32) {
        loop {
            let byte = (v & 0x7F) as u8;
            v >>= 7;
            if v == 0 {
                self.bytes.push(byte);
                return;
            }
            self.bytes.push(byte | 0x80);
        }
    }

    pub fn write_s32(&mut self, v: i32) {
        self.write_u30(v as u32);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Writes a varint length followed by the raw bytes.
    pub fn write_len_prefixed(&mut self, bytes: &[u8]) {
        self.write_u30(bytes.len() as u32);
        self.write_bytes(bytes);
    }

    pub fn write_string(&mut self, s: &str) {
        self.write_len_prefixed(s.as_bytes());
    }
}

/// Encodes a single varint into a fresh buffer.
pub fn encode_u30(v: u32) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_u30(v);
    w.into_vec()
}
