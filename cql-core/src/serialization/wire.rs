//! Bounds-checked big-endian readers and writers for CQL value bodies.

use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

use crate::error::{CqlError, Result};
use crate::protocol::ProtocolVersion;

use super::vint;

/// Reads primitive values from a value body.
///
/// All multi-byte values are read in big-endian byte order.
#[derive(Debug)]
pub struct WireReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> WireReader<'a> {
    /// Creates a reader over the given byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Returns the number of bytes remaining to be read.
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    pub fn is_exhausted(&self) -> bool {
        !self.cursor.has_remaining()
    }

    /// Returns the current position in the buffer.
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    fn ensure_remaining(&self, n: usize) -> Result<()> {
        if self.cursor.remaining() < n {
            Err(CqlError::insufficient(n, self.cursor.remaining()))
        } else {
            Ok(())
        }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure_remaining(1)?;
        Ok(self.cursor.get_u8())
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.ensure_remaining(2)?;
        Ok(self.cursor.get_i16())
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure_remaining(4)?;
        Ok(self.cursor.get_i32())
    }

    /// Borrows the next `len` bytes without copying.
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure_remaining(len)?;
        let start = self.position();
        let data: &'a [u8] = *self.cursor.get_ref();
        self.cursor.advance(len);
        Ok(&data[start..start + len])
    }

    /// Reads a collection count or item length: `i16` before V3, `i32` after.
    pub fn read_collection_length(&mut self, version: ProtocolVersion) -> Result<i32> {
        if version.uses_int32_collection_length() {
            self.read_i32()
        } else {
            self.read_i16().map(i32::from)
        }
    }

    /// Reads a collection count, rejecting negative values.
    pub fn read_collection_count(&mut self, version: ProtocolVersion) -> Result<usize> {
        let count = self.read_collection_length(version)?;
        usize::try_from(count).map_err(|_| {
            CqlError::MalformedData(format!("invalid collection count: {}", count))
        })
    }

    /// Reads one length-prefixed collection item. Collection items may not be null.
    pub fn read_collection_item(&mut self, version: ProtocolVersion) -> Result<&'a [u8]> {
        let len = self.read_collection_length(version)?;
        if len < 0 {
            return Err(CqlError::MalformedData(format!(
                "invalid collection item length: {}",
                len
            )));
        }
        self.read_slice(len as usize)
    }

    /// Reads an `[int]`-prefixed field of a tuple or UDT; `-1` is null.
    pub fn read_field(&mut self) -> Result<Option<&'a [u8]>> {
        let len = self.read_i32()?;
        match len {
            l if l < -1 => Err(CqlError::MalformedData(format!(
                "invalid field length: {}",
                l
            ))),
            -1 => Ok(None),
            l => self.read_slice(l as usize).map(Some),
        }
    }

    /// Reads an unsigned variable-length integer.
    pub fn read_unsigned_vint(&mut self) -> Result<u64> {
        let data: &'a [u8] = *self.cursor.get_ref();
        let mut offset = self.position();
        let value = vint::read_unsigned_vint(data, &mut offset)?;
        self.cursor.set_position(offset as u64);
        Ok(value)
    }

    /// Reads a zigzag-encoded signed variable-length integer.
    pub fn read_vint(&mut self) -> Result<i64> {
        self.read_unsigned_vint().map(vint::decode_zigzag)
    }
}

/// Writes primitive values of a value body.
///
/// All multi-byte values are written in big-endian byte order.
#[derive(Debug)]
pub struct WireWriter {
    buffer: BytesMut,
}

impl WireWriter {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(64),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the writer and returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buffer.put_u8(v);
    }

    pub fn write_i16(&mut self, v: i16) {
        self.buffer.put_i16(v);
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buffer.put_i32(v);
    }

    pub fn write_bytes(&mut self, v: &[u8]) {
        self.buffer.put_slice(v);
    }

    /// Writes a collection count or item length in the version's width.
    pub fn write_collection_length(&mut self, version: ProtocolVersion, len: usize) -> Result<()> {
        if version.uses_int32_collection_length() {
            let len = i32::try_from(len).map_err(|_| {
                CqlError::InvalidType(format!("collection length {} exceeds i32", len))
            })?;
            self.write_i32(len);
        } else {
            let len = i16::try_from(len).map_err(|_| {
                CqlError::InvalidType(format!(
                    "collection length {} exceeds the 2-byte limit of protocol {}",
                    len, version
                ))
            })?;
            self.write_i16(len);
        }
        Ok(())
    }

    /// Writes one length-prefixed collection item.
    pub fn write_collection_item(&mut self, version: ProtocolVersion, item: &[u8]) -> Result<()> {
        self.write_collection_length(version, item.len())?;
        self.write_bytes(item);
        Ok(())
    }

    /// Writes an `[int]`-prefixed tuple or UDT field; `None` is written as `-1`.
    pub fn write_field(&mut self, field: Option<&[u8]>) -> Result<()> {
        match field {
            Some(bytes) => {
                let len = i32::try_from(bytes.len()).map_err(|_| {
                    CqlError::InvalidType(format!("field length {} exceeds i32", bytes.len()))
                })?;
                self.write_i32(len);
                self.write_bytes(bytes);
            }
            None => self.write_i32(-1),
        }
        Ok(())
    }

    pub fn write_unsigned_vint(&mut self, v: u64) {
        vint::write_unsigned_vint(v, &mut self.buffer);
    }

    pub fn write_vint(&mut self, v: i64) {
        vint::write_vint(v, &mut self.buffer);
    }
}

impl Default for WireWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_i32_big_endian() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut input = WireReader::new(&data);
        assert_eq!(input.read_i32().unwrap(), 0x01020304);
        assert!(input.is_exhausted());
    }

    #[test]
    fn test_insufficient_data() {
        let data = [0x01, 0x02, 0x03];
        let mut input = WireReader::new(&data);
        let err = input.read_i32().unwrap_err();
        assert!(err.to_string().contains("need 4 bytes, have 3"));
    }

    #[test]
    fn test_read_slice_borrows() {
        let data = [1, 2, 3, 4, 5];
        let mut input = WireReader::new(&data);
        assert_eq!(input.read_slice(3).unwrap(), &[1, 2, 3]);
        assert_eq!(input.remaining(), 2);
        assert_eq!(input.position(), 3);
    }

    #[test]
    fn test_collection_length_width_by_version() {
        let mut v2 = WireWriter::new();
        v2.write_collection_length(ProtocolVersion::V2, 3).unwrap();
        assert_eq!(v2.as_bytes(), &[0x00, 0x03]);

        let mut v4 = WireWriter::new();
        v4.write_collection_length(ProtocolVersion::V4, 3).unwrap();
        assert_eq!(v4.as_bytes(), &[0x00, 0x00, 0x00, 0x03]);
    }

    #[test]
    fn test_collection_length_overflow_on_v2() {
        let mut output = WireWriter::new();
        assert!(output
            .write_collection_length(ProtocolVersion::V2, 40_000)
            .is_err());
    }

    #[test]
    fn test_null_field_round_trip() {
        let mut output = WireWriter::new();
        output.write_field(None).unwrap();
        output.write_field(Some(b"ab")).unwrap();
        assert_eq!(output.as_bytes(), &[0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 2, b'a', b'b']);

        let bytes = output.into_bytes();
        let mut input = WireReader::new(&bytes);
        assert_eq!(input.read_field().unwrap(), None);
        assert_eq!(input.read_field().unwrap(), Some(&b"ab"[..]));
    }

    #[test]
    fn test_field_length_below_minus_one_rejected() {
        let data = [0xFF, 0xFF, 0xFF, 0xFE];
        let mut input = WireReader::new(&data);
        assert!(input.read_field().is_err());
    }

    #[test]
    fn test_negative_collection_count_rejected() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF];
        let mut input = WireReader::new(&data);
        assert!(input.read_collection_count(ProtocolVersion::V4).is_err());
    }

    #[test]
    fn test_vint_through_reader_and_writer() {
        let mut output = WireWriter::new();
        output.write_vint(-1);
        output.write_unsigned_vint(300);
        let bytes = output.into_bytes();
        let mut input = WireReader::new(&bytes);
        assert_eq!(input.read_vint().unwrap(), -1);
        assert_eq!(input.read_unsigned_vint().unwrap(), 300);
        assert!(input.is_exhausted());
    }
}
