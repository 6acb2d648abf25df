//! Variable-length integer coding used by durations and vectors.
//!
//! The number of leading one bits of the first byte tells how many extra
//! bytes follow. The value fills the remaining low bits of the first byte and
//! then the extra bytes, most significant byte first. Signed values are
//! zigzag-mapped before encoding.

use bytes::BufMut;

use crate::error::{CqlError, Result};

/// Upper bound on the encoded size of a 64-bit value.
pub const MAX_VINT_SIZE: usize = 9;

/// Number of bytes needed to encode `value`, between 1 and 9.
#[inline]
pub fn compute_unsigned_vint_size(value: u64) -> usize {
    let magnitude = (value | 1).leading_zeros() as usize;
    (639 - magnitude * 9) >> 6
}

#[inline]
pub fn compute_vint_size(value: i64) -> usize {
    compute_unsigned_vint_size(encode_zigzag(value))
}

#[inline]
pub fn encode_zigzag(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

#[inline]
pub fn decode_zigzag(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

/// Writes `value` and returns the number of bytes written.
pub fn write_unsigned_vint<B: BufMut>(value: u64, out: &mut B) -> usize {
    let size = compute_unsigned_vint_size(value);
    if size == 1 {
        out.put_u8(value as u8);
        return 1;
    }

    let mut scratch = [0u8; MAX_VINT_SIZE];
    let extra_bytes = size - 1;
    let mut remaining = value;
    for slot in scratch[..size].iter_mut().rev() {
        *slot = remaining as u8;
        remaining = remaining.checked_shr(8).unwrap_or(0);
    }
    scratch[0] |= extra_bytes_marker(extra_bytes);
    out.put_slice(&scratch[..size]);
    size
}

/// Writes `value` zigzag-mapped and returns the number of bytes written.
pub fn write_vint<B: BufMut>(value: i64, out: &mut B) -> usize {
    write_unsigned_vint(encode_zigzag(value), out)
}

/// Reads an unsigned vint starting at `*offset`, advancing it past the value.
pub fn read_unsigned_vint(buf: &[u8], offset: &mut usize) -> Result<u64> {
    let first = *buf
        .get(*offset)
        .ok_or_else(|| CqlError::insufficient(*offset + 1, buf.len()))?;
    if first & 0x80 == 0 {
        *offset += 1;
        return Ok(u64::from(first));
    }

    let extra_bytes = (!first).leading_zeros() as usize;
    let end = *offset + 1 + extra_bytes;
    if end > buf.len() {
        return Err(CqlError::MalformedData(format!(
            "truncated vint: need {} bytes, have {}",
            1 + extra_bytes,
            buf.len() - *offset
        )));
    }

    let mut value = u64::from(first & first_byte_value_mask(extra_bytes));
    for &b in &buf[*offset + 1..end] {
        value = (value << 8) | u64::from(b);
    }
    *offset = end;
    Ok(value)
}

/// Reads a zigzag-encoded vint starting at `*offset`.
pub fn read_vint(buf: &[u8], offset: &mut usize) -> Result<i64> {
    read_unsigned_vint(buf, offset).map(decode_zigzag)
}

#[inline]
fn extra_bytes_marker(extra_bytes: usize) -> u8 {
    !(0xFFu8.checked_shr(extra_bytes as u32).unwrap_or(0))
}

#[inline]
fn first_byte_value_mask(extra_bytes: usize) -> u8 {
    0xFFu8.checked_shr(extra_bytes as u32).unwrap_or(0)
}
