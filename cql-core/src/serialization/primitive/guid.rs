//! `uuid` and `timeuuid`.
//!
//! The wire carries the RFC 4122 layout: time-low, time-mid and
//! time-hi-and-version big-endian. The GUID layout stores those three fields
//! little-endian, so converting between the two reverses bytes 0..4, 4..6
//! and 6..8 and leaves the last eight in place.

use uuid::Uuid;

use crate::error::Result;
use crate::protocol::ProtocolVersion;
use crate::serialization::codec::{fixed_width, value_mismatch, TypeCodec};
use crate::types::{ColumnInfo, ColumnTypeCode, NativeType, Value};

/// Byte `i` of the GUID layout is byte `GUID_ORDER[i]` of the wire layout.
/// The permutation is its own inverse.
pub(crate) const GUID_ORDER: [usize; 16] = [3, 2, 1, 0, 5, 4, 7, 6, 8, 9, 10, 11, 12, 13, 14, 15];

pub(crate) fn permute(bytes: &[u8; 16]) -> [u8; 16] {
    let mut out = [0u8; 16];
    for (slot, &from) in out.iter_mut().zip(GUID_ORDER.iter()) {
        *slot = bytes[from];
    }
    out
}

/// Codec for `uuid` and `timeuuid`; both accept either UUID value variant.
#[derive(Debug, Clone, Copy)]
pub struct UuidCodec {
    code: ColumnTypeCode,
}

impl UuidCodec {
    pub fn new(code: ColumnTypeCode) -> Self {
        debug_assert!(matches!(code, ColumnTypeCode::Uuid | ColumnTypeCode::Timeuuid));
        Self { code }
    }
}

impl TypeCodec for UuidCodec {
    fn cql_type(&self) -> ColumnTypeCode {
        self.code
    }

    fn native_type(&self) -> NativeType {
        match self.code {
            ColumnTypeCode::Timeuuid => NativeType::TimeUuid,
            _ => NativeType::Uuid,
        }
    }

    fn serialize(&self, _: ProtocolVersion, value: &Value, _: Option<&ColumnInfo>) -> Result<Vec<u8>> {
        match value {
            Value::Uuid(id) | Value::TimeUuid(id) => Ok(permute(&id.to_bytes_le()).to_vec()),
            other => Err(value_mismatch(self.code, other)),
        }
    }

    fn deserialize(&self, _: ProtocolVersion, data: &[u8], _: Option<&ColumnInfo>) -> Result<Value> {
        let wire = fixed_width::<16>(data, self.code)?;
        let id = Uuid::from_bytes_le(permute(&wire));
        Ok(match self.code {
            ColumnTypeCode::Timeuuid => Value::TimeUuid(id),
            _ => Value::Uuid(id),
        })
    }
}
