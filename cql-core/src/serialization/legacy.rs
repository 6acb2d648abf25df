//! Adapters written against the older value-conversion interface.
//!
//! A [`TypeAdapter`] only converts between bytes and values. The dispatcher
//! wraps each configured adapter in a [`LegacyTypeCodec`] and registers it
//! like any other codec, ahead of user codecs.

use std::sync::Arc;

use crate::error::Result;
use crate::protocol::ProtocolVersion;
use crate::types::{ColumnInfo, ColumnTypeCode, CustomColumnInfo, NativeType, Value};

use super::codec::TypeCodec;

/// Converts between raw bytes and one native type.
pub trait TypeAdapter: Send + Sync {
    fn native_type(&self) -> NativeType;

    fn convert_from(&self, data: &[u8]) -> Result<Value>;

    fn convert_to(&self, value: &Value) -> Result<Vec<u8>>;
}

/// A [`TypeCodec`] backed by a [`TypeAdapter`].
///
/// With `reverse_endianness` set, bytes are reversed between the wire and
/// the adapter, for adapters that exchange little-endian integers.
pub struct LegacyTypeCodec {
    cql_type: ColumnTypeCode,
    adapter: Arc<dyn TypeAdapter>,
    reverse_endianness: bool,
    type_info: Option<ColumnInfo>,
}

impl LegacyTypeCodec {
    pub fn new(cql_type: ColumnTypeCode, adapter: Arc<dyn TypeAdapter>, reverse_endianness: bool) -> Self {
        Self {
            cql_type,
            adapter,
            reverse_endianness,
            type_info: None,
        }
    }

    /// Wraps the adapter that handles otherwise unregistered custom types.
    ///
    /// The codec is identified by the adapter's native type name.
    pub fn custom(adapter: Arc<dyn TypeAdapter>) -> Self {
        let name = match adapter.native_type() {
            NativeType::Custom(name) => name,
            other => other.to_string(),
        };
        Self {
            cql_type: ColumnTypeCode::Custom,
            adapter,
            reverse_endianness: false,
            type_info: Some(ColumnInfo::Custom(CustomColumnInfo::new(name))),
        }
    }

    pub fn reverses_endianness(&self) -> bool {
        self.reverse_endianness
    }
}

impl std::fmt::Debug for LegacyTypeCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyTypeCodec")
            .field("cql_type", &self.cql_type)
            .field("native_type", &self.adapter.native_type())
            .field("reverse_endianness", &self.reverse_endianness)
            .finish()
    }
}

impl TypeCodec for LegacyTypeCodec {
    fn cql_type(&self) -> ColumnTypeCode {
        self.cql_type
    }

    fn native_type(&self) -> NativeType {
        self.adapter.native_type()
    }

    fn type_info(&self) -> Option<&ColumnInfo> {
        self.type_info.as_ref()
    }

    fn serialize(&self, _: ProtocolVersion, value: &Value, _: Option<&ColumnInfo>) -> Result<Vec<u8>> {
        let mut bytes = self.adapter.convert_to(value)?;
        if self.reverse_endianness {
            bytes.reverse();
        }
        Ok(bytes)
    }

    fn deserialize(&self, _: ProtocolVersion, data: &[u8], _: Option<&ColumnInfo>) -> Result<Value> {
        if self.reverse_endianness {
            let mut reversed = data.to_vec();
            reversed.reverse();
            self.adapter.convert_from(&reversed)
        } else {
            self.adapter.convert_from(data)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Varint;

    /// Exchanges varints as little-endian two's complement.
    struct LittleEndianVarint;

    impl TypeAdapter for LittleEndianVarint {
        fn native_type(&self) -> NativeType {
            NativeType::Varint
        }

        fn convert_from(&self, data: &[u8]) -> Result<Value> {
            let mut be = data.to_vec();
            be.reverse();
            Ok(Value::Varint(Varint::from_be_bytes(&be)))
        }

        fn convert_to(&self, value: &Value) -> Result<Vec<u8>> {
            match value {
                Value::Varint(v) => {
                    let mut le = v.as_be_bytes().to_vec();
                    le.reverse();
                    Ok(le)
                }
                other => Err(crate::serialization::codec::value_mismatch(
                    ColumnTypeCode::Varint,
                    other,
                )),
            }
        }
    }

    #[test]
    fn test_reversed_adapter_writes_big_endian() {
        let codec = LegacyTypeCodec::new(ColumnTypeCode::Varint, Arc::new(LittleEndianVarint), true);
        let value = Value::Varint(Varint::from(0x0102i64));
        let bytes = codec.serialize(ProtocolVersion::V4, &value, None).unwrap();
        assert_eq!(bytes, vec![0x01, 0x02]);
        assert_eq!(codec.deserialize(ProtocolVersion::V4, &bytes, None).unwrap(), value);
    }

    #[test]
    fn test_custom_adapter_identity() {
        struct Opaque;
        impl TypeAdapter for Opaque {
            fn native_type(&self) -> NativeType {
                NativeType::Custom("Opaque".to_string())
            }
            fn convert_from(&self, data: &[u8]) -> Result<Value> {
                Ok(Value::Blob(data.to_vec()))
            }
            fn convert_to(&self, _: &Value) -> Result<Vec<u8>> {
                Ok(vec![])
            }
        }

        let codec = LegacyTypeCodec::custom(Arc::new(Opaque));
        assert_eq!(codec.cql_type(), ColumnTypeCode::Custom);
        assert_eq!(
            codec.type_info(),
            Some(&ColumnInfo::Custom(CustomColumnInfo::new("Opaque")))
        );
        assert!(!codec.reverses_endianness());
    }
}
