//! `tuple<...>`.

use std::sync::Weak;

use crate::error::{CqlError, Result};
use crate::protocol::ProtocolVersion;
use crate::serialization::codec::{value_mismatch, DispatcherRef, TypeCodec};
use crate::serialization::generic::GenericSerializer;
use crate::serialization::wire::{WireReader, WireWriter};
use crate::types::{ColumnInfo, ColumnTypeCode, NativeType, TupleColumnInfo, Value};

use super::{decode_element, encode_field, missing_info};

/// Codec for tuples: one `[int]`-prefixed field per element, `-1` for null.
///
/// The element count comes from the type description, not the wire. A body
/// that ends before every element was read leaves the remaining elements
/// null, which is how tuples read rows written before the type grew.
#[derive(Debug, Default)]
pub struct TupleCodec {
    dispatcher: DispatcherRef,
}

impl TupleCodec {
    pub fn new() -> Self {
        Self::default()
    }

    fn tuple_info(info: Option<&ColumnInfo>) -> Option<&TupleColumnInfo> {
        match info {
            Some(ColumnInfo::Tuple(info)) => Some(info),
            _ => None,
        }
    }
}

impl TypeCodec for TupleCodec {
    fn cql_type(&self) -> ColumnTypeCode {
        ColumnTypeCode::Tuple
    }

    fn native_type(&self) -> NativeType {
        NativeType::Tuple(Vec::new())
    }

    fn serialize(
        &self,
        version: ProtocolVersion,
        value: &Value,
        info: Option<&ColumnInfo>,
    ) -> Result<Vec<u8>> {
        let items = match value {
            Value::Tuple(items) => items,
            other => return Err(value_mismatch(self.cql_type(), other)),
        };
        let tuple_info = Self::tuple_info(info);
        if let Some(tuple_info) = tuple_info {
            if items.len() > tuple_info.elements.len() {
                return Err(CqlError::InvalidType(format!(
                    "tuple has {} values but the type declares {} elements",
                    items.len(),
                    tuple_info.elements.len()
                )));
            }
        }
        let dispatcher = self.dispatcher.get()?;

        let mut output = WireWriter::new();
        for (index, item) in items.iter().enumerate() {
            let element_type = tuple_info.and_then(|t| t.elements.get(index));
            let bytes = encode_field(&dispatcher, version, item, element_type, "tuple")?;
            output.write_field(bytes.as_deref())?;
        }
        Ok(output.into_bytes())
    }

    fn deserialize(
        &self,
        version: ProtocolVersion,
        data: &[u8],
        info: Option<&ColumnInfo>,
    ) -> Result<Value> {
        let tuple_info = Self::tuple_info(info).ok_or_else(|| missing_info("tuple"))?;
        let dispatcher = self.dispatcher.get()?;

        let mut input = WireReader::new(data);
        let mut items = Vec::with_capacity(tuple_info.elements.len());
        for element_type in &tuple_info.elements {
            if input.is_exhausted() {
                break;
            }
            let item = match input.read_field()? {
                Some(bytes) => decode_element(&dispatcher, version, bytes, element_type)?,
                None => Value::Null,
            };
            items.push(item);
        }
        items.resize(tuple_info.elements.len(), Value::Null);
        Ok(Value::Tuple(items))
    }

    fn attach(&self, dispatcher: &Weak<GenericSerializer>) {
        self.dispatcher.set(dispatcher);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnTypeCode as Code, TypeDescriptor};

    fn int_text_bool() -> TypeDescriptor {
        TypeDescriptor::tuple(vec![
            TypeDescriptor::new(Code::Int),
            TypeDescriptor::new(Code::Varchar),
            TypeDescriptor::new(Code::Boolean),
        ])
    }

    #[test]
    fn test_null_element_is_minus_one() {
        let serializer = GenericSerializer::with_defaults();
        let value = Value::Tuple(vec![Value::Int(7), Value::Null, Value::Boolean(true)]);
        let bytes = serializer.serialize(ProtocolVersion::V4, &value).unwrap().unwrap();
        assert_eq!(
            bytes,
            vec![0, 0, 0, 4, 0, 0, 0, 7, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 1, 1]
        );
        let decoded = serializer
            .deserialize_value(ProtocolVersion::V4, &bytes, &int_text_bool())
            .unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_field_width_ignores_protocol_version() {
        let serializer = GenericSerializer::with_defaults();
        let value = Value::Tuple(vec![Value::Int(7)]);
        let v2 = serializer.serialize(ProtocolVersion::V2, &value).unwrap();
        let v4 = serializer.serialize(ProtocolVersion::V4, &value).unwrap();
        assert_eq!(v2, v4);
    }

    #[test]
    fn test_short_body_leaves_trailing_nulls() {
        let serializer = GenericSerializer::with_defaults();
        let data = [0, 0, 0, 4, 0, 0, 0, 7];
        let decoded = serializer
            .deserialize_value(ProtocolVersion::V4, &data, &int_text_bool())
            .unwrap();
        assert_eq!(
            decoded,
            Value::Tuple(vec![Value::Int(7), Value::Null, Value::Null])
        );
    }

    #[test]
    fn test_too_many_values_for_type() {
        let serializer = GenericSerializer::with_defaults();
        let desc = TypeDescriptor::tuple(vec![TypeDescriptor::new(Code::Int)]);
        let value = Value::Tuple(vec![Value::Int(1), Value::Int(2)]);
        assert!(serializer
            .serialize_with_type(ProtocolVersion::V4, &value, &desc)
            .is_err());
    }

    #[test]
    fn test_field_length_past_end_rejected() {
        let serializer = GenericSerializer::with_defaults();
        let data = [0, 0, 0, 9, 0, 0, 0, 7];
        assert!(serializer
            .deserialize_value(ProtocolVersion::V4, &data, &int_text_bool())
            .is_err());
    }
}
