//! `map<K, V>`.

use std::sync::Weak;

use crate::error::Result;
use crate::protocol::ProtocolVersion;
use crate::serialization::codec::{value_mismatch, DispatcherRef, TypeCodec};
use crate::serialization::generic::GenericSerializer;
use crate::serialization::wire::{WireReader, WireWriter};
use crate::types::{ColumnInfo, ColumnTypeCode, MapColumnInfo, NativeType, Value};

use super::{decode_element, encode_element, missing_info};

/// Codec for `[count][count x (key length, key, value length, value)]`.
///
/// Entries keep wire order and duplicate keys are preserved.
#[derive(Debug, Default)]
pub struct MapCodec {
    dispatcher: DispatcherRef,
}

impl MapCodec {
    pub fn new() -> Self {
        Self::default()
    }

    fn map_info(info: Option<&ColumnInfo>) -> Option<&MapColumnInfo> {
        match info {
            Some(ColumnInfo::Map(info)) => Some(info),
            _ => None,
        }
    }
}

impl TypeCodec for MapCodec {
    fn cql_type(&self) -> ColumnTypeCode {
        ColumnTypeCode::Map
    }

    fn native_type(&self) -> NativeType {
        NativeType::Map(Box::new(NativeType::Bytes), Box::new(NativeType::Bytes))
    }

    fn serialize(
        &self,
        version: ProtocolVersion,
        value: &Value,
        info: Option<&ColumnInfo>,
    ) -> Result<Vec<u8>> {
        let entries = match value {
            Value::Map(entries) => entries,
            other => return Err(value_mismatch(self.cql_type(), other)),
        };
        let dispatcher = self.dispatcher.get()?;
        let map_info = Self::map_info(info);
        let key_type = map_info.map(|i| &i.key_type);
        let value_type = map_info.map(|i| &i.value_type);

        let mut output = WireWriter::new();
        output.write_collection_length(version, entries.len())?;
        for (key, value) in entries {
            let key = encode_element(&dispatcher, version, key, key_type, "map")?;
            let value = encode_element(&dispatcher, version, value, value_type, "map")?;
            output.write_collection_item(version, &key)?;
            output.write_collection_item(version, &value)?;
        }
        Ok(output.into_bytes())
    }

    fn deserialize(
        &self,
        version: ProtocolVersion,
        data: &[u8],
        info: Option<&ColumnInfo>,
    ) -> Result<Value> {
        let map_info = Self::map_info(info).ok_or_else(|| missing_info("map"))?;
        let dispatcher = self.dispatcher.get()?;

        let mut input = WireReader::new(data);
        let count = input.read_collection_count(version)?;
        let mut entries = Vec::with_capacity(count.min(input.remaining()));
        for _ in 0..count {
            let key = input.read_collection_item(version)?;
            let value = input.read_collection_item(version)?;
            entries.push((
                decode_element(&dispatcher, version, key, &map_info.key_type)?,
                decode_element(&dispatcher, version, value, &map_info.value_type)?,
            ));
        }
        Ok(Value::Map(entries))
    }

    fn attach(&self, dispatcher: &Weak<GenericSerializer>) {
        self.dispatcher.set(dispatcher);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CqlError;
    use crate::types::{ColumnTypeCode as Code, TypeDescriptor};

    fn text_to_bigint() -> TypeDescriptor {
        TypeDescriptor::map(
            TypeDescriptor::new(Code::Varchar),
            TypeDescriptor::new(Code::Bigint),
        )
    }

    #[test]
    fn test_map_wire_layout_v2() {
        let serializer = GenericSerializer::with_defaults();
        let value = Value::Map(vec![(Value::from("a"), Value::BigInt(1))]);
        let bytes = serializer.serialize(ProtocolVersion::V2, &value).unwrap().unwrap();
        assert_eq!(
            bytes,
            vec![0, 1, 0, 1, b'a', 0, 8, 0, 0, 0, 0, 0, 0, 0, 1]
        );
    }

    #[test]
    fn test_duplicates_and_order_preserved() {
        let serializer = GenericSerializer::with_defaults();
        let value = Value::Map(vec![
            (Value::from("b"), Value::BigInt(2)),
            (Value::from("a"), Value::BigInt(1)),
            (Value::from("b"), Value::BigInt(3)),
        ]);
        let bytes = serializer.serialize(ProtocolVersion::V4, &value).unwrap().unwrap();
        let decoded = serializer
            .deserialize_value(ProtocolVersion::V4, &bytes, &text_to_bigint())
            .unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_null_value_rejected() {
        let serializer = GenericSerializer::with_defaults();
        let value = Value::Map(vec![(Value::from("a"), Value::Null)]);
        assert!(matches!(
            serializer.serialize(ProtocolVersion::V4, &value),
            Err(CqlError::InvalidType(_))
        ));
    }

    #[test]
    fn test_typed_serialize_checks_value_types() {
        let serializer = GenericSerializer::with_defaults();
        let value = Value::Map(vec![(Value::from("a"), Value::Int(1))]);
        assert!(serializer
            .serialize_with_type(ProtocolVersion::V4, &value, &text_to_bigint())
            .is_err());
    }
}
