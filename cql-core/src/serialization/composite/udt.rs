//! User-defined types.

use std::sync::Weak;

use tracing::trace;

use crate::error::{CqlError, Result};
use crate::protocol::ProtocolVersion;
use crate::serialization::codec::{value_mismatch, DispatcherRef, TypeCodec};
use crate::serialization::generic::GenericSerializer;
use crate::serialization::wire::{WireReader, WireWriter};
use crate::types::{ColumnInfo, ColumnTypeCode, NativeType, UdtColumnInfo, UdtValue, Value};

use super::{decode_element, encode_field, missing_info};

/// Codec for UDT values, laid out like a tuple in schema field order.
///
/// Field names are translated through the [`UdtMap`](crate::UdtMap)
/// registered for the type. A UDT without a registered mapping decodes to
/// its raw body as [`Value::Blob`], and such a blob is written back as is.
#[derive(Debug, Default)]
pub struct UdtCodec {
    dispatcher: DispatcherRef,
}

impl UdtCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TypeCodec for UdtCodec {
    fn cql_type(&self) -> ColumnTypeCode {
        ColumnTypeCode::Udt
    }

    fn native_type(&self) -> NativeType {
        NativeType::Struct(String::new())
    }

    fn serialize(
        &self,
        version: ProtocolVersion,
        value: &Value,
        info: Option<&ColumnInfo>,
    ) -> Result<Vec<u8>> {
        let udt = match value {
            Value::Udt(udt) => udt,
            Value::Blob(raw) => return Ok(raw.clone()),
            other => return Err(value_mismatch(self.cql_type(), other)),
        };
        let dispatcher = self.dispatcher.get()?;

        // The schema definition wins over the one captured by the mapping.
        let (definition, map) = match info {
            Some(ColumnInfo::Udt(definition)) => {
                (definition.clone(), dispatcher.udt_map(&definition.qualified_name()))
            }
            _ => {
                let map = dispatcher
                    .udt_map_for_native(&udt.type_name)
                    .ok_or_else(|| {
                        CqlError::unknown_target_type(NativeType::Struct(udt.type_name.clone()))
                    })?;
                (map.definition().clone(), Some(map))
            }
        };

        let mut output = WireWriter::new();
        for field in &definition.fields {
            let property = map
                .as_ref()
                .map_or(field.name.as_str(), |m| m.property_for(&field.name));
            let bytes = match udt.get(property) {
                Some(value) => encode_field(
                    &dispatcher,
                    version,
                    value,
                    Some(&field.field_type),
                    "udt",
                )?,
                None => None,
            };
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
        let definition: &UdtColumnInfo = match info {
            Some(ColumnInfo::Udt(definition)) => definition,
            _ => return Err(missing_info("udt")),
        };
        let dispatcher = self.dispatcher.get()?;
        let qualified_name = definition.qualified_name();
        let Some(map) = dispatcher.udt_map(&qualified_name) else {
            trace!(udt = %qualified_name, "no mapping registered, returning raw bytes");
            return Ok(Value::Blob(data.to_vec()));
        };

        let mut input = WireReader::new(data);
        let mut udt = UdtValue::new(map.native_name());
        for field in &definition.fields {
            let value = if input.is_exhausted() {
                Value::Null
            } else {
                match input.read_field()? {
                    Some(bytes) => decode_element(&dispatcher, version, bytes, &field.field_type)?,
                    None => Value::Null,
                }
            };
            udt.fields
                .push((map.property_for(&field.name).to_string(), value));
        }
        Ok(Value::Udt(udt))
    }

    fn attach(&self, dispatcher: &Weak<GenericSerializer>) {
        self.dispatcher.set(dispatcher);
    }
}
