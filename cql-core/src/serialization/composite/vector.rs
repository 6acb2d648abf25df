//! `vector<T, n>`, carried on the `Custom` type code.

use std::borrow::Cow;
use std::sync::Weak;

use crate::error::{CqlError, Result};
use crate::protocol::ProtocolVersion;
use crate::serialization::codec::{value_mismatch, DispatcherRef, TypeCodec};
use crate::serialization::generic::GenericSerializer;
use crate::serialization::wire::{WireReader, WireWriter};
use crate::types::{
    ColumnInfo, ColumnTypeCode, CqlVector, NativeType, TypeDescriptor, Value, VectorColumnInfo,
};

use super::{decode_element, encode_element, missing_info};

/// Codec for fixed-dimension vectors.
///
/// The dimension is not on the wire and must come from the type
/// description. Elements with a fixed encoded length are packed back to
/// back; other elements are each preceded by an unsigned vint length.
#[derive(Debug, Default)]
pub struct VectorCodec {
    dispatcher: DispatcherRef,
}

impl VectorCodec {
    pub fn new() -> Self {
        Self::default()
    }

    fn vector_info(info: Option<&ColumnInfo>) -> Option<&VectorColumnInfo> {
        match info {
            Some(ColumnInfo::Vector(info)) => Some(info),
            _ => None,
        }
    }
}

/// Checks a vector's length against a declared dimension.
pub(crate) fn check_dimension(vector: &CqlVector, dimension: Option<usize>) -> Result<()> {
    match dimension {
        Some(expected) if vector.len() != expected => Err(CqlError::VectorDimensionMismatch {
            provided: vector.len(),
            expected,
        }),
        _ => Ok(()),
    }
}

impl TypeCodec for VectorCodec {
    fn cql_type(&self) -> ColumnTypeCode {
        ColumnTypeCode::Custom
    }

    fn native_type(&self) -> NativeType {
        NativeType::Vector(Box::new(NativeType::Bytes))
    }

    fn serialize(
        &self,
        version: ProtocolVersion,
        value: &Value,
        info: Option<&ColumnInfo>,
    ) -> Result<Vec<u8>> {
        let vector = match value {
            Value::Vector(vector) => vector,
            other => return Err(value_mismatch(self.cql_type(), other)),
        };
        let dispatcher = self.dispatcher.get()?;

        let element_type: Cow<'_, TypeDescriptor> = match Self::vector_info(info) {
            Some(info) => {
                check_dimension(vector, info.dimension)?;
                Cow::Borrowed(&info.value_type)
            }
            None if vector.is_empty() => return Ok(Vec::new()),
            None => {
                if vector.elements().iter().any(|e| matches!(e, Value::Null)) {
                    return Err(CqlError::InvalidType(
                        "vector elements cannot be null".to_string(),
                    ));
                }
                let native = vector
                    .elements()
                    .iter()
                    .find_map(Value::native_type)
                    .ok_or_else(|| {
                        CqlError::unknown_target_type("element type of an untyped vector")
                    })?;
                Cow::Owned(dispatcher.get_cql_type(&native)?)
            }
        };
        let fixed = dispatcher
            .get_value_length_if_fixed(element_type.type_code, element_type.type_info.as_ref())?;

        let mut output = WireWriter::with_capacity(fixed.unwrap_or(8) * vector.len());
        for element in vector.elements() {
            let bytes = encode_element(&dispatcher, version, element, Some(&*element_type), "vector")?;
            match fixed {
                Some(len) if bytes.len() != len => {
                    return Err(CqlError::InvalidType(format!(
                        "vector element of type {} encoded to {} bytes, expected {}",
                        element_type,
                        bytes.len(),
                        len
                    )));
                }
                Some(_) => {}
                None => output.write_unsigned_vint(bytes.len() as u64),
            }
            output.write_bytes(&bytes);
        }
        Ok(output.into_bytes())
    }

    fn deserialize(
        &self,
        version: ProtocolVersion,
        data: &[u8],
        info: Option<&ColumnInfo>,
    ) -> Result<Value> {
        let vector_info = Self::vector_info(info).ok_or_else(|| missing_info("vector"))?;
        let dimension = vector_info.dimension.ok_or_else(|| {
            CqlError::Configuration(format!(
                "cannot decode {} without a known dimension",
                TypeDescriptor::vector(vector_info.value_type.clone(), None)
            ))
        })?;
        let dispatcher = self.dispatcher.get()?;
        let element_type = &vector_info.value_type;
        let fixed = dispatcher
            .get_value_length_if_fixed(element_type.type_code, element_type.type_info.as_ref())?;

        let mut elements = Vec::with_capacity(dimension.min(data.len()));
        match fixed {
            Some(len) => {
                let expected = len.checked_mul(dimension).ok_or_else(|| {
                    CqlError::MalformedData(format!("vector dimension {} is too large", dimension))
                })?;
                if data.len() != expected {
                    return Err(CqlError::MalformedData(format!(
                        "vector of {} x {} bytes requires {} bytes, got {}",
                        dimension,
                        len,
                        expected,
                        data.len()
                    )));
                }
                for index in 0..dimension {
                    let chunk = &data[index * len..(index + 1) * len];
                    elements.push(decode_element(&dispatcher, version, chunk, element_type)?);
                }
            }
            None => {
                let mut input = WireReader::new(data);
                for _ in 0..dimension {
                    let len = input.read_unsigned_vint()?;
                    let len = usize::try_from(len).map_err(|_| {
                        CqlError::MalformedData(format!("vector element length {} is too large", len))
                    })?;
                    let bytes = input.read_slice(len)?;
                    elements.push(decode_element(&dispatcher, version, bytes, element_type)?);
                }
                if !input.is_exhausted() {
                    return Err(CqlError::MalformedData(format!(
                        "{} trailing bytes after {} vector elements",
                        input.remaining(),
                        dimension
                    )));
                }
            }
        }
        Ok(Value::Vector(CqlVector::new(elements)))
    }

    fn attach(&self, dispatcher: &Weak<GenericSerializer>) {
        self.dispatcher.set(dispatcher);
    }
}
