//! `list<T>` and `set<T>`, which share one wire format.

use std::sync::Weak;

use crate::error::{CqlError, Result};
use crate::protocol::ProtocolVersion;
use crate::serialization::codec::{value_mismatch, DispatcherRef, TypeCodec};
use crate::serialization::generic::GenericSerializer;
use crate::serialization::wire::{WireReader, WireWriter};
use crate::types::{ColumnInfo, ColumnTypeCode, NativeType, TypeDescriptor, Value};

use super::{decode_element, encode_element, missing_info};

/// Which container a [`CollectionCodec`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    List,
    Set,
}

/// Codec for `[count][count x (length, bytes)]` collections.
///
/// Count and item lengths are two bytes before protocol V3 and four bytes
/// from V3 on. Items may not be null.
#[derive(Debug)]
pub struct CollectionCodec {
    kind: CollectionKind,
    dispatcher: DispatcherRef,
}

impl CollectionCodec {
    pub fn list() -> Self {
        Self {
            kind: CollectionKind::List,
            dispatcher: DispatcherRef::new(),
        }
    }

    pub fn set() -> Self {
        Self {
            kind: CollectionKind::Set,
            dispatcher: DispatcherRef::new(),
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    fn element_type(info: Option<&ColumnInfo>) -> Option<&TypeDescriptor> {
        match info {
            Some(ColumnInfo::List(info)) => Some(&info.value_type),
            Some(ColumnInfo::Set(info)) => Some(&info.key_type),
            _ => None,
        }
    }
}

impl TypeCodec for CollectionCodec {
    fn cql_type(&self) -> ColumnTypeCode {
        match self.kind {
            CollectionKind::List => ColumnTypeCode::List,
            CollectionKind::Set => ColumnTypeCode::Set,
        }
    }

    /// Element handles are resolved per value; the container reports `Bytes`.
    fn native_type(&self) -> NativeType {
        match self.kind {
            CollectionKind::List => NativeType::List(Box::new(NativeType::Bytes)),
            CollectionKind::Set => NativeType::Set(Box::new(NativeType::Bytes)),
        }
    }

    fn serialize(
        &self,
        version: ProtocolVersion,
        value: &Value,
        info: Option<&ColumnInfo>,
    ) -> Result<Vec<u8>> {
        let items = match value {
            Value::List(items) | Value::Set(items) => items.as_slice(),
            Value::Vector(vector) => vector.elements(),
            other => return Err(value_mismatch(self.cql_type(), other)),
        };
        let dispatcher = self.dispatcher.get()?;
        let element_type = Self::element_type(info);
        let container = self.cql_type().cql_name();

        let mut output = WireWriter::new();
        output.write_collection_length(version, items.len())?;
        for item in items {
            let bytes = encode_element(&dispatcher, version, item, element_type, container)?;
            output.write_collection_item(version, &bytes)?;
        }
        Ok(output.into_bytes())
    }

    fn deserialize(
        &self,
        version: ProtocolVersion,
        data: &[u8],
        info: Option<&ColumnInfo>,
    ) -> Result<Value> {
        let element_type =
            Self::element_type(info).ok_or_else(|| missing_info(self.cql_type().cql_name()))?;
        let dispatcher = self.dispatcher.get()?;

        let mut input = WireReader::new(data);
        let count = input.read_collection_count(version)?;
        let mut items = Vec::with_capacity(count.min(input.remaining()));
        for index in 0..count {
            let item = input.read_collection_item(version).map_err(|e| match e {
                CqlError::MalformedData(msg) => {
                    CqlError::MalformedData(format!("{} item {}: {}", self.cql_type(), index, msg))
                }
                other => other,
            })?;
            items.push(decode_element(&dispatcher, version, item, element_type)?);
        }

        Ok(match self.kind {
            CollectionKind::List => Value::List(items),
            CollectionKind::Set => Value::Set(items),
        })
    }

    fn attach(&self, dispatcher: &Weak<GenericSerializer>) {
        self.dispatcher.set(dispatcher);
    }
}
