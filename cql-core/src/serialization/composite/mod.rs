//! Codecs for collections, tuples, user-defined types and vectors.
//!
//! None of these codecs knows how to encode its elements. Each one holds a
//! [`DispatcherRef`](super::codec::DispatcherRef) back to the owning
//! [`GenericSerializer`] and hands every element to it, so nesting depth is
//! unbounded.

mod collection;
mod map;
mod tuple;
mod udt;
mod vector;

pub use self::collection::{CollectionCodec, CollectionKind};
pub use self::map::MapCodec;
pub use self::tuple::TupleCodec;
pub use self::udt::UdtCodec;
pub use self::vector::VectorCodec;

pub(crate) use self::vector::check_dimension;

use crate::error::{CqlError, Result};
use crate::protocol::ProtocolVersion;
use crate::types::{TypeDescriptor, Value};

use super::generic::GenericSerializer;

/// Encodes a collection or vector element, which may not be null.
fn encode_element(
    dispatcher: &GenericSerializer,
    version: ProtocolVersion,
    value: &Value,
    element_type: Option<&TypeDescriptor>,
    container: &str,
) -> Result<Vec<u8>> {
    encode_field(dispatcher, version, value, element_type, container)?.ok_or_else(|| {
        CqlError::InvalidType(format!("{} elements cannot be null", container))
    })
}

/// Encodes a tuple or UDT field; null becomes `None`.
fn encode_field(
    dispatcher: &GenericSerializer,
    version: ProtocolVersion,
    value: &Value,
    field_type: Option<&TypeDescriptor>,
    container: &str,
) -> Result<Option<Vec<u8>>> {
    match value {
        Value::Null => Ok(None),
        Value::Unset => Err(CqlError::InvalidType(format!(
            "{} elements cannot be unset",
            container
        ))),
        _ => match field_type {
            Some(desc) => dispatcher.encode_typed(version, value, desc),
            None => dispatcher.encode(version, value),
        },
    }
}

fn decode_element(
    dispatcher: &GenericSerializer,
    version: ProtocolVersion,
    data: &[u8],
    element_type: &TypeDescriptor,
) -> Result<Value> {
    dispatcher.decode(version, data, element_type.type_code, element_type.type_info.as_ref())
}

fn missing_info(container: &str) -> CqlError {
    CqlError::InvalidType(format!("{} requires type information to decode", container))
}
