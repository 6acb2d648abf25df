//! CQL binary protocol type system and value codecs.
//!
//! [`GenericSerializer`] holds the codec registry and routes values to
//! codecs; [`Serializer`] binds it to one [`ProtocolVersion`] for use by
//! request and response framing.
//!
//! ```
//! use cql_core::{Serializer, TypeDescriptor, ColumnTypeCode, Value};
//!
//! let serializer = Serializer::default();
//! let list = Value::List(vec![Value::Int(1), Value::Int(2)]);
//! let bytes = serializer.serialize(&list).unwrap().unwrap();
//!
//! let desc = TypeDescriptor::list(TypeDescriptor::new(ColumnTypeCode::Int));
//! assert_eq!(serializer.deserialize_value(&bytes, &desc).unwrap(), list);
//! ```

pub mod config;
mod config_file;
pub mod error;
pub mod protocol;
pub mod serialization;
pub mod types;

pub use config::{SerializerConfig, SerializerConfigBuilder};
pub use config_file::{FileSerializerConfig, FileUdtField, FileUdtMap, PROTOCOL_VERSION_ENV};
pub use error::{CqlError, Result};
pub use protocol::ProtocolVersion;
pub use serialization::{
    GenericSerializer, LegacyTypeCodec, Serializer, SerializerManager, TypeAdapter, TypeCodec,
    UdtMap, UdtMapped,
};
pub use types::{
    parse_cql_type_name, parse_fq_type_name, ColumnInfo, ColumnTypeCode, CqlDuration, CqlVector,
    CustomColumnInfo, CustomValue, FromCqlValue, ListColumnInfo, MapColumnInfo, NativeType,
    SetColumnInfo, ToCqlValue, TupleColumnInfo, TypeDescriptor, UdtColumnInfo, UdtField,
    UdtResolver, UdtValue, Value, Varint, VectorColumnInfo,
};
