//! The CQL type model: wire type codes, type descriptors and values.

mod column;
mod convert;
mod parser;
mod value;

pub use column::{
    ColumnInfo, ColumnTypeCode, CustomColumnInfo, ListColumnInfo, MapColumnInfo, SetColumnInfo,
    TupleColumnInfo, TypeDescriptor, UdtColumnInfo, UdtField, VectorColumnInfo,
};
pub use convert::{FromCqlValue, ToCqlValue};
pub use parser::{parse_cql_type_name, parse_fq_type_name, UdtResolver};
pub use value::{CqlDuration, CqlVector, CustomValue, NativeType, UdtValue, Value, Varint};

pub(crate) use column::{validate_descriptor, validate_pair};
