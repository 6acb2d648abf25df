//! Wire type codes and the auxiliary type information of parameterized types.

use std::fmt;

use crate::error::{CqlError, Result};

/// The protocol-level type tag transmitted in result metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum ColumnTypeCode {
    Custom = 0x0000,
    Ascii = 0x0001,
    Bigint = 0x0002,
    Blob = 0x0003,
    Boolean = 0x0004,
    Counter = 0x0005,
    Decimal = 0x0006,
    Double = 0x0007,
    Float = 0x0008,
    Int = 0x0009,
    Text = 0x000A,
    Timestamp = 0x000B,
    Uuid = 0x000C,
    Varchar = 0x000D,
    Varint = 0x000E,
    Timeuuid = 0x000F,
    Inet = 0x0010,
    Date = 0x0011,
    Time = 0x0012,
    SmallInt = 0x0013,
    TinyInt = 0x0014,
    Duration = 0x0015,
    List = 0x0020,
    Map = 0x0021,
    Set = 0x0022,
    Udt = 0x0030,
    Tuple = 0x0031,
}

impl ColumnTypeCode {
    /// Resolves a code read from result metadata.
    pub fn from_code(code: u16) -> Result<Self> {
        let resolved = match code {
            0x0000 => ColumnTypeCode::Custom,
            0x0001 => ColumnTypeCode::Ascii,
            0x0002 => ColumnTypeCode::Bigint,
            0x0003 => ColumnTypeCode::Blob,
            0x0004 => ColumnTypeCode::Boolean,
            0x0005 => ColumnTypeCode::Counter,
            0x0006 => ColumnTypeCode::Decimal,
            0x0007 => ColumnTypeCode::Double,
            0x0008 => ColumnTypeCode::Float,
            0x0009 => ColumnTypeCode::Int,
            0x000A => ColumnTypeCode::Text,
            0x000B => ColumnTypeCode::Timestamp,
            0x000C => ColumnTypeCode::Uuid,
            0x000D => ColumnTypeCode::Varchar,
            0x000E => ColumnTypeCode::Varint,
            0x000F => ColumnTypeCode::Timeuuid,
            0x0010 => ColumnTypeCode::Inet,
            0x0011 => ColumnTypeCode::Date,
            0x0012 => ColumnTypeCode::Time,
            0x0013 => ColumnTypeCode::SmallInt,
            0x0014 => ColumnTypeCode::TinyInt,
            0x0015 => ColumnTypeCode::Duration,
            0x0020 => ColumnTypeCode::List,
            0x0021 => ColumnTypeCode::Map,
            0x0022 => ColumnTypeCode::Set,
            0x0030 => ColumnTypeCode::Udt,
            0x0031 => ColumnTypeCode::Tuple,
            other => {
                return Err(CqlError::InvalidType(format!(
                    "unknown column type code: 0x{:04x}",
                    other
                )))
            }
        };
        Ok(resolved)
    }

    /// Returns the numeric wire code.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Whether values of this code cannot be described without a [`ColumnInfo`].
    pub fn requires_type_info(self) -> bool {
        matches!(
            self,
            ColumnTypeCode::List
                | ColumnTypeCode::Set
                | ColumnTypeCode::Map
                | ColumnTypeCode::Tuple
                | ColumnTypeCode::Udt
                | ColumnTypeCode::Custom
        )
    }

    /// Whether the code names a collection-shaped type that only the built-in
    /// composite codecs may handle.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            ColumnTypeCode::List | ColumnTypeCode::Set | ColumnTypeCode::Map | ColumnTypeCode::Tuple
        )
    }

    /// The CQL keyword for this code.
    pub fn cql_name(self) -> &'static str {
        match self {
            ColumnTypeCode::Custom => "custom",
            ColumnTypeCode::Ascii => "ascii",
            ColumnTypeCode::Bigint => "bigint",
            ColumnTypeCode::Blob => "blob",
            ColumnTypeCode::Boolean => "boolean",
            ColumnTypeCode::Counter => "counter",
            ColumnTypeCode::Decimal => "decimal",
            ColumnTypeCode::Double => "double",
            ColumnTypeCode::Float => "float",
            ColumnTypeCode::Int => "int",
            ColumnTypeCode::Text => "text",
            ColumnTypeCode::Timestamp => "timestamp",
            ColumnTypeCode::Uuid => "uuid",
            ColumnTypeCode::Varchar => "varchar",
            ColumnTypeCode::Varint => "varint",
            ColumnTypeCode::Timeuuid => "timeuuid",
            ColumnTypeCode::Inet => "inet",
            ColumnTypeCode::Date => "date",
            ColumnTypeCode::Time => "time",
            ColumnTypeCode::SmallInt => "smallint",
            ColumnTypeCode::TinyInt => "tinyint",
            ColumnTypeCode::Duration => "duration",
            ColumnTypeCode::List => "list",
            ColumnTypeCode::Map => "map",
            ColumnTypeCode::Set => "set",
            ColumnTypeCode::Udt => "udt",
            ColumnTypeCode::Tuple => "tuple",
        }
    }
}

impl fmt::Display for ColumnTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cql_name())
    }
}

/// Element type of a `list<T>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListColumnInfo {
    pub value_type: TypeDescriptor,
}

/// Element type of a `set<T>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SetColumnInfo {
    pub key_type: TypeDescriptor,
}

/// Key and value types of a `map<K, V>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapColumnInfo {
    pub key_type: TypeDescriptor,
    pub value_type: TypeDescriptor,
}

/// Ordered element types of a `tuple<...>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TupleColumnInfo {
    pub elements: Vec<TypeDescriptor>,
}

/// A named field of a user-defined type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UdtField {
    pub name: String,
    pub field_type: TypeDescriptor,
}

/// Definition of a user-defined type as declared in the schema.
///
/// Field order is the schema order, which is also the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UdtColumnInfo {
    pub keyspace: String,
    pub name: String,
    pub fields: Vec<UdtField>,
}

impl UdtColumnInfo {
    /// Creates a definition with no fields.
    pub fn new(keyspace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field, keeping declaration order.
    pub fn with_field(mut self, name: impl Into<String>, field_type: TypeDescriptor) -> Self {
        self.fields.push(UdtField {
            name: name.into(),
            field_type,
        });
        self
    }

    /// Returns `keyspace.name`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.keyspace, self.name)
    }

    pub fn field(&self, name: &str) -> Option<&UdtField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Element type and dimension of a `vector<T, n>`.
///
/// The dimension is not present on the wire; it must come from the schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VectorColumnInfo {
    pub value_type: TypeDescriptor,
    pub dimension: Option<usize>,
}

/// An opaque server-side class name for types with no structured form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomColumnInfo {
    pub custom_type_name: String,
}

impl CustomColumnInfo {
    pub fn new(custom_type_name: impl Into<String>) -> Self {
        Self {
            custom_type_name: custom_type_name.into(),
        }
    }
}

/// Auxiliary information accompanying a parameterized type code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnInfo {
    List(Box<ListColumnInfo>),
    Set(Box<SetColumnInfo>),
    Map(Box<MapColumnInfo>),
    Tuple(TupleColumnInfo),
    Udt(UdtColumnInfo),
    Vector(Box<VectorColumnInfo>),
    Custom(CustomColumnInfo),
}

impl ColumnInfo {
    fn kind(&self) -> &'static str {
        match self {
            ColumnInfo::List(_) => "list",
            ColumnInfo::Set(_) => "set",
            ColumnInfo::Map(_) => "map",
            ColumnInfo::Tuple(_) => "tuple",
            ColumnInfo::Udt(_) => "udt",
            ColumnInfo::Vector(_) => "vector",
            ColumnInfo::Custom(_) => "custom",
        }
    }

    /// Whether this info may accompany `code`.
    pub fn matches(&self, code: ColumnTypeCode) -> bool {
        matches!(
            (code, self),
            (ColumnTypeCode::List, ColumnInfo::List(_))
                | (ColumnTypeCode::Set, ColumnInfo::Set(_))
                | (ColumnTypeCode::Map, ColumnInfo::Map(_))
                | (ColumnTypeCode::Tuple, ColumnInfo::Tuple(_))
                | (ColumnTypeCode::Udt, ColumnInfo::Udt(_))
                | (ColumnTypeCode::Custom, ColumnInfo::Vector(_))
                | (ColumnTypeCode::Custom, ColumnInfo::Custom(_))
        )
    }
}

/// A wire type code paired with its optional auxiliary information.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub type_code: ColumnTypeCode,
    pub type_info: Option<ColumnInfo>,
}

impl TypeDescriptor {
    /// A descriptor for a code that needs no auxiliary information.
    pub fn new(type_code: ColumnTypeCode) -> Self {
        Self {
            type_code,
            type_info: None,
        }
    }

    pub fn with_info(type_code: ColumnTypeCode, type_info: ColumnInfo) -> Self {
        Self {
            type_code,
            type_info: Some(type_info),
        }
    }

    pub fn list(value_type: TypeDescriptor) -> Self {
        Self::with_info(
            ColumnTypeCode::List,
            ColumnInfo::List(Box::new(ListColumnInfo { value_type })),
        )
    }

    pub fn set(key_type: TypeDescriptor) -> Self {
        Self::with_info(
            ColumnTypeCode::Set,
            ColumnInfo::Set(Box::new(SetColumnInfo { key_type })),
        )
    }

    pub fn map(key_type: TypeDescriptor, value_type: TypeDescriptor) -> Self {
        Self::with_info(
            ColumnTypeCode::Map,
            ColumnInfo::Map(Box::new(MapColumnInfo {
                key_type,
                value_type,
            })),
        )
    }

    pub fn tuple(elements: Vec<TypeDescriptor>) -> Self {
        Self::with_info(
            ColumnTypeCode::Tuple,
            ColumnInfo::Tuple(TupleColumnInfo { elements }),
        )
    }

    pub fn udt(definition: UdtColumnInfo) -> Self {
        Self::with_info(ColumnTypeCode::Udt, ColumnInfo::Udt(definition))
    }

    /// Vectors travel as the `Custom` code with a [`VectorColumnInfo`].
    pub fn vector(value_type: TypeDescriptor, dimension: Option<usize>) -> Self {
        Self::with_info(
            ColumnTypeCode::Custom,
            ColumnInfo::Vector(Box::new(VectorColumnInfo {
                value_type,
                dimension,
            })),
        )
    }

    pub fn custom(custom_type_name: impl Into<String>) -> Self {
        Self::with_info(
            ColumnTypeCode::Custom,
            ColumnInfo::Custom(CustomColumnInfo::new(custom_type_name)),
        )
    }

    /// Checks that parameterized codes carry matching auxiliary information,
    /// recursively.
    pub fn validate(&self) -> Result<()> {
        validate_descriptor(self.type_code, self.type_info.as_ref())
    }

    pub fn vector_info(&self) -> Option<&VectorColumnInfo> {
        match &self.type_info {
            Some(ColumnInfo::Vector(info)) => Some(info),
            _ => None,
        }
    }
}

/// Validates a code/info pair and every descriptor nested in the info.
pub(crate) fn validate_descriptor(code: ColumnTypeCode, info: Option<&ColumnInfo>) -> Result<()> {
    validate_pair(code, info)?;
    match info {
        Some(ColumnInfo::List(info)) => info.value_type.validate(),
        Some(ColumnInfo::Set(info)) => info.key_type.validate(),
        Some(ColumnInfo::Map(info)) => {
            info.key_type.validate()?;
            info.value_type.validate()
        }
        Some(ColumnInfo::Tuple(info)) => info.elements.iter().try_for_each(|e| e.validate()),
        Some(ColumnInfo::Udt(info)) => info.fields.iter().try_for_each(|f| f.field_type.validate()),
        Some(ColumnInfo::Vector(info)) => info.value_type.validate(),
        Some(ColumnInfo::Custom(_)) | None => Ok(()),
    }
}

/// Validates one level of a code/info pair without descending.
pub(crate) fn validate_pair(code: ColumnTypeCode, info: Option<&ColumnInfo>) -> Result<()> {
    match info {
        None if code.requires_type_info() => Err(CqlError::InvalidType(format!(
            "type {} requires type information",
            code
        ))),
        None => Ok(()),
        Some(info) if info.matches(code) => Ok(()),
        Some(info) => Err(CqlError::InvalidType(format!(
            "type {} cannot be described by {} type information",
            code,
            info.kind()
        ))),
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.type_info {
            Some(ColumnInfo::List(info)) => write!(f, "list<{}>", info.value_type),
            Some(ColumnInfo::Set(info)) => write!(f, "set<{}>", info.key_type),
            Some(ColumnInfo::Map(info)) => write!(f, "map<{}, {}>", info.key_type, info.value_type),
            Some(ColumnInfo::Tuple(info)) => {
                f.write_str("tuple<")?;
                for (i, element) in info.elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                f.write_str(">")
            }
            Some(ColumnInfo::Udt(info)) => f.write_str(&info.qualified_name()),
            Some(ColumnInfo::Vector(info)) => match info.dimension {
                Some(dimension) => write!(f, "vector<{}, {}>", info.value_type, dimension),
                None => write!(f, "vector<{}>", info.value_type),
            },
            Some(ColumnInfo::Custom(info)) => write!(f, "'{}'", info.custom_type_name),
            None => f.write_str(self.type_code.cql_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_round_trip() {
        for code in [0x00u16, 0x01, 0x09, 0x0D, 0x15, 0x20, 0x21, 0x22, 0x30, 0x31] {
            assert_eq!(ColumnTypeCode::from_code(code).unwrap().code(), code);
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert!(ColumnTypeCode::from_code(0x0019).is_err());
        assert!(ColumnTypeCode::from_code(0xFFFF).is_err());
    }

    #[test]
    fn test_validate_rejects_missing_info() {
        let desc = TypeDescriptor::new(ColumnTypeCode::List);
        let err = desc.validate().unwrap_err();
        assert!(err.to_string().contains("requires type information"));
    }

    #[test]
    fn test_validate_rejects_mismatched_info() {
        let desc = TypeDescriptor::with_info(
            ColumnTypeCode::List,
            ColumnInfo::Map(Box::new(MapColumnInfo {
                key_type: TypeDescriptor::new(ColumnTypeCode::Int),
                value_type: TypeDescriptor::new(ColumnTypeCode::Int),
            })),
        );
        assert!(matches!(desc.validate(), Err(CqlError::InvalidType(_))));
    }

    #[test]
    fn test_validate_descends_into_nested_types() {
        let bad = TypeDescriptor::map(
            TypeDescriptor::new(ColumnTypeCode::Text),
            TypeDescriptor::new(ColumnTypeCode::Set),
        );
        assert!(bad.validate().is_err());

        let good = TypeDescriptor::map(
            TypeDescriptor::new(ColumnTypeCode::Text),
            TypeDescriptor::list(TypeDescriptor::new(ColumnTypeCode::Int)),
        );
        assert!(good.validate().is_ok());
    }

    #[test]
    fn test_vector_is_custom_code() {
        let desc = TypeDescriptor::vector(TypeDescriptor::new(ColumnTypeCode::Float), Some(3));
        assert_eq!(desc.type_code, ColumnTypeCode::Custom);
        assert_eq!(desc.vector_info().unwrap().dimension, Some(3));
        assert!(desc.validate().is_ok());
    }

    #[test]
    fn test_display() {
        let desc = TypeDescriptor::map(
            TypeDescriptor::new(ColumnTypeCode::Text),
            TypeDescriptor::list(TypeDescriptor::tuple(vec![
                TypeDescriptor::new(ColumnTypeCode::Int),
                TypeDescriptor::new(ColumnTypeCode::Varchar),
            ])),
        );
        assert_eq!(desc.to_string(), "map<text, list<tuple<int, varchar>>>");
        let vector = TypeDescriptor::vector(TypeDescriptor::new(ColumnTypeCode::Float), Some(4));
        assert_eq!(vector.to_string(), "vector<float, 4>");
    }

    #[test]
    fn test_udt_qualified_name_and_lookup() {
        let udt = UdtColumnInfo::new("ks", "address")
            .with_field("street", TypeDescriptor::new(ColumnTypeCode::Text))
            .with_field("zip", TypeDescriptor::new(ColumnTypeCode::Int));
        assert_eq!(udt.qualified_name(), "ks.address");
        assert_eq!(udt.field("zip").unwrap().field_type.type_code, ColumnTypeCode::Int);
        assert!(udt.field("city").is_none());
    }
}
