//! Native in-memory values and the type handles used to infer wire types.

use std::any::Any;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// An arbitrary-precision integer in minimal big-endian two's complement form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Varint {
    bytes: Vec<u8>,
}

impl Varint {
    /// Builds a varint from big-endian two's complement bytes.
    ///
    /// Redundant sign-extension bytes are dropped; an empty slice is zero.
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self { bytes: vec![0] };
        }
        let mut start = 0;
        while start + 1 < bytes.len() {
            let (head, next) = (bytes[start], bytes[start + 1]);
            let redundant = (head == 0x00 && next & 0x80 == 0) || (head == 0xFF && next & 0x80 != 0);
            if !redundant {
                break;
            }
            start += 1;
        }
        Self {
            bytes: bytes[start..].to_vec(),
        }
    }

    /// Returns the minimal big-endian two's complement encoding.
    pub fn as_be_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_negative(&self) -> bool {
        self.bytes[0] & 0x80 != 0
    }

    /// Converts to `i128` when the value fits.
    pub fn to_i128(&self) -> Option<i128> {
        if self.bytes.len() > 16 {
            return None;
        }
        let fill = if self.is_negative() { 0xFF } else { 0x00 };
        let mut buf = [fill; 16];
        buf[16 - self.bytes.len()..].copy_from_slice(&self.bytes);
        Some(i128::from_be_bytes(buf))
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.to_i128().and_then(|v| i64::try_from(v).ok())
    }
}

impl From<i128> for Varint {
    fn from(v: i128) -> Self {
        Varint::from_be_bytes(&v.to_be_bytes())
    }
}

impl From<i64> for Varint {
    fn from(v: i64) -> Self {
        Varint::from_be_bytes(&v.to_be_bytes())
    }
}

impl From<i32> for Varint {
    fn from(v: i32) -> Self {
        Varint::from_be_bytes(&v.to_be_bytes())
    }
}

impl fmt::Display for Varint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_i128() {
            Some(v) => write!(f, "{}", v),
            None => write!(f, "0x{}", hex::encode(&self.bytes)),
        }
    }
}

/// A CQL `duration`: months, days and nanoseconds, each signed and independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CqlDuration {
    pub months: i32,
    pub days: i32,
    pub nanoseconds: i64,
}

impl CqlDuration {
    pub fn new(months: i32, days: i32, nanoseconds: i64) -> Self {
        Self {
            months,
            days,
            nanoseconds,
        }
    }
}

/// A fixed-dimension homogeneous sequence, the native form of `vector<T, n>`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CqlVector {
    elements: Vec<Value>,
}

impl CqlVector {
    pub fn new(elements: Vec<Value>) -> Self {
        Self { elements }
    }

    /// Number of elements; compared against the declared dimension.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn into_inner(self) -> Vec<Value> {
        self.elements
    }
}

impl From<Vec<f32>> for CqlVector {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values.into_iter().map(Value::Float).collect())
    }
}

impl From<Vec<Value>> for CqlVector {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

/// A user-defined type instance keyed by native property names.
///
/// `type_name` is the native (struct) name registered through a UDT map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UdtValue {
    pub type_name: String,
    pub fields: Vec<(String, Value)>,
}

impl UdtValue {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Removes and returns a property, used when converting into a struct.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        let idx = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(idx).1)
    }
}

/// An application type handled by a user-registered codec.
#[derive(Clone)]
pub struct CustomValue {
    type_name: String,
    value: Arc<dyn Any + Send + Sync>,
}

impl CustomValue {
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<String>, value: T) -> Self {
        Self {
            type_name: type_name.into(),
            value: Arc::new(value),
        }
    }

    /// Native type name used to look up the owning codec.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && Arc::ptr_eq(&self.value, &other.value)
    }
}

/// A native value exchanged with the codec layer.
///
/// `Null` means "no value" and serializes to no buffer at all; `Unset` is
/// the protocol's "leave this bind marker untouched" sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Unset,
    Boolean(bool),
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    Varint(Varint),
    Text(String),
    Blob(Vec<u8>),
    Uuid(Uuid),
    TimeUuid(Uuid),
    Inet(IpAddr),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
    Duration(CqlDuration),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Tuple(Vec<Value>),
    Vector(CqlVector),
    Udt(UdtValue),
    Custom(CustomValue),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Unset => "unset",
            Value::Boolean(_) => "boolean",
            Value::TinyInt(_) => "tinyint",
            Value::SmallInt(_) => "smallint",
            Value::Int(_) => "int",
            Value::BigInt(_) => "bigint",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Decimal(_) => "decimal",
            Value::Varint(_) => "varint",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
            Value::Uuid(_) => "uuid",
            Value::TimeUuid(_) => "timeuuid",
            Value::Inet(_) => "inet",
            Value::Timestamp(_) => "timestamp",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Duration(_) => "duration",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Tuple(_) => "tuple",
            Value::Vector(_) => "vector",
            Value::Udt(_) => "udt",
            Value::Custom(_) => "custom",
        }
    }

    /// Infers the native type handle of this value.
    ///
    /// Returns `None` for `Null`/`Unset` and for containers whose element
    /// types cannot be seen (empty or all-null).
    pub fn native_type(&self) -> Option<NativeType> {
        let scalar = match self {
            Value::Null | Value::Unset => return None,
            Value::Boolean(_) => NativeType::Boolean,
            Value::TinyInt(_) => NativeType::Int8,
            Value::SmallInt(_) => NativeType::Int16,
            Value::Int(_) => NativeType::Int32,
            Value::BigInt(_) => NativeType::Int64,
            Value::Float(_) => NativeType::Float32,
            Value::Double(_) => NativeType::Float64,
            Value::Decimal(_) => NativeType::Decimal,
            Value::Varint(_) => NativeType::Varint,
            Value::Text(_) => NativeType::String,
            Value::Blob(_) => NativeType::Bytes,
            Value::Uuid(_) => NativeType::Uuid,
            Value::TimeUuid(_) => NativeType::TimeUuid,
            Value::Inet(_) => NativeType::IpAddr,
            Value::Timestamp(_) => NativeType::Timestamp,
            Value::Date(_) => NativeType::Date,
            Value::Time(_) => NativeType::Time,
            Value::Duration(_) => NativeType::Duration,
            Value::List(items) => NativeType::List(Box::new(first_native(items.iter())?)),
            Value::Set(items) => NativeType::Set(Box::new(first_native(items.iter())?)),
            Value::Map(entries) => NativeType::Map(
                Box::new(first_native(entries.iter().map(|(k, _)| k))?),
                Box::new(first_native(entries.iter().map(|(_, v)| v))?),
            ),
            Value::Tuple(items) => NativeType::Tuple(
                items
                    .iter()
                    .map(Value::native_type)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Value::Vector(vector) => {
                NativeType::Vector(Box::new(first_native(vector.elements().iter())?))
            }
            Value::Udt(udt) => NativeType::Struct(udt.type_name.clone()),
            Value::Custom(custom) => NativeType::Custom(custom.type_name().to_string()),
        };
        Some(scalar)
    }
}

fn first_native<'a>(mut values: impl Iterator<Item = &'a Value>) -> Option<NativeType> {
    values.find_map(Value::native_type)
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => Boolean,
    i8 => TinyInt,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Float,
    f64 => Double,
    Decimal => Decimal,
    Varint => Varint,
    String => Text,
    Vec<u8> => Blob,
    Uuid => Uuid,
    IpAddr => Inet,
    DateTime<Utc> => Timestamp,
    NaiveDate => Date,
    NaiveTime => Time,
    CqlDuration => Duration,
    CqlVector => Vector,
    UdtValue => Udt,
    CustomValue => Custom,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A native type handle: what an application value "is" before a wire type
/// has been chosen for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal,
    Varint,
    String,
    Bytes,
    Uuid,
    TimeUuid,
    IpAddr,
    Timestamp,
    Date,
    Time,
    Duration,
    /// An optional value; resolves to the wire type of the inner type.
    Nullable(Box<NativeType>),
    /// A fixed array; sent as a list.
    Array(Box<NativeType>),
    List(Box<NativeType>),
    Set(Box<NativeType>),
    Map(Box<NativeType>, Box<NativeType>),
    Tuple(Vec<NativeType>),
    Vector(Box<NativeType>),
    /// A struct registered through a UDT map, by native name.
    Struct(String),
    /// An application type owned by a user codec, by native name.
    Custom(String),
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeType::Nullable(inner) => write!(f, "Option<{}>", inner),
            NativeType::Array(inner) => write!(f, "[{}]", inner),
            NativeType::List(inner) => write!(f, "List<{}>", inner),
            NativeType::Set(inner) => write!(f, "Set<{}>", inner),
            NativeType::Map(k, v) => write!(f, "Map<{}, {}>", k, v),
            NativeType::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
            NativeType::Vector(inner) => write!(f, "Vector<{}>", inner),
            NativeType::Struct(name) => write!(f, "Struct({})", name),
            NativeType::Custom(name) => write!(f, "Custom({})", name),
            scalar => write!(f, "{:?}", scalar),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_minimal_encoding() {
        assert_eq!(Varint::from(0i64).as_be_bytes(), &[0x00]);
        assert_eq!(Varint::from(127i64).as_be_bytes(), &[0x7F]);
        assert_eq!(Varint::from(128i64).as_be_bytes(), &[0x00, 0x80]);
        assert_eq!(Varint::from(-1i64).as_be_bytes(), &[0xFF]);
        assert_eq!(Varint::from(-129i64).as_be_bytes(), &[0xFF, 0x7F]);
    }

    #[test]
    fn test_varint_from_padded_bytes() {
        let v = Varint::from_be_bytes(&[0x00, 0x00, 0x01]);
        assert_eq!(v.as_be_bytes(), &[0x01]);
        assert_eq!(Varint::from_be_bytes(&[]).to_i64(), Some(0));
    }

    #[test]
    fn test_varint_i128_round_trip() {
        for v in [0i128, 1, -1, i64::MAX as i128 + 1, i128::MIN, i128::MAX] {
            assert_eq!(Varint::from(v).to_i128(), Some(v));
        }
    }

    #[test]
    fn test_varint_too_large_for_i128() {
        let mut bytes = vec![0x01];
        bytes.extend_from_slice(&[0u8; 16]);
        let v = Varint::from_be_bytes(&bytes);
        assert_eq!(v.to_i128(), None);
        assert!(v.to_string().starts_with("0x"));
    }

    #[test]
    fn test_native_type_of_scalars() {
        assert_eq!(Value::Int(1).native_type(), Some(NativeType::Int32));
        assert_eq!(Value::from("a").native_type(), Some(NativeType::String));
        assert_eq!(Value::Null.native_type(), None);
    }

    #[test]
    fn test_native_type_of_containers() {
        let list = Value::List(vec![Value::Null, Value::Int(1)]);
        assert_eq!(
            list.native_type(),
            Some(NativeType::List(Box::new(NativeType::Int32)))
        );
        assert_eq!(Value::List(vec![]).native_type(), None);

        let map = Value::Map(vec![(Value::from("k"), Value::BigInt(2))]);
        assert_eq!(
            map.native_type(),
            Some(NativeType::Map(
                Box::new(NativeType::String),
                Box::new(NativeType::Int64)
            ))
        );
    }

    #[test]
    fn test_option_into_value() {
        let none: Option<i32> = None;
        assert_eq!(Value::from(none), Value::Null);
        assert_eq!(Value::from(Some(5i32)), Value::Int(5));
    }

    #[test]
    fn test_custom_value_downcast() {
        #[derive(Debug, PartialEq)]
        struct Point(i32, i32);

        let v = CustomValue::new("Point", Point(1, 2));
        assert_eq!(v.type_name(), "Point");
        assert_eq!(v.downcast_ref::<Point>(), Some(&Point(1, 2)));
        assert!(v.downcast_ref::<String>().is_none());
        assert_eq!(v.clone(), v);
    }

    #[test]
    fn test_udt_value_access() {
        let mut udt = UdtValue::new("Address")
            .with_field("street", "Main St")
            .with_field("zip", 12345i32);
        assert_eq!(udt.get("zip"), Some(&Value::Int(12345)));
        assert_eq!(udt.take("street"), Some(Value::from("Main St")));
        assert!(udt.get("street").is_none());
    }

    #[test]
    fn test_native_type_display() {
        let t = NativeType::Map(
            Box::new(NativeType::String),
            Box::new(NativeType::List(Box::new(NativeType::Int32))),
        );
        assert_eq!(t.to_string(), "Map<String, List<Int32>>");
    }
}
